//! Run configuration.
//!
//! Settings are layered: built-in defaults, then an optional configuration file,
//! then `CLIMATE_UPLOAD__*` environment variables, then command-line overrides.

use crate::error::Result;
use crate::models::{DatasetKind, DatasetMode};
use crate::utils::constants::*;
use crate::writers::OutputFormat;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub aws: AwsSettings,

    #[validate(nested)]
    pub table: TableSettings,

    #[validate(nested)]
    pub objects: ObjectSettings,

    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AwsSettings {
    #[validate(length(min = 1))]
    pub region: String,

    /// Named profile; the default provider chain is used when unset
    pub profile: Option<String>,

    /// Alternative endpoint, e.g. a local DynamoDB or S3-compatible service
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TableSettings {
    #[validate(length(min = 3, max = 255))]
    pub table_name: String,

    pub input_file: PathBuf,

    #[validate(range(min = 1, max = 25))]
    pub batch_size: usize,

    #[validate(range(min = 1))]
    pub wait_timeout_secs: u64,

    #[validate(range(min = 1))]
    pub max_unprocessed_rounds: u32,

    /// Fail on malformed numeric fields instead of coercing them to zero
    pub strict_numeric: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObjectSettings {
    #[validate(length(min = 3, max = 63))]
    pub bucket_name: String,

    pub key_prefix: String,

    #[validate(length(min = 1))]
    pub object_basename: String,

    pub data_type: DatasetMode,

    pub quarterly_input: PathBuf,

    pub monthly_input: PathBuf,

    pub output_format: OutputFormat,

    /// Indentation for JSON array output; 0 writes compact JSON
    pub json_indent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// Without an explicit path, `climate-upload.{toml,yaml,json}` in the working
    /// directory is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("aws.region", DEFAULT_REGION)?
            .set_default("table.table_name", DEFAULT_TABLE_NAME)?
            .set_default("table.input_file", DEFAULT_TABLE_INPUT)?
            .set_default("table.batch_size", DEFAULT_BATCH_SIZE as i64)?
            .set_default("table.wait_timeout_secs", DEFAULT_WAIT_TIMEOUT_SECS as i64)?
            .set_default(
                "table.max_unprocessed_rounds",
                DEFAULT_UNPROCESSED_ROUNDS as i64,
            )?
            .set_default("table.strict_numeric", false)?
            .set_default("objects.bucket_name", DEFAULT_BUCKET_NAME)?
            .set_default("objects.key_prefix", DEFAULT_KEY_PREFIX)?
            .set_default("objects.object_basename", DEFAULT_OBJECT_BASENAME)?
            .set_default("objects.data_type", DEFAULT_DATA_TYPE)?
            .set_default("objects.quarterly_input", DEFAULT_QUARTERLY_INPUT)?
            .set_default("objects.monthly_input", DEFAULT_MONTHLY_INPUT)?
            .set_default("objects.output_format", DEFAULT_OUTPUT_FORMAT)?
            .set_default("objects.json_indent", DEFAULT_JSON_INDENT as i64)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(CONFIG_FILE_STEM).required(false)),
        };

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}

impl ObjectSettings {
    pub fn input_for(&self, kind: DatasetKind) -> &Path {
        match kind {
            DatasetKind::Quarterly => &self.quarterly_input,
            DatasetKind::Monthly => &self.monthly_input,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws: AwsSettings {
                region: DEFAULT_REGION.to_string(),
                profile: None,
                endpoint_url: None,
            },
            table: TableSettings {
                table_name: DEFAULT_TABLE_NAME.to_string(),
                input_file: PathBuf::from(DEFAULT_TABLE_INPUT),
                batch_size: DEFAULT_BATCH_SIZE,
                wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
                max_unprocessed_rounds: DEFAULT_UNPROCESSED_ROUNDS,
                strict_numeric: false,
            },
            objects: ObjectSettings {
                bucket_name: DEFAULT_BUCKET_NAME.to_string(),
                key_prefix: DEFAULT_KEY_PREFIX.to_string(),
                object_basename: DEFAULT_OBJECT_BASENAME.to_string(),
                data_type: DatasetMode::Monthly,
                quarterly_input: PathBuf::from(DEFAULT_QUARTERLY_INPUT),
                monthly_input: PathBuf::from(DEFAULT_MONTHLY_INPUT),
                output_format: OutputFormat::Json,
                json_indent: DEFAULT_JSON_INDENT,
            },
            logging: LoggingSettings {
                level: DEFAULT_LOG_LEVEL.to_string(),
                file: None,
            },
        }
    }
}
