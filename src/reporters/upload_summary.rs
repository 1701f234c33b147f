use crate::error::Result;
use crate::models::{DataTable, DatasetKind};
use crate::writers::OutputFormat;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

const COUNTRY_COLUMNS: [&str; 3] = ["country_full", "country_code", "country"];

/// Per-file entry of the upload summary; statistics are omitted when their
/// source column is absent from the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub data_type: DatasetKind,
    pub file_path: String,
    pub object_key: String,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_cities: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_countries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<String>,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarters_covered: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_covered: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons_covered: Option<Vec<String>>,
}

impl FileSummary {
    pub fn from_table(kind: DatasetKind, path: &Path, object_key: &str, table: &DataTable) -> Self {
        let unique_countries = COUNTRY_COLUMNS
            .iter()
            .find_map(|column| table.unique_count(column));

        let year_range = table
            .numeric_range("YEAR")
            .map(|(min, max)| format!("{}-{}", min as i64, max as i64));

        let (quarters_covered, months_covered, seasons_covered) = match kind {
            DatasetKind::Quarterly => (table.distinct_text("ADJUSTED_QUARTER"), None, None),
            DatasetKind::Monthly => (
                None,
                months(table),
                table.distinct_text("SEASON"),
            ),
        };

        Self {
            data_type: kind,
            file_path: path.display().to_string(),
            object_key: object_key.to_string(),
            records: table.len(),
            unique_cities: table.unique_count("city_name"),
            unique_countries,
            year_range,
            columns: table.columns().to_vec(),
            quarters_covered,
            months_covered,
            seasons_covered,
        }
    }
}

/// Months present in the file, in calendar order
fn months(table: &DataTable) -> Option<Vec<i64>> {
    let values = table.column_values("MONTH")?;
    let months: BTreeSet<i64> = values
        .iter()
        .filter_map(|v| v.as_f64())
        .map(|m| m as i64)
        .collect();
    Some(months.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub output_format: OutputFormat,
    pub json_indent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDetails {
    pub content_type: String,
    pub file_extension: String,
    pub description: String,
}

/// Run-level record of an object upload, persisted next to the data objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub upload_timestamp: String,
    pub bucket_name: String,
    pub output_format: OutputFormat,
    pub files_uploaded: Vec<FileSummary>,
    pub total_records: usize,
    pub file_info: FileInfo,
    pub format_details: FormatDetails,
}

impl UploadSummary {
    pub fn new(
        bucket_name: &str,
        format: OutputFormat,
        json_indent: usize,
        run_timestamp: &DateTime<Utc>,
    ) -> Self {
        let json_indent = match format {
            OutputFormat::Json if json_indent > 0 => Some(json_indent),
            _ => None,
        };

        Self {
            upload_timestamp: run_timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            bucket_name: bucket_name.to_string(),
            output_format: format,
            files_uploaded: Vec::new(),
            total_records: 0,
            file_info: FileInfo {
                output_format: format,
                json_indent,
            },
            format_details: FormatDetails {
                content_type: format.content_type().to_string(),
                file_extension: format.extension().to_string(),
                description: format.description().to_string(),
            },
        }
    }

    pub fn add_file(&mut self, file: FileSummary) {
        self.total_records += file.records;
        self.files_uploaded.push(file);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Console lines listing each uploaded object
    pub fn display(&self) -> String {
        let mut lines = vec![format!(
            "Uploaded {} files ({} records) to bucket {} as {}",
            self.files_uploaded.len(),
            self.total_records,
            self.bucket_name,
            self.output_format
        )];
        for file in &self.files_uploaded {
            lines.push(format!(
                "   {} -> s3://{}/{} ({} records)",
                file.data_type, self.bucket_name, file.object_key, file.records
            ));
        }
        lines.join("\n")
    }
}

/// Outcome of an object upload run
#[derive(Debug, Clone)]
pub struct ObjectRunReport {
    pub summary: UploadSummary,
    pub summary_key: String,
}

impl ObjectRunReport {
    pub fn display(&self) -> String {
        format!(
            "{}\nSummary: s3://{}/{}",
            self.summary.display(),
            self.summary.bucket_name,
            self.summary_key
        )
    }
}
