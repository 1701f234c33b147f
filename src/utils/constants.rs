/// AWS defaults
pub const DEFAULT_REGION: &str = "us-east-1";

/// Table pipeline defaults
pub const DEFAULT_TABLE_NAME: &str = "CityClimateProfiles";
pub const DEFAULT_TABLE_INPUT: &str = "city_climate_profiles.csv";
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_UNPROCESSED_ROUNDS: u32 = 5;
pub const TABLE_POLL_INTERVAL_MS: u64 = 2000;

/// Hard cap on items per BatchWriteItem request
pub const MAX_BATCH_SIZE: usize = 25;

/// Table key attributes
pub const PARTITION_KEY: &str = "city_country";
pub const SORT_KEY: &str = "coordinates";

/// Object pipeline defaults
pub const DEFAULT_BUCKET_NAME: &str = "climate-data-bucket-527";
pub const DEFAULT_KEY_PREFIX: &str = "climate-data/";
pub const DEFAULT_OBJECT_BASENAME: &str = "climate_famous300_cities";
pub const DEFAULT_DATA_TYPE: &str = "monthly";
pub const DEFAULT_QUARTERLY_INPUT: &str = "climate_famous300_cities_complete.csv";
pub const DEFAULT_MONTHLY_INPUT: &str = "climate_famous300_cities_monthly.csv";
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";
pub const DEFAULT_JSON_INDENT: usize = 2;
pub const SUMMARY_OBJECT_PREFIX: &str = "upload_summary";

/// Run timestamp format used in object keys
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Configuration sources
pub const CONFIG_FILE_STEM: &str = "climate-upload";
pub const ENV_PREFIX: &str = "CLIMATE_UPLOAD";

/// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Sample item fields shown in the table report
pub const SAMPLE_FIELDS_SHOWN: usize = 5;
