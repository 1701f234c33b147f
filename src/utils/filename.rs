use crate::utils::constants::{RUN_TIMESTAMP_FORMAT, SUMMARY_OBJECT_PREFIX};
use chrono::{DateTime, Utc};

/// Format a run timestamp for use in object keys: `YYYYMMDD_HHMMSS_ffffff`
pub fn format_run_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// Build a data object key with format: {prefix}{basename}_{data_type}_{timestamp}{extension}
pub fn data_object_key(
    prefix: &str,
    basename: &str,
    data_type: &str,
    timestamp: &DateTime<Utc>,
    extension: &str,
) -> String {
    format!(
        "{}{}_{}_{}{}",
        prefix,
        basename,
        data_type,
        format_run_timestamp(timestamp),
        extension
    )
}

/// Build the summary object key with format: {prefix}upload_summary_{timestamp}.json
pub fn summary_object_key(prefix: &str, timestamp: &DateTime<Utc>) -> String {
    format!(
        "{}{}_{}.json",
        prefix,
        SUMMARY_OBJECT_PREFIX,
        format_run_timestamp(timestamp)
    )
}
