pub mod table_report;
pub mod upload_summary;

pub use table_report::{TableRunReport, UploadCounts, Verification};
pub use upload_summary::{FileInfo, FileSummary, FormatDetails, ObjectRunReport, UploadSummary};
