pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{data_object_key, format_run_timestamp, summary_object_key};
pub use logging::init_logging;
pub use progress::ProgressReporter;
