use crate::config::LoggingSettings;
use crate::error::Result;
use crate::utils::constants::DEFAULT_LOG_LEVEL;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the run's subscriber: console output plus an optional plain-text log file.
///
/// The subscriber stays active until the returned guard is dropped.
pub fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<DefaultGuard> {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&settings.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    };

    let file_layer = match settings.file.as_ref() {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer);

    Ok(tracing::subscriber::set_default(subscriber))
}
