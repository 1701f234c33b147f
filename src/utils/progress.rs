use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal progress for batch writes and object uploads.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    silent: bool,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
            silent: false,
        }
    }

    /// Spinner for streams whose length is unknown up front
    pub fn new_spinner(message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({pos} items)")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
            silent: false,
        }
    }

    fn silent() -> Self {
        Self {
            progress_bar: None,
            silent: true,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn abandon(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }
}
