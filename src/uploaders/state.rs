use crate::error::{Result, UploadError};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Disconnected,
    Connected,
    ResourceReady,
    Writing,
    Done,
    Failed,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Done | UploadState::Failed)
    }

    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Disconnected, Connected) => true,
            (Connected, ResourceReady) => true,
            (ResourceReady, Writing) => true,
            // an empty input finishes without writing
            (ResourceReady, Done) => true,
            (Writing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::Disconnected => "disconnected",
            UploadState::Connected => "connected",
            UploadState::ResourceReady => "resource-ready",
            UploadState::Writing => "writing",
            UploadState::Done => "done",
            UploadState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug)]
pub struct StateTracker {
    state: UploadState,
    pipeline: &'static str,
}

impl StateTracker {
    pub fn new(pipeline: &'static str) -> Self {
        Self {
            state: UploadState::Disconnected,
            pipeline,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn advance(&mut self, next: UploadState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(UploadError::InvalidState {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!("{} pipeline: {} -> {}", self.pipeline, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Move to `failed` unless already terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!("{} pipeline: {} -> failed", self.pipeline, self.state);
            self.state = UploadState::Failed;
        }
    }

    /// Reject work once the run has finished or failed
    pub fn ensure_active(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(UploadError::InvalidState {
                from: self.state.to_string(),
                to: UploadState::Writing.to_string(),
            });
        }
        Ok(())
    }
}
