use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("AWS credentials not found: {0}")]
    CredentialsMissing(String),

    #[error("Failed to provision {resource}: {message}")]
    ResourceProvisioning { resource: String, message: String },

    #[error("Input file not found: {}", .0.display())]
    InputFileMissing(PathBuf),

    #[error("Missing required column '{column}' at line {line}")]
    MissingColumn { column: String, line: u64 },

    #[error("Invalid numeric value '{value}' in column '{column}' at line {line}")]
    FieldCoercion {
        column: String,
        value: String,
        line: u64,
    },

    #[error("Failed to write batch {batch} ({items} items): {message}")]
    BatchWrite {
        batch: usize,
        items: usize,
        message: String,
    },

    #[error("Failed to upload object '{key}': {message}")]
    ObjectUpload { key: String, message: String },

    #[error("Unsupported dataset mode '{0}' (expected quarterly, monthly or both)")]
    UnsupportedMode(String),

    #[error("Unsupported output format '{0}' (expected json, jsonl or csv)")]
    UnsupportedFormat(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error("AWS service error: {0}")]
    Service(String),

    #[error("Upload cancelled by user")]
    Cancelled,
}

impl UploadError {
    pub fn provisioning(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceProvisioning {
            resource: resource.into(),
            message: message.into(),
        }
    }
}
