use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which datasets an object upload run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    Quarterly,
    Monthly,
    Both,
}

/// A single dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Quarterly,
    Monthly,
}

impl DatasetMode {
    pub fn datasets(&self) -> &'static [DatasetKind] {
        match self {
            DatasetMode::Quarterly => &[DatasetKind::Quarterly],
            DatasetMode::Monthly => &[DatasetKind::Monthly],
            DatasetMode::Both => &[DatasetKind::Quarterly, DatasetKind::Monthly],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetMode::Quarterly => "quarterly",
            DatasetMode::Monthly => "monthly",
            DatasetMode::Both => "both",
        }
    }
}

impl FromStr for DatasetMode {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quarterly" => Ok(DatasetMode::Quarterly),
            "monthly" => Ok(DatasetMode::Monthly),
            "both" => Ok(DatasetMode::Both),
            _ => Err(UploadError::UnsupportedMode(s.to_string())),
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Quarterly => "quarterly",
            DatasetKind::Monthly => "monthly",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
