use crate::error::Result;
use crate::models::{ItemKey, TableItem};
use crate::utils::constants::{PARTITION_KEY, SORT_KEY};
use async_trait::async_trait;
use std::fmt;

/// Partition and sort key attribute names; both are string typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition_key: String,
    pub sort_key: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            partition_key: PARTITION_KEY.to_string(),
            sort_key: SORT_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl TableStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TableStatus::Active)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Creating => write!(f, "CREATING"),
            TableStatus::Active => write!(f, "ACTIVE"),
            TableStatus::Updating => write!(f, "UPDATING"),
            TableStatus::Deleting => write!(f, "DELETING"),
            TableStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

/// Operations the table pipeline needs from a managed key-value store.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()>;

    async fn table_status(&self, table: &str) -> Result<TableStatus>;

    /// Put every item; returns the keys the service left unprocessed.
    ///
    /// Items whose key already exists are replaced.
    async fn batch_write(&self, table: &str, items: &[TableItem]) -> Result<Vec<ItemKey>>;

    /// Full item count, summed across scan pages
    async fn count_items(&self, table: &str) -> Result<u64>;

    async fn sample_item(&self, table: &str) -> Result<Option<TableItem>>;
}
