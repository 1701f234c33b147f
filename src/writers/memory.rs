//! In-process stores used by `--dry-run` and by the test suite.

use super::blob_store::{BlobStore, BucketCreation, PutObjectRequest};
use super::table_store::{KeySchema, TableStatus, TableStore};
use crate::error::{Result, UploadError};
use crate::models::{ItemKey, TableItem};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct MemoryTable {
    schema: KeySchema,
    pending_polls: u32,
    items: BTreeMap<ItemKey, TableItem>,
}

#[derive(Debug, Default)]
struct TableState {
    tables: HashMap<String, MemoryTable>,
    batch_calls: usize,
    fail_on_batch: Option<usize>,
    unprocessed_budget: usize,
}

/// Table store holding items in memory, keyed like the real service.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<TableState>,
    creation_polls: u32,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newly created tables report CREATING for this many status polls
    pub fn with_creation_polls(mut self, polls: u32) -> Self {
        self.creation_polls = polls;
        self
    }

    /// Fail the n-th batch write call (1-based)
    pub fn failing_on_batch(self, call: usize) -> Self {
        self.lock().fail_on_batch = Some(call);
        self
    }

    /// Leave this many items unprocessed across the next batch writes
    pub fn with_unprocessed(self, items: usize) -> Self {
        self.lock().unprocessed_budget = items;
        self
    }

    pub fn with_table(self, name: &str) -> Self {
        self.lock().tables.insert(
            name.to_string(),
            MemoryTable {
                schema: KeySchema::default(),
                pending_polls: 0,
                items: BTreeMap::new(),
            },
        );
        self
    }

    pub fn items(&self, table: &str) -> Vec<TableItem> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.items.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn item(&self, table: &str, key: &ItemKey) -> Option<TableItem> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.items.get(key).cloned())
    }

    pub fn schema(&self, table: &str) -> Option<KeySchema> {
        self.lock().tables.get(table).map(|t| t.schema.clone())
    }

    pub fn batch_calls(&self) -> usize {
        self.lock().batch_calls
    }

    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn missing_table(table: &str) -> UploadError {
    UploadError::Service(format!("ResourceNotFoundException: table {} not found", table))
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock().tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()> {
        let polls = self.creation_polls;
        self.lock()
            .tables
            .entry(table.to_string())
            .or_insert_with(|| MemoryTable {
                schema: schema.clone(),
                pending_polls: polls,
                items: BTreeMap::new(),
            });
        Ok(())
    }

    async fn table_status(&self, table: &str) -> Result<TableStatus> {
        let mut state = self.lock();
        let entry = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        if entry.pending_polls > 0 {
            entry.pending_polls -= 1;
            return Ok(TableStatus::Creating);
        }
        Ok(TableStatus::Active)
    }

    async fn batch_write(&self, table: &str, items: &[TableItem]) -> Result<Vec<ItemKey>> {
        let mut state = self.lock();
        state.batch_calls += 1;

        if state.fail_on_batch == Some(state.batch_calls) {
            return Err(UploadError::Service(
                "ProvisionedThroughputExceededException: simulated failure".to_string(),
            ));
        }

        let keys: HashSet<&ItemKey> = items.iter().map(|i| &i.key).collect();
        if keys.len() != items.len() {
            return Err(UploadError::Service(
                "ValidationException: provided list of item keys contains duplicates".to_string(),
            ));
        }

        let skip = state.unprocessed_budget.min(items.len());
        state.unprocessed_budget -= skip;
        let (written, unprocessed) = items.split_at(items.len() - skip);

        let entry = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        for item in written {
            entry.items.insert(item.key.clone(), item.clone());
        }

        Ok(unprocessed.iter().map(|i| i.key.clone()).collect())
    }

    async fn count_items(&self, table: &str) -> Result<u64> {
        let state = self.lock();
        let entry = state.tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(entry.items.len() as u64)
    }

    async fn sample_item(&self, table: &str) -> Result<Option<TableItem>> {
        let state = self.lock();
        let entry = state.tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(entry.items.values().next().cloned())
    }
}

/// An object as last written to a [`MemoryBlobStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct BlobState {
    buckets: HashSet<String>,
    foreign_buckets: HashSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    put_calls: usize,
    fail_on_put: Option<usize>,
}

/// Object store holding buckets and objects in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    state: Mutex<BlobState>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.insert(bucket.to_string());
        self
    }

    /// A bucket name taken by another account
    pub fn with_foreign_bucket(self, bucket: &str) -> Self {
        self.lock().foreign_buckets.insert(bucket.to_string());
        self
    }

    /// Fail the n-th put call (1-based)
    pub fn failing_on_put(self, call: usize) -> Self {
        self.lock().fail_on_put = Some(call);
        self
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains(bucket)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BlobState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.lock().buckets.contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<BucketCreation> {
        let mut state = self.lock();
        if state.foreign_buckets.contains(bucket) {
            return Ok(BucketCreation::OwnedByOther);
        }
        if state.buckets.insert(bucket.to_string()) {
            Ok(BucketCreation::Created)
        } else {
            Ok(BucketCreation::AlreadyOwned)
        }
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let mut state = self.lock();
        state.put_calls += 1;

        if state.fail_on_put == Some(state.put_calls) {
            return Err(UploadError::ObjectUpload {
                key: request.key,
                message: "simulated failure".to_string(),
            });
        }
        if !state.buckets.contains(&request.bucket) {
            return Err(UploadError::ObjectUpload {
                key: request.key,
                message: format!("NoSuchBucket: {}", request.bucket),
            });
        }

        state.objects.insert(
            (request.bucket, request.key),
            StoredObject {
                body: request.body,
                content_type: request.content_type,
                metadata: request.metadata,
            },
        );
        Ok(())
    }
}
