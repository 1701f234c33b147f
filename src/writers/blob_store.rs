use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Outcome of a bucket creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    /// The caller already owns a bucket of this name
    AlreadyOwned,
    /// The name is taken by another account; nothing can be written to it
    OwnedByOther,
}

#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// Operations the object pipeline needs from an object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `Ok(false)` when the bucket does not exist; an error when access is denied
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<BucketCreation>;

    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;
}
