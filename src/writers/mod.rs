pub mod aws;
pub mod blob_store;
pub mod dynamodb;
pub mod formats;
pub mod memory;
pub mod s3;
pub mod table_store;

pub use aws::load_sdk_config;
pub use blob_store::{BlobStore, BucketCreation, PutObjectRequest};
pub use dynamodb::DynamoTableStore;
pub use formats::{FormatConverter, OutputFormat};
pub use memory::{MemoryBlobStore, MemoryTableStore, StoredObject};
pub use s3::S3BlobStore;
pub use table_store::{KeySchema, TableStatus, TableStore};
