use super::aws::service_error;
use super::blob_store::{BlobStore, BucketCreation, PutObjectRequest};
use crate::error::{Result, UploadError};
use crate::utils::constants::DEFAULT_REGION;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use tracing::debug;

/// [`BlobStore`] backed by Amazon S3.
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Path-style addressing is needed by most S3-compatible local endpoints
    pub fn with_path_style(config: &SdkConfig) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let err = match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(true),
            Err(err) => err,
        };

        let status = err.raw_response().map(|r| r.status().as_u16());
        let not_found = err
            .as_service_error()
            .map(|e| e.is_not_found())
            .unwrap_or(false);

        match status {
            _ if not_found => Ok(false),
            Some(404) => Ok(false),
            Some(403) => Err(UploadError::provisioning(
                format!("bucket '{}'", bucket),
                "access denied; check permissions or choose another bucket name",
            )),
            _ => Err(service_error("HeadBucket", &err)),
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<BucketCreation> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        let err = match request.send().await {
            Ok(_) => return Ok(BucketCreation::Created),
            Err(err) => err,
        };

        let outcome = err.as_service_error().and_then(|e| {
            if e.is_bucket_already_owned_by_you() {
                Some(BucketCreation::AlreadyOwned)
            } else if e.is_bucket_already_exists() {
                Some(BucketCreation::OwnedByOther)
            } else {
                None
            }
        });

        match outcome {
            Some(creation) => Ok(creation),
            None => Err(service_error("CreateBucket", &err)),
        }
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let size = request.body.len();
        let mut put = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_type(&request.content_type)
            .body(ByteStream::from(request.body));

        for (name, value) in &request.metadata {
            put = put.metadata(name, value);
        }

        put.send().await.map_err(|e| UploadError::ObjectUpload {
            key: request.key.clone(),
            message: service_error("PutObject", &e).to_string(),
        })?;

        debug!("Put s3://{}/{} ({} bytes)", request.bucket, request.key, size);
        Ok(())
    }
}
