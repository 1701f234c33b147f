use crate::config::AwsSettings;
use crate::error::{Result, UploadError};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::error::Error;
use std::fmt::Debug;
use tracing::{debug, info};

/// Load the shared SDK configuration and make sure credentials resolve.
///
/// Resolving credentials up front turns a missing profile or key pair into a
/// single configuration error instead of a failure on the first service call.
pub async fn load_sdk_config(settings: &AwsSettings) -> Result<SdkConfig> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));

    if let Some(profile) = &settings.profile {
        debug!("Using AWS profile '{}'", profile);
        loader = loader.profile_name(profile);
    }

    if let Some(endpoint) = &settings.endpoint_url {
        info!("Using custom AWS endpoint {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    let config = loader.load().await;

    let provider = config.credentials_provider().ok_or_else(|| {
        UploadError::CredentialsMissing("no credentials provider is configured".to_string())
    })?;

    provider
        .provide_credentials()
        .await
        .map_err(|e| UploadError::CredentialsMissing(e.to_string()))?;

    info!("Connected to AWS in region {}", settings.region);
    Ok(config)
}

/// Flatten an SDK failure into a service error naming the operation.
pub(crate) fn service_error<E, R>(operation: &str, err: &SdkError<E, R>) -> UploadError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: Debug,
{
    let message = match err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            match (inner.code(), inner.message()) {
                (Some(code), Some(message)) => format!("{}: {}", code, message),
                (Some(code), None) => code.to_string(),
                _ => inner.to_string(),
            }
        }
        SdkError::TimeoutError(_) => "operation timed out".to_string(),
        other => DisplayErrorContext(other).to_string(),
    };

    UploadError::Service(format!("{} failed: {}", operation, message))
}
