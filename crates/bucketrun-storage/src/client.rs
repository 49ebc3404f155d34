//! Storage clients and the factories that build them.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use bucketrun_core::{BucketrunError, BucketrunResult, StorageConfig};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::backend::StorageBackend;
use crate::bucket::BucketLifecycle;
use crate::object::ObjectExchange;
use crate::s3::S3Backend;

/// A backend session bound to the configuration that produced it.
///
/// A client lives for one workflow run.
#[derive(Debug, Clone)]
pub struct StorageClient {
    config: StorageConfig,
    backend: Arc<dyn StorageBackend>,
}

impl StorageClient {
    /// Bind `backend` to `config`.
    pub fn new(config: StorageConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self { config, backend }
    }

    /// Configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Underlying backend.
    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Bucket lifecycle operations through this client.
    #[must_use]
    pub fn buckets(&self) -> BucketLifecycle<'_> {
        BucketLifecycle::new(self)
    }

    /// Object operations through this client.
    #[must_use]
    pub fn objects(&self) -> ObjectExchange<'_> {
        ObjectExchange::new(self)
    }
}

/// Builds a [`StorageClient`] for a resolved configuration.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Establish a client scoped to `config.zone()`.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Connection`] if no session can be established.
    async fn new_client(&self, config: &StorageConfig) -> BucketrunResult<StorageClient>;
}

/// Connection overrides for S3-compatible endpoints.
///
/// # Examples
///
/// ```
/// use bucketrun_storage::client::ConnectOptions;
///
/// let options = ConnectOptions::builder()
///     .endpoint_url("http://localhost:4566")
///     .force_path_style(true)
///     .build();
/// assert_eq!(options.endpoint_url.as_deref(), Some("http://localhost:4566"));
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct ConnectOptions {
    /// Custom endpoint instead of the regional AWS endpoint.
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Address buckets by path instead of virtual host.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Fixed credentials instead of the default provider chain.
    #[builder(default, setter(strip_option))]
    pub credentials: Option<Credentials>,
}

/// [`ClientFactory`] producing clients backed by Amazon S3.
///
/// Credential and region discovery is delegated to `aws-config`; the region
/// is overridden from the configured zone. Credentials are resolved once while
/// building the client so a missing identity fails the run up front.
#[derive(Debug, Clone, Default)]
pub struct S3ClientFactory {
    options: ConnectOptions,
}

impl S3ClientFactory {
    /// Create a factory with the given connection overrides.
    #[must_use]
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ClientFactory for S3ClientFactory {
    async fn new_client(&self, config: &StorageConfig) -> BucketrunResult<StorageClient> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.zone().to_owned()));
        if let Some(credentials) = &self.options.credentials {
            loader = loader.credentials_provider(credentials.clone());
        }
        let sdk_config = loader.load().await;
        verify_credentials(&sdk_config, config.zone()).await?;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.options.force_path_style);
        if let Some(endpoint_url) = &self.options.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        info!(
            zone = %config.zone(),
            endpoint_url = ?self.options.endpoint_url,
            "storage client ready",
        );

        Ok(StorageClient::new(
            config.clone(),
            Arc::new(S3Backend::new(client, config.zone())),
        ))
    }
}

/// Resolve credentials from the loaded configuration.
async fn verify_credentials(sdk_config: &SdkConfig, zone: &str) -> BucketrunResult<()> {
    let Some(provider) = sdk_config.credentials_provider() else {
        return Err(BucketrunError::Connection(format!(
            "no AWS credentials provider configured for region {zone}"
        )));
    };

    provider.provide_credentials().await.map_err(|e| {
        BucketrunError::Connection(format!(
            "unable to resolve AWS credentials for region {zone}: {}",
            DisplayErrorContext(&e)
        ))
    })?;
    Ok(())
}
