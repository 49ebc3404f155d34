//! Integration tests for bucketrun against an S3-compatible server.
//!
//! These tests require a server (LocalStack or similar) at `localhost:4566`,
//! or at `S3_ENDPOINT_URL` when set. They are marked `#[ignore]` so they don't
//! run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketrun-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bucketrun_core::StorageConfig;
use bucketrun_storage::{ClientFactory, ConnectOptions, S3ClientFactory, StorageClient};

/// Endpoint used when `S3_ENDPOINT_URL` is unset.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4566";

/// Region every test bucket lives in.
pub const TEST_ZONE: &str = "us-east-1";

static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bucketrun=debug,warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Connection overrides for the local server: custom endpoint, path-style
/// addressing and fixed throwaway credentials.
#[must_use]
pub fn connect_options() -> ConnectOptions {
    let endpoint = std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_owned());
    ConnectOptions::builder()
        .endpoint_url(endpoint)
        .force_path_style(true)
        .credentials(Credentials::new("test", "test", None, None, "bucketrun-integration"))
        .build()
}

/// Factory under test, pointed at the local server.
#[must_use]
pub fn local_factory() -> S3ClientFactory {
    init_logging();
    S3ClientFactory::new(connect_options())
}

/// Storage configuration targeting `bucket` with JSON records under `path`.
#[must_use]
pub fn test_config(bucket: &str, path: &str) -> StorageConfig {
    StorageConfig::resolve(TEST_ZONE, bucket, "application/json", path)
        .unwrap_or_else(|e| panic!("invalid test config for {bucket}: {e}"))
}

/// Storage client for `bucket`, built through [`local_factory`].
pub async fn connect(bucket: &str, path: &str) -> StorageClient {
    local_factory()
        .new_client(&test_config(bucket, path))
        .await
        .unwrap_or_else(|e| panic!("unable to connect for {bucket}: {e}"))
}

/// Plain SDK client with the same overrides, for assertions that bypass the
/// storage layer (`head_bucket`, `head_object`).
#[must_use]
pub fn sdk_client() -> aws_sdk_s3::Client {
    let options = connect_options();
    let mut builder = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(TEST_ZONE))
        .force_path_style(options.force_path_style);
    if let Some(credentials) = options.credentials {
        builder = builder.credentials_provider(credentials);
    }
    if let Some(endpoint_url) = options.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

/// Bucket name unique to one test run of `area`.
#[must_use]
pub fn unique_bucket(area: &str) -> String {
    format!("bucketrun-{area}-{}", uuid::Uuid::new_v4().simple())
}

/// Empty and delete `bucket`, ignoring failures.
pub async fn cleanup_bucket(bucket: &str) {
    let client = connect(bucket, "").await;
    let _ = client.buckets().reclaim_bucket(bucket).await;
}

mod test_backend;
mod test_workflow;
