//! Amazon S3 backend built on `aws-sdk-s3`.
//!
//! This is the only module that sees SDK error shapes. Every failure is
//! classified by its service error code into a [`BackendError`]; transport
//! failures carry no code and classify as [`BackendErrorKind::Other`].
//!
//! [`BackendErrorKind::Other`]: bucketrun_core::BackendErrorKind::Other

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl};
use bucketrun_core::BackendError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backend::{
    BucketSummary, ObjectAcl, ObjectSummary, PutObjectAck, PutObjectRequest, StorageBackend,
};

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

/// [`StorageBackend`] over an `aws_sdk_s3::Client`.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3Backend {
    /// Wrap a client whose buckets live in `region`.
    pub fn new(client: aws_sdk_s3::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Wrap a client, taking the region from its configuration.
    #[must_use]
    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        let region = client
            .config()
            .region()
            .map_or_else(|| DEFAULT_REGION.to_owned(), ToString::to_string);
        Self::new(client, region)
    }

    /// Region new buckets are created in.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Translate an SDK error into the backend error vocabulary.
fn translate<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let context = DisplayErrorContext(&err).to_string();
    match err.as_service_error() {
        Some(service) => BackendError::from_code(
            service.code(),
            service.message().map_or(context, ToOwned::to_owned),
        ),
        None => BackendError::from_code(None, context),
    }
}

fn to_chrono(timestamp: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        ObjectAcl::Private => ObjectCannedAcl::Private,
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, BackendError> {
        let output = self.client.list_buckets().send().await.map_err(translate)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                Some(BucketSummary {
                    name: bucket.name()?.to_owned(),
                    creation_date: bucket.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        request.send().await.map_err(translate)?;
        debug!(bucket, region = %self.region, "create_bucket completed");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(translate)?;
        debug!(bucket, "delete_bucket completed");
        Ok(())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectAck, BackendError> {
        let output = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .acl(canned_acl(request.acl))
            .content_type(&request.content_type)
            .body(ByteStream::from(request.body))
            .send()
            .await
            .map_err(translate)?;

        debug!(bucket = %request.bucket, key = %request.key, "put_object completed");
        Ok(PutObjectAck {
            e_tag: output.e_tag().map(ToOwned::to_owned),
            version_id: output.version_id().map(ToOwned::to_owned),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(translate)?;

        let body = output.body.collect().await.map_err(|e| {
            BackendError::from_code(None, format!("failed to read object body: {e}"))
        })?;
        Ok(body.into_bytes())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>, BackendError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(ToOwned::to_owned))
            .max_keys(max_keys)
            .send()
            .await
            .map_err(translate)?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_owned(),
                    size: object.size().unwrap_or_default(),
                    last_modified: object.last_modified().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(translate)?;
        debug!(bucket, key, "delete_object completed");
        Ok(())
    }
}
