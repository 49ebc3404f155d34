//! Object exchange: write records as objects and read them back.
//!
//! Bodies are buffered whole in both directions. That bounds object size to
//! what the process can hold, which suits the small records stored here.

use bucketrun_core::{BucketrunError, BucketrunResult, Record};
use bytes::Bytes;
use tracing::{info, warn};

use crate::backend::{DEFAULT_MAX_KEYS, ObjectAcl, ObjectSummary, PutObjectAck, PutObjectRequest};
use crate::client::StorageClient;

/// A read that distinguishes "absent" from "broken".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The value was read.
    Found(T),
    /// The bucket or key does not exist.
    NotFound,
}

impl<T> Fetched<T> {
    /// The value, if found.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    /// Whether the read hit an absent bucket or key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Object operations issued through a [`StorageClient`].
#[derive(Debug, Clone, Copy)]
pub struct ObjectExchange<'a> {
    client: &'a StorageClient,
}

impl<'a> ObjectExchange<'a> {
    /// Operate through `client`.
    #[must_use]
    pub fn new(client: &'a StorageClient) -> Self {
        Self { client }
    }

    /// Encode `record` and write it under its key, publicly readable, with
    /// the configured content type.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Encoding`] if the record cannot be encoded
    /// and [`BucketrunError::Backend`] if the write is rejected.
    pub async fn put<R: Record>(&self, bucket: &str, record: &R) -> BucketrunResult<PutObjectAck> {
        let config = self.client.config();
        let key = config.object_key(record.key());
        let body = record.encode().map_err(|source| BucketrunError::Encoding {
            key: key.clone(),
            source,
        })?;

        let request = PutObjectRequest {
            bucket: bucket.to_owned(),
            key: key.clone(),
            body: Bytes::from(body),
            content_type: config.content_type().to_owned(),
            acl: ObjectAcl::PublicRead,
        };

        let ack = self
            .client
            .backend()
            .put_object(request)
            .await
            .inspect_err(|e| warn!(bucket, key = %key, error = %e, "unable to write object"))?;

        info!(bucket, key = %key, e_tag = ?ack.e_tag, "object written");
        Ok(ack)
    }

    /// Read the object stored for `key` and decode it.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Deserialization`] if the body does not decode
    /// (the body is logged), and [`BucketrunError::Backend`] for backend
    /// failures other than a missing bucket or key.
    pub async fn get<R: Record>(&self, bucket: &str, key: &str) -> BucketrunResult<Fetched<R>> {
        let key = self.client.config().object_key(key);

        let body = match self.client.backend().get_object(bucket, &key).await {
            Ok(body) => body,
            Err(err) if err.kind().is_not_found() => {
                info!(bucket, key = %key, code = %err.kind(), "object not found");
                return Ok(Fetched::NotFound);
            }
            Err(err) => {
                warn!(bucket, key = %key, error = %err, "unable to read object");
                return Err(err.into());
            }
        };

        match R::decode(&body) {
            Ok(record) => {
                info!(bucket, key = %key, bytes = body.len(), "object read");
                Ok(Fetched::Found(record))
            }
            Err(source) => {
                warn!(
                    bucket,
                    key = %key,
                    body = %String::from_utf8_lossy(&body),
                    error = %source,
                    "unable to decode object body",
                );
                Err(BucketrunError::Deserialization { key, source })
            }
        }
    }

    /// List up to 1000 objects under the configured prefix.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Backend`] for failures other than a missing
    /// bucket.
    pub async fn list(&self, bucket: &str) -> BucketrunResult<Fetched<Vec<ObjectSummary>>> {
        let prefix = self.client.config().path();
        let prefix = (!prefix.is_empty()).then_some(prefix);

        match self
            .client
            .backend()
            .list_objects(bucket, prefix, DEFAULT_MAX_KEYS)
            .await
        {
            Ok(objects) => {
                for object in &objects {
                    info!(bucket, key = %object.key, size = object.size, "found object");
                }
                Ok(Fetched::Found(objects))
            }
            Err(err) if err.kind().is_not_found() => {
                info!(bucket, code = %err.kind(), "bucket not found");
                Ok(Fetched::NotFound)
            }
            Err(err) => {
                warn!(bucket, error = %err, "unable to list objects");
                Err(err.into())
            }
        }
    }
}
