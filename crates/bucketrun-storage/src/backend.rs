//! Storage backend contract.
//!
//! [`StorageBackend`] is the request/response surface the workflow needs from
//! an object store. Implementations translate their native failures into
//! [`BackendError`] before returning.

use async_trait::async_trait;
use bucketrun_core::BackendError;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Maximum number of keys requested by a single object listing.
pub const DEFAULT_MAX_KEYS: i32 = 1000;

/// Canned access policy applied to written objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    /// Owner has full control; everyone else may read.
    #[default]
    PublicRead,
    /// Only the owner has access.
    Private,
}

impl ObjectAcl {
    /// Returns the canned ACL header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicRead => "public-read",
            Self::Private => "private",
        }
    }
}

/// A bucket as reported by `ListBuckets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Creation time, when the backend reports one.
    pub creation_date: Option<DateTime<Utc>>,
}

/// An object as reported by `ListObjects`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: i64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A single-shot object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    /// Target bucket.
    pub bucket: String,
    /// Full object key.
    pub key: String,
    /// Complete object body.
    pub body: Bytes,
    /// MIME type stored with the object.
    pub content_type: String,
    /// Canned ACL applied to the object.
    pub acl: ObjectAcl,
}

/// Acknowledgement of a successful object write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectAck {
    /// Entity tag assigned by the backend.
    pub e_tag: Option<String>,
    /// Version identifier, when the bucket is versioned.
    pub version_id: Option<String>,
}

/// Request/response contract of an object store.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// List every bucket visible to the caller.
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, BackendError>;

    /// Create a bucket.
    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Delete an empty bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Write an object.
    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectAck, BackendError>;

    /// Read an object body completely into memory.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BackendError>;

    /// List up to `max_keys` objects whose key starts with `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>, BackendError>;

    /// Delete an object. Deleting an absent key succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;
}
