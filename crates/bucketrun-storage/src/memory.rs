//! In-memory storage backend.
//!
//! [`InMemoryBackend`] models the parts of S3 semantics the workflow depends
//! on: global bucket-name ownership (`BucketAlreadyOwnedByYou` versus
//! `BucketAlreadyExists`), refusal to delete non-empty buckets, and
//! `NoSuchBucket`/`NoSuchKey` on reads. Failures can be injected per
//! operation to exercise error paths.
//!
//! All state lives in `DashMap`s; no external locking is required.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bucketrun_core::{BackendError, BackendErrorKind, BucketrunResult, StorageConfig};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::backend::{
    BucketSummary, ObjectAcl, ObjectSummary, PutObjectAck, PutObjectRequest, StorageBackend,
};
use crate::client::{ClientFactory, StorageClient};

/// Account that owns buckets created through an [`InMemoryBackend`].
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Backend operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `ListBuckets`.
    ListBuckets,
    /// `CreateBucket`.
    CreateBucket,
    /// `DeleteBucket`.
    DeleteBucket,
    /// `PutObject`.
    PutObject,
    /// `GetObject`.
    GetObject,
    /// `ListObjects`.
    ListObjects,
    /// `DeleteObject`.
    DeleteObject,
}

/// An object held by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body.
    pub body: Bytes,
    /// MIME type supplied on write.
    pub content_type: String,
    /// Canned ACL supplied on write.
    pub acl: ObjectAcl,
    /// Entity tag assigned on write.
    pub e_tag: String,
    /// Write time.
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct MemoryBucket {
    owner: String,
    creation_date: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

/// Thread-safe, in-process [`StorageBackend`].
#[derive(Debug)]
pub struct InMemoryBackend {
    account_id: String,
    buckets: DashMap<String, MemoryBucket>,
    failures: DashMap<Operation, BackendError>,
    sequence: AtomicU64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend acting as [`DEFAULT_ACCOUNT_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_account(DEFAULT_ACCOUNT_ID)
    }

    /// Create an empty backend acting as `account_id`.
    pub fn with_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            buckets: DashMap::new(),
            failures: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Register a bucket owned by another account.
    pub fn insert_foreign_bucket(&self, name: impl Into<String>, owner: impl Into<String>) {
        self.buckets.insert(
            name.into(),
            MemoryBucket {
                owner: owner.into(),
                creation_date: Utc::now(),
                objects: BTreeMap::new(),
            },
        );
    }

    /// Make every call to `operation` fail with `error` until cleared.
    pub fn inject_failure(&self, operation: Operation, error: BackendError) {
        self.failures.insert(operation, error);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, operation: Operation) {
        self.failures.remove(&operation);
    }

    /// Check whether a bucket exists, regardless of owner.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Snapshot of a stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    fn check(&self, operation: Operation) -> Result<(), BackendError> {
        match self.failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn no_such_bucket(bucket: &str) -> BackendError {
        BackendError::new(
            BackendErrorKind::NoSuchBucket,
            format!("The specified bucket does not exist: {bucket}"),
        )
    }

    fn access_denied(bucket: &str) -> BackendError {
        BackendError::from_code(Some("AccessDenied"), format!("Access Denied: {bucket}"))
    }

    /// Run `f` against a bucket owned by this account.
    fn with_owned_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut MemoryBucket) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        if entry.owner != self.account_id {
            return Err(Self::access_denied(bucket));
        }
        f(entry.value_mut())
    }
}

fn validate_bucket_name(name: &str) -> Result<(), BackendError> {
    let valid_len = (MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&name.len());
    let valid_chars = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.');
    let valid_edges = name
        .bytes()
        .next()
        .zip(name.bytes().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if valid_len && valid_chars && valid_edges {
        Ok(())
    } else {
        Err(BackendError::from_code(
            Some("InvalidBucketName"),
            format!("The specified bucket is not valid: {name}"),
        ))
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, BackendError> {
        self.check(Operation::ListBuckets)?;

        let mut buckets: Vec<BucketSummary> = self
            .buckets
            .iter()
            .filter(|entry| entry.value().owner == self.account_id)
            .map(|entry| BucketSummary {
                name: entry.key().clone(),
                creation_date: Some(entry.value().creation_date),
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.check(Operation::CreateBucket)?;
        validate_bucket_name(bucket)?;

        if let Some(existing) = self.buckets.get(bucket) {
            if existing.owner == self.account_id {
                return Err(BackendError::new(
                    BackendErrorKind::BucketAlreadyOwnedByYou,
                    format!(
                        "Your previous request to create the named bucket succeeded and you already own it: {bucket}"
                    ),
                ));
            }
            return Err(BackendError::new(
                BackendErrorKind::BucketAlreadyExists,
                format!("The requested bucket name is not available: {bucket}"),
            ));
        }

        self.buckets.insert(
            bucket.to_owned(),
            MemoryBucket {
                owner: self.account_id.clone(),
                creation_date: Utc::now(),
                objects: BTreeMap::new(),
            },
        );
        info!(bucket, "bucket created");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.check(Operation::DeleteBucket)?;

        self.with_owned_bucket(bucket, |b| {
            if b.objects.is_empty() {
                Ok(())
            } else {
                Err(BackendError::from_code(
                    Some("BucketNotEmpty"),
                    format!("The bucket you tried to delete is not empty: {bucket}"),
                ))
            }
        })?;

        self.buckets.remove(bucket);
        info!(bucket, "bucket deleted");
        Ok(())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectAck, BackendError> {
        self.check(Operation::PutObject)?;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let e_tag = format!("\"{sequence:032x}\"");
        let PutObjectRequest {
            bucket,
            key,
            body,
            content_type,
            acl,
        } = request;

        self.with_owned_bucket(&bucket, |b| {
            b.objects.insert(
                key.clone(),
                StoredObject {
                    body,
                    content_type,
                    acl,
                    e_tag: e_tag.clone(),
                    last_modified: Utc::now(),
                },
            );
            Ok(())
        })?;

        debug!(bucket = %bucket, key = %key, "object stored");
        Ok(PutObjectAck {
            e_tag: Some(e_tag),
            version_id: None,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BackendError> {
        self.check(Operation::GetObject)?;

        self.with_owned_bucket(bucket, |b| {
            b.objects
                .get(key)
                .map(|object| object.body.clone())
                .ok_or_else(|| {
                    BackendError::new(
                        BackendErrorKind::NoSuchKey,
                        format!("The specified key does not exist: {key}"),
                    )
                })
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>, BackendError> {
        self.check(Operation::ListObjects)?;

        let limit = usize::try_from(max_keys).unwrap_or_default();
        self.with_owned_bucket(bucket, |b| {
            Ok(b.objects
                .iter()
                .filter(|(key, _)| prefix.is_none_or(|p| key.starts_with(p)))
                .take(limit)
                .map(|(key, object)| ObjectSummary {
                    key: key.clone(),
                    size: i64::try_from(object.body.len()).unwrap_or(i64::MAX),
                    last_modified: Some(object.last_modified),
                })
                .collect())
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.check(Operation::DeleteObject)?;

        self.with_owned_bucket(bucket, |b| {
            b.objects.remove(key);
            Ok(())
        })
    }
}

/// [`ClientFactory`] handing out clients that share one [`InMemoryBackend`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientFactory {
    backend: Arc<InMemoryBackend>,
}

impl InMemoryClientFactory {
    /// Create a factory over `backend`.
    #[must_use]
    pub fn new(backend: Arc<InMemoryBackend>) -> Self {
        Self { backend }
    }

    /// The shared backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<InMemoryBackend> {
        &self.backend
    }
}

#[async_trait]
impl ClientFactory for InMemoryClientFactory {
    async fn new_client(&self, config: &StorageConfig) -> BucketrunResult<StorageClient> {
        Ok(StorageClient::new(config.clone(), self.backend.clone()))
    }
}
