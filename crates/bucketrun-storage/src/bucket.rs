//! Bucket lifecycle: list, idempotent create, delete, and reclaim.

use bucketrun_core::{BackendErrorKind, BucketrunError, BucketrunResult};
use tracing::{info, warn};

use crate::backend::{BucketSummary, DEFAULT_MAX_KEYS};
use crate::client::StorageClient;

/// Result of a create call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The bucket was created by this call.
    Created,
    /// The caller already owned the bucket; nothing changed.
    AlreadyOwned,
}

/// What happened to a leftover bucket found during listing.
#[derive(Debug)]
pub enum Reclaim {
    /// No bucket with the target name was listed.
    Absent,
    /// The bucket was emptied and deleted.
    Reclaimed {
        /// Number of objects deleted before the bucket itself.
        objects_removed: usize,
    },
    /// The bucket was listed but could not be removed.
    Failed {
        /// Why the reclaim stopped.
        error: BucketrunError,
    },
}

/// Buckets listed by [`BucketLifecycle::list_and_reclaim`].
#[derive(Debug)]
pub struct BucketInventory {
    /// Buckets as listed, before any reclaim.
    pub buckets: Vec<BucketSummary>,
    /// Outcome of reclaiming the target bucket.
    pub reclaim: Reclaim,
}

/// Bucket operations issued through a [`StorageClient`].
#[derive(Debug, Clone, Copy)]
pub struct BucketLifecycle<'a> {
    client: &'a StorageClient,
}

impl<'a> BucketLifecycle<'a> {
    /// Operate through `client`.
    #[must_use]
    pub fn new(client: &'a StorageClient) -> Self {
        Self { client }
    }

    /// List every bucket owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Backend`] if the backend rejects the listing.
    pub async fn list_buckets(&self) -> BucketrunResult<Vec<BucketSummary>> {
        let buckets = self
            .client
            .backend()
            .list_buckets()
            .await
            .inspect_err(|e| warn!(error = %e, "unable to list buckets"))?;

        for bucket in &buckets {
            info!(bucket = %bucket.name, created = ?bucket.creation_date, "found bucket");
        }
        Ok(buckets)
    }

    /// Create `name`, treating a bucket the caller already owns as success.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Backend`] for any other backend error,
    /// including a name taken by a different account.
    pub async fn create_bucket(&self, name: &str) -> BucketrunResult<CreateOutcome> {
        match self.client.backend().create_bucket(name).await {
            Ok(()) => {
                info!(bucket = name, "bucket created");
                Ok(CreateOutcome::Created)
            }
            Err(err) if err.kind() == BackendErrorKind::BucketAlreadyOwnedByYou => {
                info!(bucket = name, "bucket already owned by caller");
                Ok(CreateOutcome::AlreadyOwned)
            }
            Err(err) => {
                warn!(bucket = name, error = %err, "unable to create bucket");
                Err(err.into())
            }
        }
    }

    /// Delete `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Backend`] if the backend refuses, e.g. when
    /// the bucket is absent or still holds objects.
    pub async fn delete_bucket(&self, name: &str) -> BucketrunResult<()> {
        self.client
            .backend()
            .delete_bucket(name)
            .await
            .inspect_err(|e| warn!(bucket = name, error = %e, "unable to delete bucket"))?;
        info!(bucket = name, "bucket deleted");
        Ok(())
    }

    /// Delete every object in `name`, then the bucket itself.
    ///
    /// Returns the number of objects removed.
    ///
    /// # Errors
    ///
    /// Stops at the first failed listing or deletion.
    pub async fn reclaim_bucket(&self, name: &str) -> BucketrunResult<usize> {
        let backend = self.client.backend();
        let mut removed = 0;

        loop {
            let batch = backend.list_objects(name, None, DEFAULT_MAX_KEYS).await?;
            if batch.is_empty() {
                break;
            }
            for object in batch {
                backend.delete_object(name, &object.key).await?;
                removed += 1;
            }
        }

        self.delete_bucket(name).await?;
        Ok(removed)
    }

    /// List buckets and reclaim `target` if it is among them.
    ///
    /// This is the workflow's only consistency mechanism: a bucket left over
    /// from a previous run is removed so the run starts from a clean slate.
    /// A failed reclaim is reported in the inventory, not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`BucketrunError::Backend`] only if the listing itself fails.
    pub async fn list_and_reclaim(&self, target: &str) -> BucketrunResult<BucketInventory> {
        let buckets = self.list_buckets().await?;

        let reclaim = if buckets.iter().any(|b| b.name == target) {
            info!(bucket = target, "found leftover bucket, reclaiming");
            match self.reclaim_bucket(target).await {
                Ok(objects_removed) => Reclaim::Reclaimed { objects_removed },
                Err(error) => {
                    warn!(bucket = target, error = %error, "unable to reclaim bucket");
                    Reclaim::Failed { error }
                }
            }
        } else {
            Reclaim::Absent
        };

        Ok(BucketInventory { buckets, reclaim })
    }
}
