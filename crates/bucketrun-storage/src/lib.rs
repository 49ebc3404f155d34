//! Storage access for bucketrun.
//!
//! # Architecture
//!
//! ```text
//! ClientFactory (S3ClientFactory | InMemoryClientFactory)
//!        |
//!        v
//! StorageClient (config + backend session)
//!        |
//!        +--> BucketLifecycle (list / create / delete / reclaim)
//!        +--> ObjectExchange  (put / get / list)
//!        |
//!        v
//! StorageBackend (S3Backend over aws-sdk-s3 | InMemoryBackend)
//! ```
//!
//! Backend failures are classified once into
//! [`BackendErrorKind`](bucketrun_core::BackendErrorKind); the lifecycle and
//! exchange layers turn the benign and not-found kinds into structured
//! outcomes ([`CreateOutcome`], [`Fetched`]).

pub mod backend;
pub mod bucket;
pub mod client;
pub mod memory;
pub mod object;
pub mod s3;

pub use backend::{
    BucketSummary, ObjectAcl, ObjectSummary, PutObjectAck, PutObjectRequest, StorageBackend,
};
pub use bucket::{BucketInventory, BucketLifecycle, CreateOutcome, Reclaim};
pub use client::{ClientFactory, ConnectOptions, S3ClientFactory, StorageClient};
pub use memory::{InMemoryBackend, InMemoryClientFactory};
pub use object::{Fetched, ObjectExchange};
pub use s3::S3Backend;
