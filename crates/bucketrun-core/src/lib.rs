//! Core types for bucketrun.
//!
//! This crate holds everything about the bucket workflow that does not touch
//! the network: resolving [`StorageConfig`] from the hosting environment, the
//! error taxonomy shared by every component, and the [`Record`] codec used to
//! store domain values as objects.

pub mod config;
pub mod error;
pub mod record;

pub use config::{StorageConfig, normalize_path};
pub use error::{BackendError, BackendErrorKind, BucketrunError, BucketrunResult, ConfigError};
pub use record::{Guest, Record};
