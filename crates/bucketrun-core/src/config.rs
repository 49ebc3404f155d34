//! Storage configuration resolution.
//!
//! All configuration is driven by environment variables named the way the
//! hosting runtime passes them (`zone`, `bucket`, `contentType`, `path`).
//! Resolution is pure: [`StorageConfig::from_lookup`] accepts any lookup
//! function, and [`StorageConfig::from_env`] is a thin wrapper over it.

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable holding the storage region.
pub const ZONE_VAR: &str = "zone";
/// Environment variable holding the bucket name.
pub const BUCKET_VAR: &str = "bucket";
/// Environment variable holding the MIME type of stored objects.
pub const CONTENT_TYPE_VAR: &str = "contentType";
/// Environment variable holding the storage prefix.
pub const PATH_VAR: &str = "path";

/// Resolved, immutable storage configuration.
///
/// Instances can only be obtained through [`StorageConfig::resolve`] (or the
/// lookup helpers built on it), so every value carries non-empty `zone`,
/// `bucket`, and `content_type` fields and an already-normalized `path`.
///
/// # Examples
///
/// ```
/// use bucketrun_core::config::StorageConfig;
///
/// let config = StorageConfig::resolve("us-west-1", "my-bucket", "application/json", "/data")
///     .expect("valid configuration");
/// assert_eq!(config.path(), "data/");
/// assert_eq!(config.object_key("Solomon"), "data/Solomon");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    zone: String,
    bucket: String,
    content_type: String,
    path: String,
}

impl StorageConfig {
    /// Resolve a configuration from raw setting values.
    ///
    /// Required values are trimmed before validation. The path is always
    /// normalized, regardless of whether the other settings are valid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSettings`] naming every required setting
    /// that is empty after trimming.
    pub fn resolve(
        raw_zone: &str,
        raw_bucket: &str,
        raw_content_type: &str,
        raw_path: &str,
    ) -> Result<Self, ConfigError> {
        let path = normalize_path(raw_path);

        let zone = raw_zone.trim();
        let bucket = raw_bucket.trim();
        let content_type = raw_content_type.trim();

        let missing: Vec<&'static str> = [
            (ZONE_VAR, zone),
            (BUCKET_VAR, bucket),
            (CONTENT_TYPE_VAR, content_type),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(missing));
        }

        Ok(Self {
            zone: zone.to_owned(),
            bucket: bucket.to_owned(),
            content_type: content_type.to_owned(),
            path,
        })
    }

    /// Resolve a configuration from a name-to-value lookup.
    ///
    /// Unset names are treated as empty strings.
    ///
    /// # Errors
    ///
    /// See [`StorageConfig::resolve`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).unwrap_or_default();
        let config = Self::resolve(
            &get(ZONE_VAR),
            &get(BUCKET_VAR),
            &get(CONTENT_TYPE_VAR),
            &get(PATH_VAR),
        )?;
        debug!(?config, "resolved storage configuration");
        Ok(config)
    }

    /// Resolve a configuration from process environment variables.
    ///
    /// | Variable | Required |
    /// |----------|----------|
    /// | `zone` | yes |
    /// | `bucket` | yes |
    /// | `contentType` | yes |
    /// | `path` | no |
    ///
    /// # Errors
    ///
    /// See [`StorageConfig::resolve`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Region identifier the storage client is scoped to.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Name of the bucket the workflow operates on.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// MIME type attached to written objects.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Normalized storage prefix; empty or ending in exactly one `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full object key for `key` under the configured prefix.
    #[must_use]
    pub fn object_key(&self, key: &str) -> String {
        format!("{}{key}", self.path)
    }
}

/// Normalize a raw storage prefix.
///
/// Whitespace-only input yields an empty prefix. Otherwise backslashes become
/// `/`, empty and `.` segments are dropped, `..` removes the preceding segment
/// (and is dropped at the root), and the result is returned without a leading
/// separator and with exactly one trailing separator. A prefix that collapses
/// to the root is empty.
///
/// # Examples
///
/// ```
/// use bucketrun_core::config::normalize_path;
///
/// assert_eq!(normalize_path("  "), "");
/// assert_eq!(normalize_path("/a//b/./c/../"), "a/b/");
/// assert_eq!(normalize_path("reports\\2024"), "reports/2024/");
/// ```
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let unified = trimmed.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return String::new();
    }

    let mut normalized = segments.join("/");
    normalized.push('/');
    normalized
}
