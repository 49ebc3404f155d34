//! Error types for bucketrun.
//!
//! Backend errors are translated once, at the storage adapter boundary, into
//! [`BackendError`] values carrying a closed [`BackendErrorKind`]. Nothing
//! past that boundary inspects SDK-specific error shapes.

use std::fmt;

/// Configuration resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// One or more required settings were empty or unset.
    #[error("missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),
}

/// Closed vocabulary of backend error codes the workflow branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// The bucket name is taken by a different account.
    BucketAlreadyExists,
    /// The caller already owns a bucket with this name.
    BucketAlreadyOwnedByYou,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The key does not exist in the bucket.
    NoSuchKey,
    /// Any other backend failure, including transport errors.
    Other,
}

impl BackendErrorKind {
    /// Classify a backend error code string.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketrun_core::error::BackendErrorKind;
    ///
    /// assert_eq!(BackendErrorKind::from_code("NoSuchKey"), BackendErrorKind::NoSuchKey);
    /// assert_eq!(BackendErrorKind::from_code("AccessDenied"), BackendErrorKind::Other);
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "BucketAlreadyExists" => Self::BucketAlreadyExists,
            "BucketAlreadyOwnedByYou" => Self::BucketAlreadyOwnedByYou,
            "NoSuchBucket" => Self::NoSuchBucket,
            "NoSuchKey" => Self::NoSuchKey,
            _ => Self::Other,
        }
    }

    /// Returns the canonical error code for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketAlreadyOwnedByYou => "BucketAlreadyOwnedByYou",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::Other => "Other",
        }
    }

    /// Whether this kind means the addressed bucket or key is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchBucket | Self::NoSuchKey)
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    kind: BackendErrorKind,
    code: Option<String>,
    message: String,
}

impl BackendError {
    /// Create an error of the given kind, using the kind as its code.
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: Some(kind.as_str().to_owned()),
            message: message.into(),
        }
    }

    /// Create an error from a raw backend code, classifying it.
    ///
    /// A missing code (transport failures, timeouts) classifies as
    /// [`BackendErrorKind::Other`].
    pub fn from_code(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind: code.map_or(BackendErrorKind::Other, BackendErrorKind::from_code),
            code: code.map(ToOwned::to_owned),
            message: message.into(),
        }
    }

    /// Classified kind.
    #[must_use]
    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    /// Raw backend code, when the backend supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Top-level error type for bucketrun operations.
#[derive(Debug, thiserror::Error)]
pub enum BucketrunError {
    /// Required configuration is missing; fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The storage client could not be established; fatal.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected an operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A record could not be encoded for storage.
    #[error("failed to encode record {key}: {source}")]
    Encoding {
        /// Key of the record being written.
        key: String,
        /// Underlying codec error.
        source: serde_json::Error,
    },

    /// An object body did not decode into the expected record shape.
    #[error("failed to decode object {key}: {source}")]
    Deserialization {
        /// Key of the object being read.
        key: String,
        /// Underlying codec error.
        source: serde_json::Error,
    },
}

impl BucketrunError {
    /// Whether the workflow cannot proceed after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Connection(_))
    }

    /// Backend error kind, when this is a backend failure.
    #[must_use]
    pub fn backend_kind(&self) -> Option<BackendErrorKind> {
        match self {
            Self::Backend(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Convenience result type for bucketrun operations.
pub type BucketrunResult<T> = Result<T, BucketrunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_known_codes() {
        for kind in [
            BackendErrorKind::BucketAlreadyExists,
            BackendErrorKind::BucketAlreadyOwnedByYou,
            BackendErrorKind::NoSuchBucket,
            BackendErrorKind::NoSuchKey,
        ] {
            assert_eq!(BackendErrorKind::from_code(kind.as_str()), kind);
        }
        assert_eq!(
            BackendErrorKind::from_code("BucketNotEmpty"),
            BackendErrorKind::Other
        );
    }

    #[test]
    fn test_should_keep_raw_code_for_unclassified_errors() {
        let err = BackendError::from_code(Some("AccessDenied"), "Access Denied");
        assert_eq!(err.kind(), BackendErrorKind::Other);
        assert_eq!(err.code(), Some("AccessDenied"));
        assert_eq!(err.to_string(), "AccessDenied: Access Denied");
    }

    #[test]
    fn test_should_classify_codeless_errors_as_other() {
        let err = BackendError::from_code(None, "dispatch failure");
        assert_eq!(err.kind(), BackendErrorKind::Other);
        assert_eq!(err.to_string(), "dispatch failure");
    }

    #[test]
    fn test_should_mark_only_setup_errors_fatal() {
        let config = BucketrunError::from(ConfigError::MissingSettings(vec!["zone"]));
        assert!(config.is_fatal());
        assert!(BucketrunError::Connection("no credentials".to_owned()).is_fatal());

        let backend = BucketrunError::from(BackendError::new(BackendErrorKind::NoSuchKey, "gone"));
        assert!(!backend.is_fatal());
        assert_eq!(backend.backend_kind(), Some(BackendErrorKind::NoSuchKey));
    }

    #[test]
    fn test_should_keep_codec_errors_non_fatal() {
        let source = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let err = BucketrunError::Deserialization {
            key: "Solomon".to_owned(),
            source,
        };
        assert!(!err.is_fatal());
        assert_eq!(err.backend_kind(), None);
        assert!(err.to_string().starts_with("failed to decode object Solomon: "));
    }
}
