//! Error types for bucket provisioning.
//!
//! [`ProviderError`] is the provider-neutral shape of anything the storage or
//! identity API rejects. [`BootstrapError`] is what the provisioning sequence
//! reports: validation failures, conflicts, and wrapped provider failures.
//!
//! # Usage
//!
//! ```
//! use rustack_bootstrap_core::error::{BootstrapError, ErrorKind, ProviderError};
//!
//! let denied = ProviderError::new("Access Denied").with_code("AccessDenied").with_status(403);
//! let err = BootstrapError::from_provider("put_public_access_block", denied);
//! assert_eq!(err.kind(), ErrorKind::PermissionDenied);
//! ```

use std::fmt;

use serde::Serialize;

use crate::types::AwsRegion;

/// Error codes and statuses that mean "no such bucket".
const NOT_FOUND_CODES: &[&str] = &["404", "NoSuchBucket", "NotFound"];

/// Error codes and statuses that mean the caller may not touch the resource.
const ACCESS_DENIED_CODES: &[&str] = &["403", "AccessDenied", "Forbidden"];

/// Error codes and statuses returned when the bucket lives elsewhere.
const REDIRECT_CODES: &[&str] = &["301", "PermanentRedirect"];

/// A failure reported by the storage or identity provider.
///
/// Either `code` or `status` may be missing: HEAD responses carry no body,
/// so only the HTTP status is available for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderError {
    /// Provider error code (e.g. `NoSuchBucket`, `AccessDenied`).
    pub code: Option<String>,
    /// HTTP status of the failed response, if a response was received.
    pub status: Option<u16>,
    /// Human-readable message.
    pub message: String,
}

impl ProviderError {
    /// Create an error carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// Attach a provider error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the HTTP status of the failed response.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the error means the bucket does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.matches(NOT_FOUND_CODES)
    }

    /// Whether the error means access was refused.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        self.matches(ACCESS_DENIED_CODES)
    }

    /// Whether the error is a permanent redirect to another region.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.matches(REDIRECT_CODES)
    }

    fn matches(&self, codes: &[&str]) -> bool {
        let code_hit = self
            .code
            .as_deref()
            .is_some_and(|code| codes.contains(&code));
        let status_hit = self
            .status
            .is_some_and(|status| codes.contains(&status.to_string().as_str()));
        code_hit || status_hit
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status) {
            (Some(code), Some(status)) => write!(f, "{code} ({status}): {}", self.message),
            (Some(code), None) => write!(f, "{code}: {}", self.message),
            (None, Some(status)) => write!(f, "HTTP {status}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Broad category of a [`BootstrapError`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The bucket name failed validation.
    InvalidName,
    /// A tag failed validation.
    InvalidTag,
    /// Credentials could not be resolved or the identity could not be confirmed.
    IdentityResolutionFailure,
    /// The bucket name is taken by another account.
    OwnershipConflict,
    /// The caller owns the bucket but it lives in another region.
    RegionConflict,
    /// A hardening call was rejected by policy.
    PermissionDenied,
    /// Any other provider-side failure.
    ProviderError,
}

impl ErrorKind {
    /// Stable name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidName => "InvalidName",
            Self::InvalidTag => "InvalidTag",
            Self::IdentityResolutionFailure => "IdentityResolutionFailure",
            Self::OwnershipConflict => "OwnershipConflict",
            Self::RegionConflict => "RegionConflict",
            Self::PermissionDenied => "PermissionDenied",
            Self::ProviderError => "ProviderError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced while validating input or provisioning a bucket.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The bucket name violates a naming rule.
    #[error("Invalid bucket name '{name}': {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// Which rule was violated.
        reason: String,
    },

    /// A tag argument is malformed or exceeds a provider limit.
    #[error("Invalid tag '{tag}'. {reason}")]
    InvalidTag {
        /// The rejected raw tag argument.
        tag: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Credentials could not be resolved or the caller identity not confirmed.
    #[error("AWS identity could not be verified: {message}")]
    IdentityResolution {
        /// Description of the failure.
        message: String,
    },

    /// The bucket exists but belongs to someone else.
    #[error("Bucket '{bucket}' already exists and is not owned by this account")]
    OwnershipConflict {
        /// The contested bucket name.
        bucket: String,
    },

    /// The caller owns the bucket, but in a different region.
    #[error("Bucket '{bucket}' already exists in region '{actual}' (requested '{requested}')")]
    RegionConflict {
        /// The bucket name.
        bucket: String,
        /// Region the bucket actually lives in.
        actual: AwsRegion,
        /// Region that was requested.
        requested: AwsRegion,
    },

    /// A provider call was rejected by an access policy.
    #[error("Permission denied during {operation}: {source}")]
    PermissionDenied {
        /// The provider operation that was rejected.
        operation: &'static str,
        /// The underlying provider error.
        source: ProviderError,
    },

    /// Any other provider failure.
    #[error("AWS error during {operation}: {source}")]
    Provider {
        /// The provider operation that failed.
        operation: &'static str,
        /// The underlying provider error.
        source: ProviderError,
    },
}

impl BootstrapError {
    /// Wrap a provider failure, classifying access denials separately.
    #[must_use]
    pub fn from_provider(operation: &'static str, source: ProviderError) -> Self {
        if source.is_access_denied() {
            Self::PermissionDenied { operation, source }
        } else {
            Self::Provider { operation, source }
        }
    }

    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBucketName { .. } => ErrorKind::InvalidName,
            Self::InvalidTag { .. } => ErrorKind::InvalidTag,
            Self::IdentityResolution { .. } => ErrorKind::IdentityResolutionFailure,
            Self::OwnershipConflict { .. } => ErrorKind::OwnershipConflict,
            Self::RegionConflict { .. } => ErrorKind::RegionConflict,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Provider { .. } => ErrorKind::ProviderError,
        }
    }
}

/// Convenience result type for provisioning operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
