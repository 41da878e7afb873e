//! Domain types shared by the validator, the provisioner and provider adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Account ID reported by local S3-compatible emulators.
    pub const DEFAULT: &str = "000000000000";

    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns [`BootstrapError::IdentityResolution`] if the account ID is not
    /// a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, BootstrapError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(BootstrapError::IdentityResolution {
                message: format!("invalid AWS account ID: {id} (must be 12-digit numeric string)"),
            });
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// The provider's conventional default region. Buckets created without a
    /// location constraint land here.
    pub const DEFAULT: &str = "us-east-1";

    /// Standard code for the legacy `EU` location constraint.
    pub const EU: &str = "eu-west-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Resolve a bucket location constraint into a region.
    ///
    /// An absent or empty constraint means the default region; the legacy
    /// `EU` constraint means `eu-west-1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustack_bootstrap_core::types::AwsRegion;
    ///
    /// assert_eq!(AwsRegion::from_location_constraint(None).as_str(), "us-east-1");
    /// assert_eq!(AwsRegion::from_location_constraint(Some("EU")).as_str(), "eu-west-1");
    /// assert_eq!(AwsRegion::from_location_constraint(Some("ap-south-1")).as_str(), "ap-south-1");
    /// ```
    #[must_use]
    pub fn from_location_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            None | Some("") => Self::default(),
            Some("EU") => Self::new(Self::EU),
            Some(other) => Self::new(other),
        }
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the default region, which must be created without an
    /// explicit location constraint.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    /// ARN partition the region belongs to.
    #[must_use]
    pub fn partition(&self) -> &'static str {
        if self.0.starts_with("cn-") {
            "aws-cn"
        } else if self.0.starts_with("us-gov-") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The verified identity behind the provider session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Account that owns the credentials.
    pub account: AccountId,
    /// ARN of the calling principal, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Unique id of the calling principal, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A bucket tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key, unique within a tag set.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a tag.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Default server-side encryption for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EncryptionSpec {
    /// SSE-S3: keys managed by the storage service.
    ServerManagedAes256,
    /// SSE-KMS with the given key id, ARN or alias.
    KeyManagedService {
        /// KMS key reference.
        key_id: String,
    },
}

impl EncryptionSpec {
    /// Algorithm name for SSE-S3.
    pub const AES256: &str = "AES256";

    /// Algorithm name for SSE-KMS.
    pub const AWS_KMS: &str = "aws:kms";

    /// Pick SSE-KMS when a key id is given, SSE-S3 otherwise.
    #[must_use]
    pub fn from_kms_key_id(key_id: Option<String>) -> Self {
        match key_id {
            Some(key_id) if !key_id.is_empty() => Self::KeyManagedService { key_id },
            _ => Self::ServerManagedAes256,
        }
    }

    /// The provider's algorithm name.
    #[must_use]
    pub fn sse_algorithm(&self) -> &'static str {
        match self {
            Self::ServerManagedAes256 => Self::AES256,
            Self::KeyManagedService { .. } => Self::AWS_KMS,
        }
    }

    /// The KMS key reference, for SSE-KMS.
    #[must_use]
    pub fn kms_key_id(&self) -> Option<&str> {
        match self {
            Self::ServerManagedAes256 => None,
            Self::KeyManagedService { key_id } => Some(key_id),
        }
    }

    /// Whether an S3 Bucket Key must be enabled alongside this configuration.
    #[must_use]
    pub fn bucket_key_enabled(&self) -> bool {
        matches!(self, Self::KeyManagedService { .. })
    }

    /// Short label for reports, e.g. `SSE-KMS (alias/tf)`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::ServerManagedAes256 => "SSE-S3".to_owned(),
            Self::KeyManagedService { key_id } => format!("SSE-KMS ({key_id})"),
        }
    }
}

/// Whether a bucket name exists and who controls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OwnershipStatus {
    /// No bucket with this name exists.
    NotExists,
    /// The bucket exists and the caller can access it.
    ExistsOwnedByCaller,
    /// The bucket exists but belongs to another account or is otherwise
    /// inaccessible.
    ExistsNotAccessible,
}

/// Result of ensuring a bucket exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnsureDecision {
    /// The bucket was created by this call.
    Created,
    /// The caller already owned the bucket in the requested region.
    AlreadyOwnedSameRegion,
}

/// Public access block settings.
///
/// AWS defines exactly four boolean fields for this configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlock {
    /// Reject requests that grant public ACLs.
    pub block_public_acls: bool,
    /// Ignore existing public ACLs.
    pub ignore_public_acls: bool,
    /// Reject bucket policies that grant public access.
    pub block_public_policy: bool,
    /// Restrict access to buckets with public policies.
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    /// Every public access path blocked.
    pub const ALL_BLOCKED: Self = Self {
        block_public_acls: true,
        ignore_public_acls: true,
        block_public_policy: true,
        restrict_public_buckets: true,
    };

    /// Whether all four controls are enabled.
    #[must_use]
    pub fn is_fully_blocked(&self) -> bool {
        *self == Self::ALL_BLOCKED
    }
}

/// Object ownership mode applied to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectOwnership {
    /// ACLs are disabled and the bucket owner owns every object.
    BucketOwnerEnforced,
}

impl ObjectOwnership {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BucketOwnerEnforced => "BucketOwnerEnforced",
        }
    }
}

impl fmt::Display for ObjectOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
