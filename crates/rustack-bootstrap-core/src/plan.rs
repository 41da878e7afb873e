//! Validated provisioning input.

use serde::Serialize;

use crate::config::BootstrapConfig;
use crate::error::BootstrapResult;
use crate::types::{AwsRegion, EncryptionSpec, Tag};
use crate::validation::{BucketName, parse_tags};

/// Everything a provisioning run needs, validated up front so that invalid
/// input never reaches the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionPlan {
    /// Target bucket.
    pub bucket: BucketName,
    /// Region the bucket must live in.
    pub region: AwsRegion,
    /// Default encryption to apply.
    pub encryption: EncryptionSpec,
    /// Whether to install the TLS-only bucket policy.
    pub enforce_tls: bool,
    /// Tags to apply; empty leaves existing tags alone.
    pub tags: Vec<Tag>,
}

impl ProvisionPlan {
    /// Validate a configuration into a plan.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::InvalidBucketName`](crate::error::BootstrapError::InvalidBucketName)
    /// or [`BootstrapError::InvalidTag`](crate::error::BootstrapError::InvalidTag).
    pub fn from_config(config: &BootstrapConfig) -> BootstrapResult<Self> {
        let bucket = BucketName::parse(config.bucket_name.clone())?;
        let tags = parse_tags(config.tags.as_slice())?;

        Ok(Self {
            bucket,
            region: config.aws_region(),
            encryption: EncryptionSpec::from_kms_key_id(config.kms_key_id.clone()),
            enforce_tls: config.enforce_tls,
            tags,
        })
    }
}
