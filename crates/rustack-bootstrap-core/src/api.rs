//! The storage and identity provider contract.
//!
//! [`BucketApi`] is the boundary between the provisioning state machine and
//! a concrete provider. The AWS SDK adapter lives in `rustack-bootstrap-aws`;
//! [`InMemoryBucketApi`](crate::memory::InMemoryBucketApi) implements it for
//! tests.
//!
//! # Object Safety
//!
//! The trait uses `#[async_trait]` so it can be held as `Arc<dyn BucketApi>`.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{CallerIdentity, EncryptionSpec, ObjectOwnership, PublicAccessBlock, Tag};

/// Operations the provisioner needs from the provider.
///
/// Implementations perform exactly one provider request per method and never
/// retry; retry policy belongs to the transport.
#[async_trait]
pub trait BucketApi: Send + Sync {
    /// Confirm the identity behind the configured credentials.
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError>;

    /// Low-cost existence probe (`HeadBucket`).
    async fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError>;

    /// Create a bucket. `location_constraint` is `None` for the default region.
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ProviderError>;

    /// The raw location constraint of a bucket, `None` when the provider
    /// reports none.
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ProviderError>;

    /// Replace the default server-side encryption configuration.
    async fn put_bucket_encryption(
        &self,
        bucket: &str,
        encryption: &EncryptionSpec,
    ) -> Result<(), ProviderError>;

    /// Replace the public access block configuration.
    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ProviderError>;

    /// Replace the object ownership controls.
    async fn put_bucket_ownership_controls(
        &self,
        bucket: &str,
        ownership: ObjectOwnership,
    ) -> Result<(), ProviderError>;

    /// Replace the bucket policy with the given JSON document.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError>;

    /// Replace the bucket tag set.
    async fn put_bucket_tagging(&self, bucket: &str, tags: &[Tag]) -> Result<(), ProviderError>;
}
