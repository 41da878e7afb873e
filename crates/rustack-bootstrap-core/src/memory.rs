//! In-memory [`BucketApi`] implementation.
//!
//! [`InMemoryBucketApi`] behaves like a small S3 service: bucket names are
//! unique across every account sharing the same namespace, location
//! constraints are stored exactly as given at creation, and each `put_*`
//! call replaces the stored configuration. Handles created with
//! [`InMemoryBucketApi::for_account`] share the namespace but act as a
//! different caller, which is how ownership conflicts are exercised.
//!
//! Faults can be injected per handle: a failing identity lookup, access
//! denied for a named operation, or an arbitrary error for a named operation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::api::BucketApi;
use crate::error::ProviderError;
use crate::types::{
    AccountId, AwsRegion, CallerIdentity, EncryptionSpec, ObjectOwnership, PublicAccessBlock, Tag,
};

/// Default encryption as stored on a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEncryption {
    /// The encryption algorithm (`AES256` or `aws:kms`).
    pub sse_algorithm: String,
    /// KMS master key ID (only for `aws:kms`).
    pub kms_master_key_id: Option<String>,
    /// Whether an S3 Bucket Key is enabled for SSE-KMS.
    pub bucket_key_enabled: bool,
}

/// Snapshot of one bucket's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBucket {
    /// Owning account.
    pub owner: AccountId,
    /// Location constraint given at creation; `None` for the default region.
    pub location_constraint: Option<String>,
    /// Default encryption.
    pub encryption: Option<StoredEncryption>,
    /// Public access block settings.
    pub public_access_block: Option<PublicAccessBlock>,
    /// Object ownership controls.
    pub ownership: Option<ObjectOwnership>,
    /// Bucket policy (JSON string).
    pub policy: Option<String>,
    /// Bucket tags.
    pub tags: Vec<Tag>,
}

impl MemoryBucket {
    fn new(owner: AccountId, location_constraint: Option<String>) -> Self {
        Self {
            owner,
            location_constraint,
            encryption: None,
            public_access_block: None,
            ownership: None,
            policy: None,
            tags: Vec::new(),
        }
    }

    /// Region the bucket lives in.
    #[must_use]
    pub fn region(&self) -> AwsRegion {
        AwsRegion::from_location_constraint(self.location_constraint.as_deref())
    }
}

/// An in-memory S3-like provider acting as one account.
#[derive(Clone)]
pub struct InMemoryBucketApi {
    /// Bucket name to bucket state, shared by every handle of one namespace.
    buckets: Arc<DashMap<String, MemoryBucket>>,
    account: AccountId,
    identity_failure: Arc<RwLock<Option<ProviderError>>>,
    denied_operations: Arc<RwLock<HashSet<String>>>,
    failed_operations: Arc<RwLock<HashMap<String, ProviderError>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl std::fmt::Debug for InMemoryBucketApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBucketApi")
            .field("account", &self.account)
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryBucketApi {
    fn default() -> Self {
        Self::new(AccountId::default())
    }
}

impl InMemoryBucketApi {
    /// Create an empty namespace with a handle acting as `account`.
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            account,
            identity_failure: Arc::new(RwLock::new(None)),
            denied_operations: Arc::new(RwLock::new(HashSet::new())),
            failed_operations: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handle on the same namespace acting as another account, with its
    /// own faults and call log.
    #[must_use]
    pub fn for_account(&self, account: AccountId) -> Self {
        Self {
            buckets: Arc::clone(&self.buckets),
            ..Self::new(account)
        }
    }

    /// Make identity lookups fail with `error`.
    pub fn fail_identity(&self, error: ProviderError) {
        *self.identity_failure.write() = Some(error);
    }

    /// Reject `operation` (e.g. `"put_bucket_policy"`) with `AccessDenied`.
    pub fn deny(&self, operation: &str) {
        self.denied_operations.write().insert(operation.to_owned());
    }

    /// Make every call to `operation` fail with `error`.
    pub fn fail(&self, operation: &str, error: ProviderError) {
        self.failed_operations
            .write()
            .insert(operation.to_owned(), error);
    }

    /// Create a bucket owned by this handle's account without going through
    /// the provider call log.
    pub fn insert_bucket(&self, name: &str, location_constraint: Option<&str>) {
        self.buckets.insert(
            name.to_owned(),
            MemoryBucket::new(self.account.clone(), location_constraint.map(str::to_owned)),
        );
    }

    /// Snapshot of a bucket, if it exists.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<MemoryBucket> {
        self.buckets.get(name).map(|b| b.clone())
    }

    /// Provider operations called through this handle, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn begin(&self, operation: &str) -> Result<(), ProviderError> {
        self.calls.lock().push(operation.to_owned());
        if self.denied_operations.read().contains(operation) {
            return Err(access_denied());
        }
        if let Some(error) = self.failed_operations.read().get(operation) {
            return Err(error.clone());
        }
        Ok(())
    }

    /// Apply `update` to a bucket the caller owns.
    fn update_owned(
        &self,
        operation: &str,
        bucket: &str,
        update: impl FnOnce(&mut MemoryBucket),
    ) -> Result<(), ProviderError> {
        self.begin(operation)?;
        let mut entry = self.buckets.get_mut(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if entry.owner != self.account {
            return Err(access_denied());
        }
        update(entry.value_mut());
        debug!(bucket = %bucket, operation, "in-memory bucket updated");
        Ok(())
    }
}

fn no_such_bucket(bucket: &str) -> ProviderError {
    ProviderError::new(format!("The specified bucket does not exist: {bucket}"))
        .with_code("NoSuchBucket")
        .with_status(404)
}

fn access_denied() -> ProviderError {
    ProviderError::new("Access Denied")
        .with_code("AccessDenied")
        .with_status(403)
}

#[async_trait]
impl BucketApi for InMemoryBucketApi {
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        self.begin("get_caller_identity")?;
        if let Some(error) = self.identity_failure.read().clone() {
            return Err(error);
        }
        Ok(CallerIdentity {
            account: self.account.clone(),
            arn: Some(format!("arn:aws:iam::{}:root", self.account)),
            user_id: Some(self.account.to_string()),
        })
    }

    async fn head_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        self.begin("head_bucket")?;
        // HEAD responses carry no body, so only the status is reported.
        match self.buckets.get(bucket) {
            None => Err(ProviderError::new("Not Found").with_status(404)),
            Some(b) if b.owner != self.account => Err(ProviderError::new("Forbidden").with_status(403)),
            Some(_) => Ok(()),
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.begin("create_bucket")?;

        if location_constraint == Some(AwsRegion::DEFAULT) {
            return Err(ProviderError::new(
                "The specified location-constraint is not valid",
            )
            .with_code("InvalidLocationConstraint")
            .with_status(400));
        }

        if let Some(existing) = self.buckets.get(bucket) {
            let code = if existing.owner == self.account {
                "BucketAlreadyOwnedByYou"
            } else {
                "BucketAlreadyExists"
            };
            return Err(ProviderError::new("The requested bucket name is not available")
                .with_code(code)
                .with_status(409));
        }

        self.insert_bucket(bucket, location_constraint);
        debug!(bucket = %bucket, ?location_constraint, "in-memory bucket created");
        Ok(())
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ProviderError> {
        self.begin("get_bucket_location")?;
        let entry = self.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if entry.owner != self.account {
            return Err(access_denied());
        }
        Ok(entry.location_constraint.clone())
    }

    async fn put_bucket_encryption(
        &self,
        bucket: &str,
        encryption: &EncryptionSpec,
    ) -> Result<(), ProviderError> {
        let stored = StoredEncryption {
            sse_algorithm: encryption.sse_algorithm().to_owned(),
            kms_master_key_id: encryption.kms_key_id().map(str::to_owned),
            bucket_key_enabled: encryption.bucket_key_enabled(),
        };
        self.update_owned("put_bucket_encryption", bucket, |b| {
            b.encryption = Some(stored);
        })
    }

    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ProviderError> {
        self.update_owned("put_public_access_block", bucket, |b| {
            b.public_access_block = Some(config);
        })
    }

    async fn put_bucket_ownership_controls(
        &self,
        bucket: &str,
        ownership: ObjectOwnership,
    ) -> Result<(), ProviderError> {
        self.update_owned("put_bucket_ownership_controls", bucket, |b| {
            b.ownership = Some(ownership);
        })
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError> {
        serde_json::from_str::<serde_json::Value>(policy).map_err(|e| {
            ProviderError::new(format!("Policies must be valid JSON: {e}"))
                .with_code("MalformedPolicy")
                .with_status(400)
        })?;
        self.update_owned("put_bucket_policy", bucket, |b| {
            b.policy = Some(policy.to_owned());
        })
    }

    async fn put_bucket_tagging(&self, bucket: &str, tags: &[Tag]) -> Result<(), ProviderError> {
        self.update_owned("put_bucket_tagging", bucket, |b| {
            b.tags = tags.to_vec();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other_account() -> AccountId {
        AccountId::new("111122223333").unwrap()
    }

    #[tokio::test]
    async fn test_should_report_missing_bucket_as_404() {
        let api = InMemoryBucketApi::default();
        let err = api.head_bucket("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.code.is_none());
    }

    #[tokio::test]
    async fn test_should_hide_foreign_bucket_behind_403() {
        let api = InMemoryBucketApi::default();
        api.for_account(other_account()).insert_bucket("taken", None);

        let err = api.head_bucket("taken").await.unwrap_err();
        assert!(err.is_access_denied());

        let err = api.create_bucket("taken", None).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("BucketAlreadyExists"));
    }

    #[tokio::test]
    async fn test_should_reject_explicit_default_location_constraint() {
        let api = InMemoryBucketApi::default();
        let err = api.create_bucket("b1", Some("us-east-1")).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("InvalidLocationConstraint"));
        assert!(api.bucket("b1").is_none());
    }

    #[tokio::test]
    async fn test_should_store_location_constraint_verbatim() {
        let api = InMemoryBucketApi::default();
        api.create_bucket("b1", Some("eu-central-1")).await.unwrap();
        api.create_bucket("b2", None).await.unwrap();

        assert_eq!(
            api.get_bucket_location("b1").await.unwrap().as_deref(),
            Some("eu-central-1")
        );
        assert_eq!(api.get_bucket_location("b2").await.unwrap(), None);
        assert_eq!(api.bucket("b2").unwrap().region().as_str(), "us-east-1");
    }

    #[tokio::test]
    async fn test_should_deny_configured_operation() {
        let api = InMemoryBucketApi::default();
        api.insert_bucket("b1", None);
        api.deny("put_bucket_tagging");

        let err = api
            .put_bucket_tagging("b1", &[Tag::new("k", "v")])
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(api.bucket("b1").unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_should_fail_configured_operation_with_given_error() {
        let api = InMemoryBucketApi::default();
        api.fail(
            "head_bucket",
            ProviderError::new("We encountered an internal error")
                .with_code("InternalError")
                .with_status(500),
        );

        let err = api.head_bucket("b1").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("InternalError"));
        assert_eq!(err.status, Some(500));
        assert_eq!(api.calls(), vec!["head_bucket"]);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_policy() {
        let api = InMemoryBucketApi::default();
        api.insert_bucket("b1", None);
        let err = api.put_bucket_policy("b1", "{not json").await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("MalformedPolicy"));
    }

    #[tokio::test]
    async fn test_should_log_calls_per_handle() {
        let api = InMemoryBucketApi::default();
        let other = api.for_account(other_account());
        api.head_bucket("b1").await.unwrap_err();
        other.caller_identity().await.unwrap();

        assert_eq!(api.calls(), vec!["head_bucket".to_owned()]);
        assert_eq!(other.calls(), vec!["get_caller_identity".to_owned()]);
    }
}
