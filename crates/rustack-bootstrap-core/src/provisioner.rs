//! The bucket provisioning state machine.
//!
//! A [`Provisioner`] is bound to a provider session whose identity has been
//! verified, a region, and an [`EventSink`]. Its operations are individually
//! idempotent; [`Provisioner::provision`] runs them in the fixed order:
//!
//! ```text
//! ensure bucket -> encryption -> public access block -> ownership controls
//!               -> TLS-only policy -> tags -> ready
//! ```
//!
//! Any failure stops the sequence. Steps that already succeeded are not
//! rolled back; they are returned in the [`ProvisionFailure`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::BucketApi;
use crate::error::{BootstrapError, BootstrapResult, ProviderError};
use crate::event::{EventSink, RecordingSink, Step, StepOutcome, StepRecord};
use crate::plan::ProvisionPlan;
use crate::policy::PolicyDocument;
use crate::types::{
    AwsRegion, CallerIdentity, EncryptionSpec, EnsureDecision, ObjectOwnership, OwnershipStatus,
    PublicAccessBlock, Tag,
};
use crate::validation::BucketName;

/// Provider code returned when another account already holds the name.
const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";

/// Provider code returned when the caller already holds the name.
const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";

/// Outcome of a completed provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    /// The provisioned bucket.
    pub bucket: BucketName,
    /// Whether the bucket was created or already present.
    pub decision: EnsureDecision,
    /// Every step of the run, in order.
    pub records: Vec<StepRecord>,
}

/// A provisioning run that stopped part-way.
///
/// `completed` lists the steps that were applied before `step` failed; the
/// bucket is left in exactly that state.
#[derive(Debug, thiserror::Error)]
#[error("{step} step failed")]
pub struct ProvisionFailure {
    /// The step that failed.
    pub step: Step,
    /// Steps applied before the failure.
    pub completed: Vec<StepRecord>,
    /// Why the step failed.
    #[source]
    pub error: BootstrapError,
}

/// Forwards each record to two sinks.
struct TeeSink {
    primary: Arc<dyn EventSink>,
    secondary: RecordingSink,
}

impl EventSink for TeeSink {
    fn record(&self, record: &StepRecord) {
        self.primary.record(record);
        self.secondary.record(record);
    }
}

/// Creates and hardens buckets through a [`BucketApi`].
#[derive(Clone)]
pub struct Provisioner {
    api: Arc<dyn BucketApi>,
    region: AwsRegion,
    profile: Option<String>,
    identity: CallerIdentity,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Verify the caller identity and bind a provisioner to `region`.
    ///
    /// Emits a [`Step::VerifyIdentity`] record on success.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::IdentityResolution`] if credentials cannot be
    /// resolved or the identity cannot be confirmed. No bucket operation is
    /// possible without a verified identity.
    pub async fn connect(
        api: Arc<dyn BucketApi>,
        region: AwsRegion,
        profile: Option<String>,
        sink: Arc<dyn EventSink>,
    ) -> BootstrapResult<Self> {
        let identity = api
            .caller_identity()
            .await
            .map_err(|e| BootstrapError::IdentityResolution {
                message: e.to_string(),
            })?;

        debug!(account = %identity.account, arn = ?identity.arn, "AWS credentials verified");

        let provisioner = Self {
            api,
            region,
            profile,
            identity,
            sink,
        };
        provisioner.emit(
            "",
            Step::VerifyIdentity,
            StepOutcome::IdentityVerified {
                identity: provisioner.identity.clone(),
                region: provisioner.region.clone(),
                profile: provisioner.profile.clone(),
            },
        );
        Ok(provisioner)
    }

    /// The verified caller identity.
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// The region this provisioner is bound to.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// A copy of this provisioner that reports to a different sink.
    #[must_use]
    pub fn with_sink(&self, sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }

    fn emit(&self, bucket: &str, step: Step, outcome: StepOutcome) {
        self.sink.record(&StepRecord {
            bucket: bucket.to_owned(),
            step,
            outcome,
        });
    }

    /// Probe whether a bucket exists and whether the caller can reach it.
    ///
    /// Not-found responses mean [`OwnershipStatus::NotExists`]; forbidden or
    /// redirect responses mean [`OwnershipStatus::ExistsNotAccessible`].
    ///
    /// # Errors
    ///
    /// Any other provider failure is returned as [`BootstrapError::Provider`].
    pub async fn resolve_ownership(&self, bucket: &BucketName) -> BootstrapResult<OwnershipStatus> {
        match self.api.head_bucket(bucket.as_str()).await {
            Ok(()) => Ok(OwnershipStatus::ExistsOwnedByCaller),
            Err(e) if e.is_not_found() => Ok(OwnershipStatus::NotExists),
            Err(e) if e.is_access_denied() || e.is_redirect() => {
                debug!(bucket = %bucket, error = %e, "bucket exists but is not accessible");
                Ok(OwnershipStatus::ExistsNotAccessible)
            }
            Err(e) => Err(BootstrapError::Provider {
                operation: "head_bucket",
                source: e,
            }),
        }
    }

    /// The region an existing, accessible bucket lives in.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the location lookup fails.
    pub async fn resolve_region(&self, bucket: &BucketName) -> BootstrapResult<AwsRegion> {
        let constraint = self
            .api
            .get_bucket_location(bucket.as_str())
            .await
            .map_err(|e| BootstrapError::from_provider("get_bucket_location", e))?;
        Ok(AwsRegion::from_location_constraint(constraint.as_deref()))
    }

    /// Make sure the bucket exists in `desired`, creating it if needed.
    ///
    /// Ownership is resolved before region, so a bucket held by another
    /// account is always reported as an ownership conflict. `desired` goes
    /// through the same location-constraint mapping as the bucket's actual
    /// region, so the legacy `EU` code means `eu-west-1`.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::OwnershipConflict`] if the name belongs to another
    ///   account.
    /// - [`BootstrapError::RegionConflict`] if the caller owns the bucket in a
    ///   different region.
    /// - Wrapped provider errors otherwise.
    pub async fn ensure_bucket(
        &self,
        bucket: &BucketName,
        desired: &AwsRegion,
    ) -> BootstrapResult<EnsureDecision> {
        let desired = AwsRegion::from_location_constraint(Some(desired.as_str()));
        match self.resolve_ownership(bucket).await? {
            OwnershipStatus::ExistsNotAccessible => Err(BootstrapError::OwnershipConflict {
                bucket: bucket.to_string(),
            }),
            OwnershipStatus::NotExists => self.create_bucket(bucket, &desired).await,
            OwnershipStatus::ExistsOwnedByCaller => self.check_owned_region(bucket, &desired).await,
        }
    }

    async fn create_bucket(
        &self,
        bucket: &BucketName,
        desired: &AwsRegion,
    ) -> BootstrapResult<EnsureDecision> {
        let location_constraint = (!desired.is_default()).then(|| desired.as_str());

        match self
            .api
            .create_bucket(bucket.as_str(), location_constraint)
            .await
        {
            Ok(()) => {}
            Err(e) if e.code.as_deref() == Some(BUCKET_ALREADY_EXISTS) => {
                return Err(BootstrapError::OwnershipConflict {
                    bucket: bucket.to_string(),
                });
            }
            Err(e) if e.code.as_deref() == Some(BUCKET_ALREADY_OWNED_BY_YOU) => {
                debug!(bucket = %bucket, "bucket appeared between probe and create");
                return self.check_owned_region(bucket, desired).await;
            }
            Err(e) => return Err(BootstrapError::from_provider("create_bucket", e)),
        }

        info!(bucket = %bucket, region = %desired, "bucket created");
        self.emit(
            bucket.as_str(),
            Step::EnsureBucket,
            StepOutcome::BucketCreated {
                region: desired.clone(),
            },
        );
        Ok(EnsureDecision::Created)
    }

    async fn check_owned_region(
        &self,
        bucket: &BucketName,
        desired: &AwsRegion,
    ) -> BootstrapResult<EnsureDecision> {
        let actual = self.resolve_region(bucket).await?;
        if actual != *desired {
            return Err(BootstrapError::RegionConflict {
                bucket: bucket.to_string(),
                actual,
                requested: desired.clone(),
            });
        }

        self.emit(
            bucket.as_str(),
            Step::EnsureBucket,
            StepOutcome::BucketAlreadyOwned { region: actual },
        );
        Ok(EnsureDecision::AlreadyOwnedSameRegion)
    }

    /// Set default server-side encryption, replacing any prior configuration.
    ///
    /// SSE-KMS is always applied with an S3 Bucket Key enabled.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the call is rejected.
    pub async fn apply_encryption(
        &self,
        bucket: &BucketName,
        encryption: &EncryptionSpec,
    ) -> BootstrapResult<()> {
        self.api
            .put_bucket_encryption(bucket.as_str(), encryption)
            .await
            .map_err(|e| BootstrapError::from_provider("put_bucket_encryption", e))?;

        debug!(bucket = %bucket, encryption = %encryption.label(), "put_bucket_encryption completed");
        self.emit(
            bucket.as_str(),
            Step::Encryption,
            StepOutcome::EncryptionApplied {
                encryption: encryption.clone(),
            },
        );
        Ok(())
    }

    /// Enable all four public access block controls in one call.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the call is rejected.
    pub async fn block_public_access(&self, bucket: &BucketName) -> BootstrapResult<()> {
        self.api
            .put_public_access_block(bucket.as_str(), PublicAccessBlock::ALL_BLOCKED)
            .await
            .map_err(|e| BootstrapError::from_provider("put_public_access_block", e))?;

        debug!(bucket = %bucket, "put_public_access_block completed");
        self.emit(
            bucket.as_str(),
            Step::PublicAccessBlock,
            StepOutcome::PublicAccessBlocked,
        );
        Ok(())
    }

    /// Set object ownership to `BucketOwnerEnforced`, disabling ACLs.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the call is rejected.
    pub async fn enforce_ownership_control(&self, bucket: &BucketName) -> BootstrapResult<()> {
        self.api
            .put_bucket_ownership_controls(bucket.as_str(), ObjectOwnership::BucketOwnerEnforced)
            .await
            .map_err(|e| BootstrapError::from_provider("put_bucket_ownership_controls", e))?;

        debug!(bucket = %bucket, "put_bucket_ownership_controls completed");
        self.emit(
            bucket.as_str(),
            Step::OwnershipControls,
            StepOutcome::OwnershipEnforced,
        );
        Ok(())
    }

    /// Replace the bucket policy with the TLS-only policy when `enforce` is
    /// set; otherwise leave the policy untouched.
    ///
    /// The replacement discards every existing statement.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the call is rejected.
    pub async fn enforce_transport_security(
        &self,
        bucket: &BucketName,
        enforce: bool,
    ) -> BootstrapResult<()> {
        if !enforce {
            self.emit(
                bucket.as_str(),
                Step::TransportSecurity,
                StepOutcome::TransportSecuritySkipped,
            );
            return Ok(());
        }

        let policy = PolicyDocument::deny_insecure_transport(bucket.as_str(), &self.region)
            .to_json()
            .map_err(|e| BootstrapError::Provider {
                operation: "put_bucket_policy",
                source: ProviderError::new(format!(
                    "failed to serialize bucket policy: {e}"
                )),
            })?;

        self.api
            .put_bucket_policy(bucket.as_str(), &policy)
            .await
            .map_err(|e| BootstrapError::from_provider("put_bucket_policy", e))?;

        debug!(bucket = %bucket, "put_bucket_policy completed");
        self.emit(
            bucket.as_str(),
            Step::TransportSecurity,
            StepOutcome::TransportSecurityEnforced,
        );
        Ok(())
    }

    /// Replace the bucket tag set with `tags`. An empty slice leaves the
    /// existing tags untouched.
    ///
    /// # Errors
    ///
    /// Returns the wrapped provider error if the call is rejected.
    pub async fn apply_tags(&self, bucket: &BucketName, tags: &[Tag]) -> BootstrapResult<()> {
        if tags.is_empty() {
            self.emit(bucket.as_str(), Step::Tagging, StepOutcome::TagsSkipped);
            return Ok(());
        }

        self.api
            .put_bucket_tagging(bucket.as_str(), tags)
            .await
            .map_err(|e| BootstrapError::from_provider("put_bucket_tagging", e))?;

        debug!(bucket = %bucket, count = tags.len(), "put_bucket_tagging completed");
        self.emit(
            bucket.as_str(),
            Step::Tagging,
            StepOutcome::TagsApplied {
                tags: tags.to_vec(),
            },
        );
        Ok(())
    }

    /// Report that every step for the bucket completed.
    pub fn report_ready(&self, bucket: &BucketName) {
        info!(bucket = %bucket, "bucket is ready");
        self.emit(bucket.as_str(), Step::Ready, StepOutcome::Ready);
    }

    /// Run the whole sequence for `plan`.
    ///
    /// Records go to this provisioner's sink as each step completes, and are
    /// also returned in the report (or in the failure, for the steps that
    /// completed before it).
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionFailure`] naming the failed step.
    pub async fn provision(&self, plan: &ProvisionPlan) -> Result<ProvisionReport, ProvisionFailure> {
        let recorder = RecordingSink::new();
        let run = self.with_sink(Arc::new(TeeSink {
            primary: Arc::clone(&self.sink),
            secondary: recorder.clone(),
        }));
        let bucket = &plan.bucket;

        let fail = |step: Step, error: BootstrapError| ProvisionFailure {
            step,
            completed: recorder.records(),
            error,
        };

        let decision = run
            .ensure_bucket(bucket, &plan.region)
            .await
            .map_err(|e| fail(Step::EnsureBucket, e))?;
        run.apply_encryption(bucket, &plan.encryption)
            .await
            .map_err(|e| fail(Step::Encryption, e))?;
        run.block_public_access(bucket)
            .await
            .map_err(|e| fail(Step::PublicAccessBlock, e))?;
        run.enforce_ownership_control(bucket)
            .await
            .map_err(|e| fail(Step::OwnershipControls, e))?;
        run.enforce_transport_security(bucket, plan.enforce_tls)
            .await
            .map_err(|e| fail(Step::TransportSecurity, e))?;
        run.apply_tags(bucket, &plan.tags)
            .await
            .map_err(|e| fail(Step::Tagging, e))?;
        run.report_ready(bucket);

        Ok(ProvisionReport {
            bucket: bucket.clone(),
            decision,
            records: recorder.records(),
        })
    }
}
