//! Structured step events.
//!
//! The provisioner never prints. Each completed step becomes a
//! [`StepRecord`] delivered to the [`EventSink`] it was constructed with;
//! rendering is the caller's business.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::types::{AwsRegion, CallerIdentity, EncryptionSpec, Tag};

/// A step of the provisioning sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Caller identity verification.
    VerifyIdentity,
    /// Existence, ownership and region resolution (and creation).
    EnsureBucket,
    /// Default server-side encryption.
    Encryption,
    /// Public access block.
    PublicAccessBlock,
    /// Object ownership enforcement.
    OwnershipControls,
    /// TLS-only bucket policy.
    TransportSecurity,
    /// Bucket tagging.
    Tagging,
    /// Final readiness report.
    Ready,
}

impl Step {
    /// Stable step name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VerifyIdentity => "verify-identity",
            Self::EnsureBucket => "ensure-bucket",
            Self::Encryption => "encryption",
            Self::PublicAccessBlock => "public-access-block",
            Self::OwnershipControls => "ownership-controls",
            Self::TransportSecurity => "transport-security",
            Self::Tagging => "tagging",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StepOutcome {
    /// Credentials resolved and the identity confirmed.
    IdentityVerified {
        /// The confirmed identity.
        identity: CallerIdentity,
        /// Region the session is bound to.
        region: AwsRegion,
        /// Named profile in use, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        profile: Option<String>,
    },
    /// The bucket did not exist and was created.
    BucketCreated {
        /// Region the bucket was created in.
        region: AwsRegion,
    },
    /// The caller already owned the bucket in the requested region.
    BucketAlreadyOwned {
        /// Region the bucket lives in.
        region: AwsRegion,
    },
    /// Default encryption configured.
    EncryptionApplied {
        /// The applied configuration.
        encryption: EncryptionSpec,
    },
    /// All four public access controls enabled.
    PublicAccessBlocked,
    /// Object ownership set to bucket-owner-enforced.
    OwnershipEnforced,
    /// The bucket policy was replaced with the TLS-only policy.
    TransportSecurityEnforced,
    /// TLS enforcement was not requested; the policy was left untouched.
    TransportSecuritySkipped,
    /// The tag set was replaced.
    TagsApplied {
        /// The new tag set.
        tags: Vec<Tag>,
    },
    /// No tags were given; existing tags were left untouched.
    TagsSkipped,
    /// Every step completed.
    Ready,
}

/// A completed step for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Bucket the step applied to. Empty for identity verification.
    pub bucket: String,
    /// Which step ran.
    pub step: Step,
    /// What it did.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Receiver of step records.
pub trait EventSink: Send + Sync {
    /// Called once per completed step, in order.
    fn record(&self, record: &StepRecord);
}

/// Sink that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<StepRecord>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records received so far.
    #[must_use]
    pub fn records(&self) -> Vec<StepRecord> {
        self.records.lock().clone()
    }

    /// The steps received so far, in order.
    #[must_use]
    pub fn steps(&self) -> Vec<Step> {
        self.records.lock().iter().map(|r| r.step).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, record: &StepRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Sink that turns each record into a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, record: &StepRecord) {
        info!(
            bucket = %record.bucket,
            step = %record.step,
            outcome = ?record.outcome,
            "provisioning step completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collect_records_in_order() {
        let sink = RecordingSink::new();
        for step in [Step::Encryption, Step::PublicAccessBlock] {
            sink.record(&StepRecord {
                bucket: "b1".to_owned(),
                step,
                outcome: StepOutcome::PublicAccessBlocked,
            });
        }
        assert_eq!(sink.steps(), vec![Step::Encryption, Step::PublicAccessBlock]);
    }

    #[test]
    fn test_should_share_records_between_clones() {
        let sink = RecordingSink::new();
        let clone = sink.clone();
        clone.record(&StepRecord {
            bucket: "b1".to_owned(),
            step: Step::Ready,
            outcome: StepOutcome::Ready,
        });
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_should_serialize_record_with_flattened_outcome() {
        let record = StepRecord {
            bucket: "b1".to_owned(),
            step: Step::Tagging,
            outcome: StepOutcome::TagsApplied {
                tags: vec![Tag::new("env", "dev")],
            },
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["bucket"], "b1");
        assert_eq!(value["step"], "tagging");
        assert_eq!(value["outcome"], "tagsApplied");
        assert_eq!(value["tags"][0]["key"], "env");
    }
}
