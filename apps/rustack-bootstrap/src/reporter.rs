//! Rendering of step records for humans and machines.

use rustack_bootstrap_core::event::{EventSink, Step, StepOutcome, StepRecord};
use rustack_bootstrap_core::{BootstrapError, ProvisionFailure, ProvisionReport};
use serde::Serialize;

/// Console lines for one record.
#[must_use]
pub fn render(record: &StepRecord) -> Vec<String> {
    let bucket = &record.bucket;
    match &record.outcome {
        StepOutcome::IdentityVerified {
            region, profile, ..
        } => {
            let mut lines = vec![format!("Using region '{region}'.")];
            if let Some(profile) = profile {
                lines.push(format!("Using AWS profile '{profile}'."));
            }
            lines.push("AWS credentials verified.".to_owned());
            lines
        }
        StepOutcome::BucketCreated { .. } => vec![format!("Bucket '{bucket}' created.")],
        StepOutcome::BucketAlreadyOwned { .. } => vec![format!(
            "Bucket '{bucket}' already exists and is owned by this account."
        )],
        StepOutcome::EncryptionApplied { encryption } => {
            vec![format!("Encryption enabled: {}.", encryption.label())]
        }
        StepOutcome::PublicAccessBlocked => vec!["Public access blocked.".to_owned()],
        StepOutcome::OwnershipEnforced => vec!["Bucket ownership enforced.".to_owned()],
        StepOutcome::TransportSecurityEnforced => vec!["TLS-only access enforced.".to_owned()],
        StepOutcome::TransportSecuritySkipped => vec!["TLS-only access skipped.".to_owned()],
        StepOutcome::TagsApplied { tags } => {
            let summary = tags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            vec![format!("Tags applied: {summary}.")]
        }
        StepOutcome::TagsSkipped => vec!["No tags applied.".to_owned()],
        StepOutcome::Ready => vec![format!("Bucket '{bucket}' is ready.")],
    }
}

/// The single stderr line for a failed run, categorized by error kind when
/// the failure came from validation or provisioning.
#[must_use]
pub fn error_line(error: &anyhow::Error) -> String {
    if let Some(failure) = error.downcast_ref::<ProvisionFailure>() {
        return format!(
            "Error [{}]: {failure}: {}",
            failure.error.kind(),
            failure.error
        );
    }
    if let Some(error) = error.downcast_ref::<BootstrapError>() {
        return format!("Error [{}]: {error}", error.kind());
    }
    format!("Error: {error:#}")
}

/// Prints each record to stdout as it arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl EventSink for ConsoleReporter {
    fn record(&self, record: &StepRecord) {
        for line in render(record) {
            println!("\n{line}");
        }
    }
}

/// The document printed in JSON output mode.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JsonSummary<'a> {
    /// Every step completed.
    Ready {
        /// The full run.
        #[serde(flatten)]
        report: &'a ProvisionReport,
    },
    /// The run stopped.
    #[serde(rename_all = "camelCase")]
    Failed {
        /// Step that failed; absent when input validation failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<Step>,
        /// Error category.
        kind: &'static str,
        /// Error message.
        error: String,
        /// Steps applied before the failure.
        completed: &'a [StepRecord],
    },
}

impl<'a> JsonSummary<'a> {
    /// Summary of a run that stopped part-way.
    #[must_use]
    pub fn from_failure(failure: &'a ProvisionFailure) -> Self {
        Self::Failed {
            step: Some(failure.step),
            kind: failure.error.kind().as_str(),
            error: failure.error.to_string(),
            completed: &failure.completed,
        }
    }

    /// Summary of a run that stopped before provisioning started.
    #[must_use]
    pub fn from_error(step: Option<Step>, error: &BootstrapError) -> Self {
        Self::Failed {
            step,
            kind: error.kind().as_str(),
            error: error.to_string(),
            completed: &[],
        }
    }
}
