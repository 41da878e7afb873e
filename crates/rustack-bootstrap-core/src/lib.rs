//! Bucket provisioning and hardening for rustack-bootstrap.
//!
//! This crate holds everything that does not depend on a concrete provider
//! SDK:
//!
//! - Input validation (bucket names, `key=value` tags) in [`validation`].
//! - The [`BucketApi`] seam every provider adapter implements.
//! - The [`Provisioner`] state machine that creates a bucket and applies the
//!   hardening steps in a fixed order.
//! - Structured step events in [`event`].
//! - [`InMemoryBucketApi`], an in-process provider used by tests.

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod memory;
pub mod plan;
pub mod policy;
pub mod provisioner;
pub mod types;
pub mod validation;

pub use api::BucketApi;
pub use config::BootstrapConfig;
pub use error::{BootstrapError, BootstrapResult, ErrorKind, ProviderError};
pub use event::{EventSink, RecordingSink, Step, StepOutcome, StepRecord, TracingSink};
pub use memory::InMemoryBucketApi;
pub use plan::ProvisionPlan;
pub use provisioner::{ProvisionFailure, ProvisionReport, Provisioner};
pub use validation::BucketName;
