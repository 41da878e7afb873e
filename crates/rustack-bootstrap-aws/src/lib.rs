//! AWS SDK provider adapter for rustack-bootstrap.
//!
//! [`AwsBucketApi`] implements
//! [`BucketApi`](rustack_bootstrap_core::BucketApi) with `aws-sdk-s3` for
//! bucket operations and `aws-sdk-sts` for identity verification.

mod client;
mod error;

pub use client::AwsBucketApi;
