//! Bootstrap configuration.
//!
//! Provides [`BootstrapConfig`], the full set of inputs for one provisioning
//! run. Values are layered: built-in defaults, then environment variables
//! (via [`BootstrapConfig::from_env`]), then command-line flags applied by the
//! binary.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::AwsRegion;

/// Configuration for one provisioning run.
///
/// # Examples
///
/// ```
/// use rustack_bootstrap_core::config::BootstrapConfig;
///
/// let config = BootstrapConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert!(config.enforce_tls);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    /// Name of the bucket to provision.
    #[builder(default, setter(into))]
    pub bucket_name: String,

    /// Region the bucket must live in.
    #[builder(default = String::from(AwsRegion::DEFAULT), setter(into))]
    pub region: String,

    /// Named credentials profile.
    #[builder(default, setter(strip_option, into))]
    pub profile: Option<String>,

    /// KMS key id, ARN or alias. Selects SSE-KMS when set.
    #[builder(default, setter(strip_option, into))]
    pub kms_key_id: Option<String>,

    /// Raw `key=value` tag arguments.
    #[builder(default)]
    pub tags: Vec<String>,

    /// Whether to replace the bucket policy with the TLS-only policy.
    #[builder(default = true)]
    pub enforce_tls: bool,

    /// Custom S3-compatible endpoint (path-style addressing is used).
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Log level filter string (e.g. `"warn"`, `"debug"`).
    #[builder(default = String::from("warn"), setter(into))]
    pub log_level: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            region: String::from(AwsRegion::DEFAULT),
            profile: None,
            kms_key_id: None,
            tags: Vec::new(),
            enforce_tls: true,
            endpoint_url: None,
            log_level: String::from("warn"),
        }
    }
}

impl BootstrapConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION` | `us-east-1` |
    /// | `AWS_PROFILE` | *(unset)* |
    /// | `AWS_ENDPOINT_URL` | *(unset)* |
    /// | `LOG_LEVEL` | `warn` |
    ///
    /// # Examples
    ///
    /// ```
    /// use rustack_bootstrap_core::config::BootstrapConfig;
    ///
    /// let config = BootstrapConfig::from_env();
    /// assert!(!config.region.is_empty());
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = non_empty_var("AWS_REGION") {
            config.region = v;
        }
        if let Some(v) = non_empty_var("AWS_PROFILE") {
            config.profile = Some(v);
        }
        if let Some(v) = non_empty_var("AWS_ENDPOINT_URL") {
            config.endpoint_url = Some(v);
        }
        if let Some(v) = non_empty_var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The configured region.
    #[must_use]
    pub fn aws_region(&self) -> AwsRegion {
        AwsRegion::new(self.region.clone())
    }
}

/// Read an environment variable, treating an empty value as unset.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
