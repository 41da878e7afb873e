//! Command-line arguments.

use clap::{Parser, ValueEnum};
use rustack_bootstrap_core::BootstrapConfig;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per completed step.
    #[default]
    Text,
    /// A single JSON document once the run ends.
    Json,
}

/// Create a best-practice S3 bucket.
///
/// Flags override the `AWS_REGION`, `AWS_PROFILE`, `AWS_ENDPOINT_URL` and
/// `LOG_LEVEL` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "rustack-bootstrap")]
#[command(version)]
pub struct Cli {
    /// S3 bucket name.
    #[arg(long)]
    pub bucket_name: String,

    /// AWS region for the bucket (default: us-east-1).
    #[arg(long)]
    pub region: Option<String>,

    /// AWS CLI profile name to use.
    #[arg(long)]
    pub profile: Option<String>,

    /// KMS key ID or alias for SSE-KMS encryption.
    #[arg(long)]
    pub kms_key_id: Option<String>,

    /// Optional tags as key=value pairs.
    #[arg(long, num_args = 0.., value_name = "KEY=VALUE")]
    pub tags: Vec<String>,

    /// Skip enforcing TLS-only access on the bucket.
    #[arg(long)]
    pub skip_tls_enforcement: bool,

    /// S3-compatible endpoint URL (uses path-style addressing).
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Log level filter (`RUST_LOG` takes precedence).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Layer the flags that were given on top of `config`.
    pub fn apply_to(&self, config: &mut BootstrapConfig) {
        config.bucket_name.clone_from(&self.bucket_name);
        if let Some(region) = &self.region {
            config.region.clone_from(region);
        }
        if self.profile.is_some() {
            config.profile.clone_from(&self.profile);
        }
        if self.kms_key_id.is_some() {
            config.kms_key_id.clone_from(&self.kms_key_id);
        }
        config.tags.clone_from(&self.tags);
        if self.skip_tls_enforcement {
            config.enforce_tls = false;
        }
        if self.endpoint_url.is_some() {
            config.endpoint_url.clone_from(&self.endpoint_url);
        }
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rustack-bootstrap").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_should_require_bucket_name() {
        assert!(Cli::try_parse_from(["rustack-bootstrap"]).is_err());
    }

    #[test]
    fn test_should_parse_minimal_invocation() {
        let cli = parse(&["--bucket-name", "tf-state"]);
        assert_eq!(cli.bucket_name, "tf-state");
        assert!(cli.tags.is_empty());
        assert!(!cli.skip_tls_enforcement);
        assert_eq!(cli.output, OutputFormat::Text);

        let mut config = BootstrapConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.bucket_name, "tf-state");
        assert_eq!(config.region, "us-east-1");
        assert!(config.enforce_tls);
    }

    #[test]
    fn test_should_collect_multiple_tags() {
        let cli = parse(&[
            "--bucket-name",
            "tf-state",
            "--tags",
            "env=dev",
            "owner=platform",
            "--skip-tls-enforcement",
        ]);
        assert_eq!(cli.tags, vec!["env=dev".to_owned(), "owner=platform".to_owned()]);
        assert!(cli.skip_tls_enforcement);
    }

    #[test]
    fn test_should_accept_tags_flag_without_values() {
        let cli = parse(&["--bucket-name", "tf-state", "--tags"]);
        assert!(cli.tags.is_empty());
    }

    #[test]
    fn test_should_override_environment_layer() {
        let cli = parse(&[
            "--bucket-name",
            "tf-state",
            "--region",
            "eu-west-1",
            "--kms-key-id",
            "alias/tf",
            "--skip-tls-enforcement",
            "--output",
            "json",
            "--log-level",
            "debug",
        ]);
        let mut config = BootstrapConfig::builder()
            .region("us-west-2")
            .profile("from-env")
            .endpoint_url("http://localhost:4566")
            .build();
        cli.apply_to(&mut config);

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.profile.as_deref(), Some("from-env"));
        assert_eq!(config.kms_key_id.as_deref(), Some("alias/tf"));
        assert!(!config.enforce_tls);
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(cli.output, OutputFormat::Json);
    }
}
