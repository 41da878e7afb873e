//! rustack-bootstrap - create an S3 bucket with a hardened baseline.
//!
//! Validates the bucket name and tags, verifies the caller identity, then
//! creates the bucket (or confirms the caller already owns it in the
//! requested region) and applies default encryption, a full public access
//! block, bucket-owner-enforced object ownership, a TLS-only bucket policy
//! and tags.
//!
//! # Usage
//!
//! ```text
//! rustack-bootstrap --bucket-name my-tf-state --region eu-west-1 \
//!     --kms-key-id alias/tf-state --tags env=prod owner=platform
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_REGION` | `us-east-1` | Region for the bucket |
//! | `AWS_PROFILE` | *(unset)* | Named credentials profile |
//! | `AWS_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! Exits with status 1 on any failure.

mod cli;
mod reporter;

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rustack_bootstrap_aws::AwsBucketApi;
use rustack_bootstrap_core::event::{EventSink, Step, TracingSink};
use rustack_bootstrap_core::{BootstrapConfig, ProvisionPlan, Provisioner};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OutputFormat};
use crate::reporter::{ConsoleReporter, JsonSummary, error_line};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = BootstrapConfig::from_env();
    cli.apply_to(&mut config);

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&config, cli.output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = %format!("{e:#}"), "bucket provisioning failed");
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over `log_level` when set. Colours are only used when
/// stderr is a terminal.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run(config: &BootstrapConfig, output: OutputFormat) -> Result<()> {
    let plan = match ProvisionPlan::from_config(config) {
        Ok(plan) => plan,
        Err(e) => {
            if output == OutputFormat::Json {
                print_json(&JsonSummary::from_error(None, &e))?;
            }
            return Err(e.into());
        }
    };

    info!(
        bucket = %plan.bucket,
        region = %plan.region,
        encryption = %plan.encryption.label(),
        enforce_tls = plan.enforce_tls,
        tags = plan.tags.len(),
        "provisioning bucket"
    );

    let sink: Arc<dyn EventSink> = match output {
        OutputFormat::Text => Arc::new(ConsoleReporter),
        OutputFormat::Json => Arc::new(TracingSink),
    };

    let api = AwsBucketApi::from_config(config).await;
    let provisioner = match Provisioner::connect(
        Arc::new(api),
        plan.region.clone(),
        config.profile.clone(),
        sink,
    )
    .await
    {
        Ok(provisioner) => provisioner,
        Err(e) => {
            if output == OutputFormat::Json {
                print_json(&JsonSummary::from_error(Some(Step::VerifyIdentity), &e))?;
            }
            return Err(e.into());
        }
    };

    match provisioner.provision(&plan).await {
        Ok(report) => {
            if output == OutputFormat::Json {
                print_json(&JsonSummary::Ready { report: &report })?;
            } else {
                println!();
            }
            Ok(())
        }
        Err(failure) => {
            if output == OutputFormat::Json {
                print_json(&JsonSummary::from_failure(&failure))?;
            }
            Err(failure.into())
        }
    }
}

fn print_json(summary: &JsonSummary<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize run summary")?;
    println!("{json}");
    Ok(())
}
