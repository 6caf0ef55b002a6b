//! # acmsync
//!
//! Command-line entry point. The caller declares the desired certificate
//! (or its absence) and the tool reports what it changed as JSON on stdout.
//!
//! ## Usage
//!
//! ```bash
//! # upload a self-signed certificate
//! acmsync --certificate cert.pem --private-key key.pem \
//!     --name-tag my_cert --region ap-southeast-2
//!
//! # create/update a certificate with a chain
//! acmsync --certificate cert.pem --private-key key.pem \
//!     --certificate-chain chain.pem --name-tag my_cert --region ap-southeast-2
//!
//! # delete the certificate we just created
//! acmsync --state absent --name-tag my_cert --region ap-southeast-2
//!
//! # delete by ARN, or every certificate for a domain
//! acmsync --state absent --certificate-arn arn:aws:acm:... --region ap-southeast-2
//! acmsync --state absent --domain-name acm.example.com --region ap-southeast-2
//!
//! # declarative request document instead of individual flags
//! acmsync --file request.yaml --region ap-southeast-2
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::error;

use acm_certificate_sync::constants::DEFAULT_LOG_FILTER;
use acm_certificate_sync::prelude::*;

/// Idempotent upload, update and deletion of certificates in AWS
/// Certificate Manager
#[derive(Parser, Debug)]
#[command(name = "acmsync", version)]
struct Cli {
    /// Desired state of the certificate
    #[arg(long, value_enum, default_value = "present")]
    state: StateArg,

    /// Path to the PEM encoded public certificate body
    #[arg(long, value_name = "FILE")]
    certificate: Option<PathBuf>,

    /// Path to the PEM encoded private key
    #[arg(long, value_name = "FILE")]
    private_key: Option<PathBuf>,

    /// Path to the PEM encoded certificate chain
    #[arg(long, value_name = "FILE")]
    certificate_chain: Option<PathBuf>,

    /// Unique identifier, applied as the certificate's "Name" tag
    #[arg(long)]
    name_tag: Option<String>,

    /// ARN of a certificate to delete
    #[arg(long)]
    certificate_arn: Option<String>,

    /// Domain name of certificates to delete
    #[arg(long)]
    domain_name: Option<String>,

    /// AWS region (defaults to the SDK's resolution, e.g. AWS_REGION)
    #[arg(long)]
    region: Option<String>,

    /// YAML request document; replaces the individual declaration flags
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = [
            "state",
            "certificate",
            "private_key",
            "certificate_chain",
            "name_tag",
            "certificate_arn",
            "domain_name",
        ]
    )]
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for DesiredState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => DesiredState::Present,
            StateArg::Absent => DesiredState::Absent,
        }
    }
}

fn read_pem(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read PEM file {}", path.display()))?;
    Ok(Some(body))
}

fn build_request(cli: &Cli) -> Result<ReconcileRequest> {
    if let Some(file) = &cli.file {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read request file {}", file.display()))?;
        return serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse request file {}", file.display()));
    }

    Ok(ReconcileRequest {
        state: cli.state.into(),
        certificate: read_pem(cli.certificate.as_deref())?,
        certificate_arn: cli.certificate_arn.clone(),
        certificate_chain: read_pem(cli.certificate_chain.as_deref())?,
        domain_name: cli.domain_name.clone(),
        name_tag: cli.name_tag.clone(),
        private_key: read_pem(cli.private_key.as_deref())?.map(PrivateKeyPem::new),
    })
}

async fn run(cli: Cli) -> Result<ReconcileOutcome> {
    let request = build_request(&cli)?;
    let state = request.validate()?;

    let store_config = StoreConfig {
        region: cli.region.clone(),
    };
    let store = AcmCertificateStore::new(&store_config).await?;

    Ok(Reconciler::new(&store).reconcile(state).await?)
}

fn render_outcome(outcome: &ReconcileOutcome) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
}

/// One failure object per invocation. Ambiguity failures additionally carry
/// the conflicting records so the operator can resolve them.
fn render_failure(error: &anyhow::Error) -> String {
    let mut failure = json!({ "error": format!("{error:#}") });
    if let Some(ReconcileError::AmbiguousNameTag { matches, .. }) =
        error.downcast_ref::<ReconcileError>()
    {
        failure["certificates"] = serde_json::to_value(matches).unwrap_or_default();
    }
    serde_json::to_string_pretty(&failure)
        .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", format!("{error:#}")))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(outcome) => {
            println!("{}", render_outcome(&outcome));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            println!("{}", render_failure(&e));
            ExitCode::FAILURE
        }
    }
}
