//! # AWS Provider
//!
//! SDK configuration for the ACM-backed certificate store.

use anyhow::Result;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use regex::Regex;
use tracing::info;

mod acm;

pub use acm::AcmCertificateStore;

/// Connection settings for the certificate store
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// AWS region to operate in. Falls back to the SDK's default resolution
    /// (environment, shared config, instance metadata) when unset.
    pub region: Option<String>,
}

/// Build the AWS SDK config using the default credential chain
pub async fn load_sdk_config(config: &StoreConfig) -> Result<SdkConfig> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        validate_aws_region(region)?;
        info!("Using explicit AWS region: {}", region);
        loader = loader.region(Region::new(region.clone()));
    }
    Ok(loader.load().await)
}

/// Validate an AWS region code against the official region formats.
/// Supports standard regions (us-east-1) and special regions
/// (us-gov-west-1, us-iso-east-1, cn-north-1).
/// Reference: https://docs.aws.amazon.com/general/latest/gr/rande.html
pub fn validate_aws_region(region: &str) -> Result<()> {
    let region_trimmed = region.trim().to_lowercase();

    if region_trimmed.is_empty() {
        return Err(anyhow::anyhow!("AWS region cannot be empty"));
    }

    let patterns = [
        // Standard: [a-z]{2}-[a-z]+-[0-9]+ (e.g., us-east-1, ap-southeast-2)
        r"^[a-z]{2}-[a-z]+-\d+$",
        // Gov: [a-z]{2}-gov-[a-z]+-[0-9]+ (e.g., us-gov-west-1)
        r"^[a-z]{2}-gov-[a-z]+-\d+$",
        // ISO: [a-z]{2}-iso[a-z]?-[a-z]+-[0-9]+ (e.g., us-iso-east-1, us-isob-east-1)
        r"^[a-z]{2}-iso[a-z]?-[a-z]+-\d+$",
        // China: cn-[a-z]+-[0-9]+ (e.g., cn-north-1)
        r"^cn-[a-z]+-\d+$",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern)
            .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
        if re.is_match(&region_trimmed) {
            return Ok(());
        }
    }

    Err(anyhow::anyhow!(
        "AWS region '{region}' must be a valid region code (e.g. 'us-east-1', 'ap-southeast-2', 'us-gov-west-1', 'cn-north-1'). See: https://docs.aws.amazon.com/general/latest/gr/rande.html"
    ))
}
