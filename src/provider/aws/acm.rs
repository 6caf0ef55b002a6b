//! # ACM Certificate Store
//!
//! Implements [`CertificateStore`] against AWS Certificate Manager.
//!
//! ACM happily stores multiple certificates for the same domain, and even
//! multiple identical certificates. Idempotency is imposed one level up in
//! the reconciler; this layer is a faithful transport to the ACM API.
//! Listing the inventory costs one enumeration request plus one tag lookup
//! and one body fetch per certificate.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_acm::primitives::Blob;
use aws_sdk_acm::types::Tag;
use aws_sdk_acm::Client as AcmClient;
use tracing::{debug, info};

use crate::provider::{CertificateRecord, CertificateStore};

use super::{load_sdk_config, StoreConfig};

/// AWS Certificate Manager provider implementation
#[derive(Debug, Clone)]
pub struct AcmCertificateStore {
    client: AcmClient,
    region: String,
}

impl AcmCertificateStore {
    /// Create a new ACM client using the default credential chain
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let sdk_config = load_sdk_config(config).await?;
        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .context("No AWS region configured; pass --region or set AWS_REGION")?;
        let client = AcmClient::new(&sdk_config);
        Ok(Self { client, region })
    }

    /// Fetch the tags attached to one certificate
    async fn fetch_tags(&self, arn: &str) -> Result<HashMap<String, String>> {
        let response = self
            .client
            .list_tags_for_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .with_context(|| format!("Failed to list tags for certificate {arn}"))?;

        let mut tags = HashMap::new();
        for tag in response.tags.unwrap_or_default() {
            tags.insert(tag.key, tag.value.unwrap_or_default());
        }
        Ok(tags)
    }

    /// Fetch the PEM bodies for one certificate.
    /// A certificate that is still being issued has no body yet; that is
    /// reported as absent rather than as an error.
    async fn fetch_body(&self, arn: &str) -> Result<(Option<String>, Option<String>)> {
        match self
            .client
            .get_certificate()
            .certificate_arn(arn)
            .send()
            .await
        {
            Ok(response) => Ok((response.certificate, response.certificate_chain)),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_request_in_progress_exception()
                    || service_error.is_resource_not_found_exception()
                {
                    debug!(arn = arn, "Certificate has no retrievable body");
                    Ok((None, None))
                } else {
                    Err(anyhow::anyhow!(
                        "Failed to get certificate {arn}: {service_error}"
                    ))
                }
            }
        }
    }

    fn build_tags(tags: &HashMap<String, String>) -> Result<Vec<Tag>> {
        let mut built = Vec::with_capacity(tags.len());
        for (key, value) in tags {
            let tag = Tag::builder()
                .key(key.clone())
                .value(value.clone())
                .build()
                .with_context(|| format!("Invalid certificate tag '{key}'"))?;
            built.push(tag);
        }
        Ok(built)
    }
}

#[async_trait]
impl CertificateStore for AcmCertificateStore {
    async fn list_records(&self) -> Result<Vec<CertificateRecord>> {
        debug!(region = self.region, "Listing ACM certificates");

        let mut summaries = self
            .client
            .list_certificates()
            .into_paginator()
            .items()
            .send();

        let mut records = Vec::new();
        while let Some(summary) = summaries.next().await {
            let summary = summary.context("Failed to list ACM certificates")?;
            let Some(arn) = summary.certificate_arn else {
                continue;
            };
            let (certificate, certificate_chain) = self.fetch_body(&arn).await?;
            let tags = self.fetch_tags(&arn).await?;
            records.push(CertificateRecord {
                certificate_arn: arn,
                certificate,
                certificate_chain,
                tags,
                domain_name: summary.domain_name,
            });
        }

        debug!(
            region = self.region,
            count = records.len(),
            "Fetched ACM inventory"
        );
        Ok(records)
    }

    async fn get_record(&self, arn: &str) -> Result<Option<CertificateRecord>> {
        let detail = match self
            .client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
        {
            Ok(response) => response.certificate,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    debug!(arn = arn, "No certificate with this ARN in this region");
                    return Ok(None);
                }
                return Err(anyhow::anyhow!(
                    "Failed to describe certificate {arn}: {service_error}"
                ));
            }
        };

        let (certificate, certificate_chain) = self.fetch_body(arn).await?;
        let tags = self.fetch_tags(arn).await?;
        Ok(Some(CertificateRecord {
            certificate_arn: arn.to_string(),
            certificate,
            certificate_chain,
            tags,
            domain_name: detail.and_then(|d| d.domain_name),
        }))
    }

    async fn get_domain(&self, arn: &str) -> Result<String> {
        let response = self
            .client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .with_context(|| format!("Failed to describe certificate {arn}"))?;

        response
            .certificate
            .and_then(|detail| detail.domain_name)
            .with_context(|| format!("Certificate {arn} has no domain name"))
    }

    async fn import(
        &self,
        certificate: &str,
        private_key: &str,
        certificate_chain: Option<&str>,
        arn: Option<&str>,
        tags: &HashMap<String, String>,
    ) -> Result<String> {
        let mut request = self
            .client
            .import_certificate()
            .certificate(Blob::new(certificate.as_bytes()))
            .private_key(Blob::new(private_key.as_bytes()));

        if let Some(chain) = certificate_chain {
            request = request.certificate_chain(Blob::new(chain.as_bytes()));
        }

        match arn {
            Some(existing) => {
                // ACM rejects tags on re-import; they are re-asserted below
                info!(
                    region = self.region,
                    arn = existing,
                    "Overwriting ACM certificate in place"
                );
                request = request.certificate_arn(existing);
            }
            None => {
                info!(region = self.region, "Importing new ACM certificate");
                for tag in Self::build_tags(tags)? {
                    request = request.tags(tag);
                }
            }
        }

        let response = request
            .send()
            .await
            .context("Failed to import certificate into ACM")?;
        let imported_arn = response
            .certificate_arn
            .context("ACM returned no ARN for the imported certificate")?;

        if arn.is_some() && !tags.is_empty() {
            let mut tag_request = self
                .client
                .add_tags_to_certificate()
                .certificate_arn(&imported_arn);
            for tag in Self::build_tags(tags)? {
                tag_request = tag_request.tags(tag);
            }
            tag_request
                .send()
                .await
                .with_context(|| format!("Failed to tag certificate {imported_arn}"))?;
        }

        Ok(imported_arn)
    }

    async fn delete(&self, arn: &str) -> Result<()> {
        info!(region = self.region, arn = arn, "Deleting ACM certificate");
        match self
            .client
            .delete_certificate()
            .certificate_arn(arn)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    debug!(arn = arn, "Certificate already absent, nothing to delete");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "Failed to delete certificate {arn}: {service_error}"
                    ))
                }
            }
        }
    }
}
