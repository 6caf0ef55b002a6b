//! # Certificate Store Providers
//!
//! Abstraction over the remote certificate service. The reconciler only
//! talks to the [`CertificateStore`] trait; the AWS ACM implementation lives
//! in [`aws`].

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A certificate resource as currently stored remotely.
///
/// Read-only to the reconciler: records are re-imported or deleted whole,
/// never mutated field by field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// The store's own opaque, stable identifier
    pub certificate_arn: String,
    /// PEM body of the public certificate, when the store can produce it
    /// (a certificate still being issued has none yet)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// PEM body of the stored chain. ACM echoes the leaf certificate here
    /// when the certificate was imported without a chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<String>,
    /// Resource tags attached to the record
    pub tags: HashMap<String, String>,
    /// Domain name encoded in the public certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

/// Provider trait for remote certificate stores
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Enumerate every certificate in the operating region, with tags and
    /// PEM bodies attached where the store can produce them.
    async fn list_records(&self) -> Result<Vec<CertificateRecord>>;

    /// Look up a single certificate by identifier.
    /// Returns `None` when no such identifier exists in this region.
    async fn get_record(&self, arn: &str) -> Result<Option<CertificateRecord>>;

    /// Resolve the domain name encoded in a stored certificate
    async fn get_domain(&self, arn: &str) -> Result<String>;

    /// Import a certificate. With `arn` the existing record is overwritten
    /// in place; without it a new record is created. Returns the record's
    /// arn. Tag semantics on overwrite are provider-defined.
    async fn import(
        &self,
        certificate: &str,
        private_key: &str,
        certificate_chain: Option<&str>,
        arn: Option<&str>,
        tags: &HashMap<String, String>,
    ) -> Result<String>;

    /// Delete a certificate. Deleting an identifier that no longer exists is
    /// not an error.
    async fn delete(&self, arn: &str) -> Result<()>;
}

// Provider implementations
pub mod aws;
