//! Shared test support: an in-memory certificate store double and PEM
//! fixtures generated with rcgen.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use acm_certificate_sync::prelude::*;

/// What the fake store keeps per certificate
#[derive(Debug, Clone)]
pub struct StoredCertificate {
    pub certificate: Option<String>,
    pub certificate_chain: Option<String>,
    pub tags: HashMap<String, String>,
    pub domain_name: String,
}

/// In-memory stand-in for ACM.
///
/// Reproduces the behaviors the reconciler depends on: arbitrary duplicate
/// certificates, the leaf certificate echoed as the chain when none is
/// supplied at import, and idempotent deletes. Mutating calls are counted so
/// tests can assert that none were issued.
pub struct InMemoryCertificateStore {
    records: RwLock<HashMap<String, StoredCertificate>>,
    next_id: AtomicUsize,
    import_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_deletes_after: AtomicUsize,
    default_domain: String,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            import_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_deletes_after: AtomicUsize::new(usize::MAX),
            default_domain: "acm.example.com".to_string(),
        }
    }

    /// Make every delete after the first `n` fail, to exercise partial
    /// deletion failures
    pub fn fail_deletes_after(&self, n: usize) {
        self.fail_deletes_after.store(n, Ordering::SeqCst);
    }

    fn allocate_arn(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!(
            "arn:aws:acm:ap-southeast-2:123456789012:certificate/{id:08}-abcd-abcd-abcd-012345678901"
        )
    }

    /// Seed a record directly, bypassing import bookkeeping
    pub async fn seed(&self, stored: StoredCertificate) -> String {
        let arn = self.allocate_arn();
        self.records.write().await.insert(arn.clone(), stored);
        arn
    }

    pub async fn contains(&self, arn: &str) -> bool {
        self.records.read().await.contains_key(arn)
    }

    pub async fn stored(&self, arn: &str) -> Option<StoredCertificate> {
        self.records.read().await.get(arn).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub fn import_calls(&self) -> usize {
        self.import_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn mutating_calls(&self) -> usize {
        self.import_calls() + self.delete_calls()
    }

    fn record_from(arn: &str, stored: &StoredCertificate) -> CertificateRecord {
        CertificateRecord {
            certificate_arn: arn.to_string(),
            certificate: stored.certificate.clone(),
            certificate_chain: stored.certificate_chain.clone(),
            tags: stored.tags.clone(),
            domain_name: Some(stored.domain_name.clone()),
        }
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn list_records(&self) -> Result<Vec<CertificateRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|(arn, stored)| Self::record_from(arn, stored))
            .collect())
    }

    async fn get_record(&self, arn: &str) -> Result<Option<CertificateRecord>> {
        let records = self.records.read().await;
        Ok(records.get(arn).map(|stored| Self::record_from(arn, stored)))
    }

    async fn get_domain(&self, arn: &str) -> Result<String> {
        let records = self.records.read().await;
        records
            .get(arn)
            .map(|stored| stored.domain_name.clone())
            .with_context(|| format!("no certificate {arn}"))
    }

    async fn import(
        &self,
        certificate: &str,
        _private_key: &str,
        certificate_chain: Option<&str>,
        arn: Option<&str>,
        tags: &HashMap<String, String>,
    ) -> Result<String> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        // ACM echoes the leaf as the chain when no chain is supplied
        let chain = certificate_chain.unwrap_or(certificate).to_string();
        let mut records = self.records.write().await;
        match arn {
            Some(existing) => {
                let stored = records
                    .get_mut(existing)
                    .with_context(|| format!("cannot overwrite missing certificate {existing}"))?;
                stored.certificate = Some(certificate.to_string());
                stored.certificate_chain = Some(chain);
                stored.tags.extend(tags.clone());
                Ok(existing.to_string())
            }
            None => {
                let new_arn = self.allocate_arn();
                records.insert(
                    new_arn.clone(),
                    StoredCertificate {
                        certificate: Some(certificate.to_string()),
                        certificate_chain: Some(chain),
                        tags: tags.clone(),
                        domain_name: self.default_domain.clone(),
                    },
                );
                Ok(new_arn)
            }
        }
    }

    async fn delete(&self, arn: &str) -> Result<()> {
        let calls_so_far = self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if calls_so_far >= self.fail_deletes_after.load(Ordering::SeqCst) {
            anyhow::bail!("AccessDeniedException: simulated transport failure");
        }
        self.records.write().await.remove(arn);
        Ok(())
    }
}

/// A generated certificate plus its key, as PEM strings
#[derive(Debug, Clone)]
pub struct TestCertificate {
    pub certificate: String,
    pub private_key: String,
}

/// Generate an ephemeral self-signed certificate for the given domain
pub fn generate_certificate(domain: &str) -> TestCertificate {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec![domain.to_string()])
            .expect("certificate generation");
    TestCertificate {
        certificate: cert.pem(),
        private_key: key_pair.serialize_pem(),
    }
}

/// Tag map carrying only the reserved Name tag
pub fn name_tags(name: &str) -> HashMap<String, String> {
    HashMap::from([(NAME_TAG_KEY.to_string(), name.to_string())])
}

/// A seeded record as ACM would hold it after a chainless import
pub fn stored_with_leaf_echo(cert: &TestCertificate, name: &str, domain: &str) -> StoredCertificate {
    StoredCertificate {
        certificate: Some(cert.certificate.clone()),
        certificate_chain: Some(cert.certificate.clone()),
        tags: name_tags(name),
        domain_name: domain.to_string(),
    }
}

/// A present-state request declaration for the given certificate
pub fn present_request(
    cert: &TestCertificate,
    name_tag: &str,
    chain: Option<&str>,
) -> ReconcileRequest {
    ReconcileRequest {
        state: DesiredState::Present,
        certificate: Some(cert.certificate.clone()),
        certificate_chain: chain.map(ToString::to_string),
        name_tag: Some(name_tag.to_string()),
        private_key: Some(PrivateKeyPem::new(cert.private_key.clone())),
        ..Default::default()
    }
}

/// An absent-state request declaration with no selector set
pub fn absent_request() -> ReconcileRequest {
    ReconcileRequest {
        state: DesiredState::Absent,
        ..Default::default()
    }
}
