//! # Reconciler
//!
//! The single-shot decision core. Given a validated desired state and the
//! set of certificates currently in the store, issue at most one corrective
//! action and report whether anything changed.
//!
//! Nothing is cached between invocations and there is no optimistic
//! concurrency control: a concurrent external mutation of the same Name tag
//! can still produce duplicates, which a later run then refuses to touch.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::NAME_TAG_KEY;
use crate::matcher::{find_certificates, CertificateSelector};
use crate::pem::pem_compare;
use crate::provider::{CertificateRecord, CertificateStore};
use crate::request::{CertificateState, PresentCertificate};

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Malformed request declaration. Detected before any remote call.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// More than one remote certificate carries the idempotency tag. The
    /// operator must delete or retag the duplicates; guessing here would
    /// mask whatever mistake created them.
    #[error("More than one certificate with Name={name_tag} exists in this region")]
    AmbiguousNameTag {
        name_tag: String,
        matches: Vec<CertificateRecord>,
    },

    /// A matched record violates an assumption the matcher guarantees
    #[error("Internal error: {0}")]
    InternalInvariant(String),

    /// An absent run failed partway through its deletions. Records removed
    /// before the failure stay removed; nothing is rolled back.
    #[error("Deletion failed after removing {} of {} certificates: {source}", deleted.len(), targeted.len())]
    PartialDeletion {
        deleted: Vec<String>,
        targeted: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    /// Transport or authorization failure from the certificate store,
    /// propagated unchanged
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Caller-facing result of a present reconciliation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCertificate {
    /// The arn of the certificate now matching the declaration
    pub arn: String,
    /// The domain name encoded within the public certificate
    pub domain_name: String,
}

/// What the invocation did
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReconcileOutcome {
    /// The certificate now exists remotely as declared
    Applied {
        changed: bool,
        certificate: AppliedCertificate,
    },
    /// Every certificate matching the selector is gone
    Deleted { changed: bool, arns: Vec<String> },
}

impl ReconcileOutcome {
    /// Whether a mutating call was issued
    pub fn changed(&self) -> bool {
        match self {
            ReconcileOutcome::Applied { changed, .. }
            | ReconcileOutcome::Deleted { changed, .. } => *changed,
        }
    }
}

/// The reconciliation core. Stateless between invocations; every run
/// re-reads the remote inventory before deciding.
pub struct Reconciler<'a> {
    store: &'a dyn CertificateStore,
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn CertificateStore) -> Self {
        Self { store }
    }

    /// Run one reconciliation.
    ///
    /// Issues at most one mutating call for a present state, and one delete
    /// per matched record for an absent state.
    pub async fn reconcile(
        &self,
        state: CertificateState,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        match state {
            CertificateState::Present(desired) => self.apply_present(desired).await,
            CertificateState::Absent(selector) => self.apply_absent(selector).await,
        }
    }

    async fn apply_present(
        &self,
        desired: PresentCertificate,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let selector = CertificateSelector::NameTag(desired.name_tag.clone());
        let matched = find_certificates(self.store, &selector).await?;
        debug!(
            count = matched.len(),
            name_tag = desired.name_tag,
            "Matched existing certificates by Name tag"
        );

        if matched.len() > 1 {
            return Err(ReconcileError::AmbiguousNameTag {
                name_tag: desired.name_tag,
                matches: matched,
            });
        }

        let tags = HashMap::from([(NAME_TAG_KEY.to_string(), desired.name_tag.clone())]);

        if let Some(existing) = matched.into_iter().next() {
            self.update_existing(desired, existing, &tags).await
        } else {
            self.create_new(desired, &tags).await
        }
    }

    async fn create_new(
        &self,
        desired: PresentCertificate,
        tags: &HashMap<String, String>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        info!(
            name_tag = desired.name_tag,
            "No existing certificate, importing a new one"
        );
        let arn = self
            .store
            .import(
                &desired.certificate,
                desired.private_key.expose(),
                desired.certificate_chain.as_deref(),
                None,
                tags,
            )
            .await?;
        let domain_name = self.store.get_domain(&arn).await?;
        Ok(ReconcileOutcome::Applied {
            changed: true,
            certificate: AppliedCertificate { arn, domain_name },
        })
    }

    async fn update_existing(
        &self,
        desired: PresentCertificate,
        existing: CertificateRecord,
        tags: &HashMap<String, String>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // The matcher filtered on this tag; a mismatch means the match set
        // cannot be trusted
        if existing.tags.get(NAME_TAG_KEY) != Some(&desired.name_tag) {
            return Err(ReconcileError::InternalInvariant(format!(
                "matched certificate {} does not carry Name={}",
                existing.certificate_arn, desired.name_tag
            )));
        }
        let Some(existing_body) = existing.certificate.as_deref() else {
            return Err(ReconcileError::InternalInvariant(format!(
                "matched certificate {} has no certificate body",
                existing.certificate_arn
            )));
        };

        let mut same = pem_compare(Some(existing_body), Some(&desired.certificate));
        match desired.certificate_chain.as_deref() {
            Some(chain) => {
                same &= pem_compare(existing.certificate_chain.as_deref(), Some(chain));
            }
            None => {
                // ACM echoes the leaf certificate as the chain when none was
                // supplied at import time
                same &= pem_compare(
                    existing.certificate_chain.as_deref(),
                    Some(&desired.certificate),
                );
            }
        }

        if same {
            debug!(
                arn = existing.certificate_arn,
                "Existing certificate is identical, doing nothing"
            );
            let domain_name = self.store.get_domain(&existing.certificate_arn).await?;
            return Ok(ReconcileOutcome::Applied {
                changed: false,
                certificate: AppliedCertificate {
                    arn: existing.certificate_arn,
                    domain_name,
                },
            });
        }

        info!(
            arn = existing.certificate_arn,
            "Existing certificate differs, overwriting in place"
        );
        let arn = self
            .store
            .import(
                &desired.certificate,
                desired.private_key.expose(),
                desired.certificate_chain.as_deref(),
                Some(&existing.certificate_arn),
                tags,
            )
            .await?;
        let domain_name = self.store.get_domain(&arn).await?;
        Ok(ReconcileOutcome::Applied {
            changed: true,
            certificate: AppliedCertificate { arn, domain_name },
        })
    }

    async fn apply_absent(
        &self,
        selector: CertificateSelector,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let matched = find_certificates(self.store, &selector).await?;
        let targeted: Vec<String> = matched
            .iter()
            .map(|record| record.certificate_arn.clone())
            .collect();

        let mut deleted = Vec::new();
        for arn in &targeted {
            if let Err(e) = self.store.delete(arn).await {
                return Err(ReconcileError::PartialDeletion {
                    deleted,
                    targeted: targeted.clone(),
                    source: e,
                });
            }
            deleted.push(arn.clone());
        }

        let changed = !targeted.is_empty();
        if changed {
            info!(count = targeted.len(), "Deleted matching certificates");
        } else {
            debug!("No matching certificates, nothing to delete");
        }
        Ok(ReconcileOutcome::Deleted {
            changed,
            arns: targeted,
        })
    }
}
