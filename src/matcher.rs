//! # Certificate Matcher
//!
//! Resolves which certificates currently exist remotely for a given
//! selector. Read-only; all mutation decisions happen in the reconciler.

use anyhow::Result;
use tracing::debug;

use crate::constants::NAME_TAG_KEY;
use crate::provider::{CertificateRecord, CertificateStore};

/// Identifies the remote certificates a request refers to.
///
/// An arn selects at most one record. A domain name or Name tag may select
/// several, since ACM permits duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSelector {
    /// The store's own identifier
    Arn(String),
    /// The domain name encoded in the public certificate
    DomainName(String),
    /// The value of the reserved "Name" tag
    NameTag(String),
}

/// Find all certificates in the operating region matching the selector.
///
/// An arn that does not exist in this region yields an empty set: there is
/// nothing to act on, which is not an error. Transport and authorization
/// failures from the store surface unchanged.
pub async fn find_certificates(
    store: &dyn CertificateStore,
    selector: &CertificateSelector,
) -> Result<Vec<CertificateRecord>> {
    let matched: Vec<CertificateRecord> = match selector {
        CertificateSelector::Arn(arn) => store.get_record(arn).await?.into_iter().collect(),
        CertificateSelector::DomainName(domain) => store
            .list_records()
            .await?
            .into_iter()
            .filter(|record| record.domain_name.as_deref() == Some(domain.as_str()))
            .collect(),
        CertificateSelector::NameTag(name_tag) => store
            .list_records()
            .await?
            .into_iter()
            .filter(|record| record.tags.get(NAME_TAG_KEY) == Some(name_tag))
            .collect(),
    };

    debug!(count = matched.len(), "Found corresponding certificates");
    Ok(matched)
}
