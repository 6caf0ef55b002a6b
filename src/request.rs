//! # Desired State
//!
//! The request declaration and its validation into a state the reconciler
//! can act on. All validation happens here, before any remote call.

use serde::Deserialize;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::matcher::CertificateSelector;
use crate::reconciler::ReconcileError;

/// PEM-encoded private key material.
///
/// Wiped from memory on drop and redacted from debug output.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct PrivateKeyPem(String);

impl PrivateKeyPem {
    pub fn new(pem: impl Into<String>) -> Self {
        Self(pem.into())
    }

    /// The raw PEM body, for handing to the certificate store
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for PrivateKeyPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKeyPem(***)")
    }
}

/// Desired presence of the certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// Raw request declaration, as supplied by flags or a YAML document.
///
/// Which fields must be present depends on `state`;
/// [`ReconcileRequest::validate`] turns a well-formed declaration into a
/// [`CertificateState`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub state: DesiredState,
    /// PEM body of the public certificate
    #[serde(default)]
    pub certificate: Option<String>,
    /// ARN of a certificate to delete
    #[serde(default)]
    pub certificate_arn: Option<String>,
    /// PEM body of the certificate chain
    #[serde(default)]
    pub certificate_chain: Option<String>,
    /// Domain name of certificates to delete
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Logical name, applied as the certificate's "Name" tag
    #[serde(default)]
    pub name_tag: Option<String>,
    /// PEM body of the private key
    #[serde(default)]
    pub private_key: Option<PrivateKeyPem>,
}

/// A validated declaration that a certificate must exist remotely
#[derive(Debug, Clone)]
pub struct PresentCertificate {
    pub certificate: String,
    pub certificate_chain: Option<String>,
    pub name_tag: String,
    pub private_key: PrivateKeyPem,
}

/// A validated request. The "exactly one selector" rule for deletion is
/// structural: an absent state carries a single [`CertificateSelector`].
#[derive(Debug, Clone)]
pub enum CertificateState {
    Present(PresentCertificate),
    Absent(CertificateSelector),
}

impl ReconcileRequest {
    /// Check argument requirements and produce the validated state.
    /// Fails fast; no remote call has been made at this point.
    pub fn validate(self) -> Result<CertificateState, ReconcileError> {
        match self.state {
            DesiredState::Present => self.validate_present(),
            DesiredState::Absent => self.validate_absent(),
        }
    }

    fn validate_present(self) -> Result<CertificateState, ReconcileError> {
        let certificate = self.certificate.filter(|c| !c.trim().is_empty()).ok_or_else(|| {
            ReconcileError::Validation(
                "'certificate' must be specified when 'state' is 'present'".to_string(),
            )
        })?;

        if self.certificate_arn.is_some() {
            return Err(ReconcileError::Validation(
                "'certificateArn' is only valid when 'state' is 'absent'".to_string(),
            ));
        }

        let name_tag = self.name_tag.filter(|n| !n.trim().is_empty()).ok_or_else(|| {
            ReconcileError::Validation(
                "'nameTag' must be specified when 'state' is 'present'".to_string(),
            )
        })?;

        let private_key = self.private_key.filter(|k| !k.is_blank()).ok_or_else(|| {
            ReconcileError::Validation(
                "'privateKey' must be specified when 'state' is 'present'".to_string(),
            )
        })?;

        if self.domain_name.is_some() {
            // The domain name is encoded within the certificate body
            warn!("'domainName' is ignored when 'state' is 'present'");
        }

        Ok(CertificateState::Present(PresentCertificate {
            certificate,
            certificate_chain: self.certificate_chain.filter(|c| !c.trim().is_empty()),
            name_tag,
            private_key,
        }))
    }

    fn validate_absent(self) -> Result<CertificateState, ReconcileError> {
        let mut selectors = Vec::new();
        if let Some(arn) = self.certificate_arn {
            selectors.push(CertificateSelector::Arn(arn));
        }
        if let Some(domain) = self.domain_name {
            selectors.push(CertificateSelector::DomainName(domain));
        }
        if let Some(name_tag) = self.name_tag {
            selectors.push(CertificateSelector::NameTag(name_tag));
        }

        if selectors.len() != 1 {
            return Err(ReconcileError::Validation(
                "when 'state' is 'absent' exactly one of 'nameTag', 'certificateArn' or 'domainName' must be specified"
                    .to_string(),
            ));
        }

        Ok(CertificateState::Absent(selectors.remove(0)))
    }
}
