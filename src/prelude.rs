//! # Prelude
//!
//! Re-exports commonly used types and functions for convenience.
//!
//! ```rust
//! use acm_certificate_sync::prelude::*;
//! ```

pub use crate::constants::NAME_TAG_KEY;
pub use crate::matcher::{find_certificates, CertificateSelector};
pub use crate::pem::{normalize, pem_compare};
pub use crate::provider::aws::{AcmCertificateStore, StoreConfig};
pub use crate::provider::{CertificateRecord, CertificateStore};
pub use crate::reconciler::{AppliedCertificate, ReconcileError, ReconcileOutcome, Reconciler};
pub use crate::request::{
    CertificateState, DesiredState, PresentCertificate, PrivateKeyPem, ReconcileRequest,
};
