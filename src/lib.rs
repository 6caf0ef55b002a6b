//! # ACM Certificate Sync
//!
//! Idempotent upload, update and deletion of TLS certificates in AWS
//! Certificate Manager.
//!
//! ACM allows users to upload multiple certificates for the same domain
//! name, and even multiple identical certificates. This tool restricts such
//! freedoms so that a declared certificate can be applied repeatedly with
//! the same result, by attaching an AWS resource "Name" tag to every
//! certificate it imports:
//!
//! 1. **Declare** - the caller supplies a certificate body, private key,
//!    optional chain and a logical name (or a deletion selector)
//! 2. **Match** - the current ACM inventory is queried for certificates
//!    carrying that identity
//! 3. **Decide** - the reconciler picks one of no-op, create, overwrite in
//!    place, or delete, and issues at most one corrective action
//! 4. **Report** - the result (changed flag plus affected identities) is
//!    returned to the caller
//!
//! When several certificates already carry the same Name tag the run fails
//! rather than guessing which one was meant; the duplicates are reported
//! for the operator to resolve.
//!
//! This is a one-shot invocation, not a controller loop. Nothing is cached
//! between runs; every invocation re-reads the current remote state.

pub mod constants;
pub mod matcher;
pub mod pem;
pub mod prelude;
pub mod provider;
pub mod reconciler;
pub mod request;
