//! # Constants
//!
//! Shared constants used throughout the tool.

/// Reserved tag key carrying a certificate's logical name.
///
/// ACM allows arbitrary duplicate certificates for the same domain; this tag
/// is the sole idempotency key imposed on top of that.
pub const NAME_TAG_KEY: &str = "Name";

/// Default tracing filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "acmsync=info,acm_certificate_sync=info";
