//! # PEM Normalization
//!
//! Canonicalizes PEM-encoded text so certificate bodies can be compared for
//! equality despite formatting differences between encoders.

/// Normalize a PEM body for comparison.
///
/// Encoders differ in line wrapping, whitespace, letter case of the header
/// words and the number of dashes framing the header and footer. All of that
/// is stripped: whitespace removed, dash runs collapsed to a single dash, the
/// rest lowercased. The base64 payload characters are never altered, so two
/// distinct certificates cannot normalize to the same string. Treating two
/// identical certificates as different only costs an unnecessary overwrite;
/// the reverse must not happen.
pub fn normalize(pem: Option<&str>) -> String {
    let Some(pem) = pem else {
        return String::new();
    };

    let mut out = String::with_capacity(pem.len());
    let mut prev_dash = false;
    for c in pem.chars() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {}
            '-' => {
                // The payload never contains a dash, only the framing does
                if !prev_dash {
                    out.push('-');
                }
                prev_dash = true;
            }
            _ => {
                out.extend(c.to_lowercase());
                prev_dash = false;
            }
        }
    }
    out.trim().to_string()
}

/// Returns true if two PEM encoded strings carry the same content.
/// An absent body is equal only to another absent or empty body.
pub fn pem_compare(a: Option<&str>, b: Option<&str>) -> bool {
    normalize(a) == normalize(b)
}
