//! Path component hardening.
//!
//! Caller-supplied identifiers end up inside file name patterns, so they
//! must never be able to name anything outside the configured root.

use crate::error::{RelayError, RelayResult};

/// Reject identifiers that could escape the root directory.
///
/// Refuses empty values, path separators, NUL bytes and any `..` sequence.
pub fn ensure_safe_component(field: &str, value: &str) -> RelayResult<()> {
    if value.is_empty() {
        return Err(RelayError::bad_request(format!("ERROR- empty {}", field)));
    }
    if value.contains(['/', '\\', '\0']) || value.contains("..") {
        tracing::warn!(field, value, "Rejected unsafe path component");
        return Err(RelayError::bad_request(format!(
            "ERROR- invalid {} [{}]",
            field, value
        )));
    }
    Ok(())
}
