//! Revision strings as reported by the daemon.
//!
//! The daemon encodes revisions as one marker character followed by decimal
//! digits (`x42` for a locally side-loaded build). Ordering only makes sense
//! on the numeric part, so the marker is dropped before parsing.

use crate::error::CoreError;
use crate::types::Revision;

/// Strip exactly one leading character and parse the rest as base-10.
///
/// Returns [`CoreError::MalformedRevision`] if the input is empty or the
/// remainder is anything other than ASCII digits.
pub fn parse_revision(raw: &str) -> Result<Revision, CoreError> {
    let malformed = || CoreError::MalformedRevision {
        raw: raw.to_string(),
    };

    let mut chars = raw.chars();
    chars.next().ok_or_else(malformed)?;
    let digits = chars.as_str();

    // `u64::from_str` would accept a leading '+'.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    digits.parse::<u64>().map(Revision).map_err(|_| malformed())
}
