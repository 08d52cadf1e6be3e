//! Semantic version comparison for release tags.
//!
//! Release tags are usually written `v1.2.3`. A tag is accepted when, after
//! trimming whitespace and dropping a single leading `v`, it is a strict
//! `MAJOR.MINOR.PATCH[-pre][+build]` version.

use crate::error::{Result, UpdaterError};
use semver::Version;

/// Parse a release tag into a [`Version`]. Returns `None` for non-semver tags.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let trimmed = tag.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).ok()
}

/// Returns `true` if `tag` is a valid semantic version tag.
pub fn is_valid_tag(tag: &str) -> bool {
    parse_tag(tag).is_some()
}

/// Returns `true` if `current` is greater than or equal to `candidate`.
///
/// # Errors
///
/// Returns [`UpdaterError::Version`] if either side is not a valid version.
pub fn is_up_to_date(current: &str, candidate: &str) -> Result<bool> {
    let current_version = parse_tag(current)
        .ok_or_else(|| UpdaterError::Version(format!("invalid current version: {current:?}")))?;
    let candidate_version = parse_tag(candidate)
        .ok_or_else(|| UpdaterError::Version(format!("invalid release version: {candidate:?}")))?;
    Ok(current_version >= candidate_version)
}
