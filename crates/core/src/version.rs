//! Semantic-version parsing and ordering rules for template snapshots.
//!
//! Versions are `MAJOR.MINOR.PATCH[-prerelease]` with SemVer precedence:
//! numeric fields compare numerically, a release compares greater than
//! any prerelease of the same numeric triple, and prerelease identifiers
//! follow SemVer ordering. These checks run both up-front (friendly
//! errors) and inside the store transaction (authoritative under lock).

use semver::Version;

use crate::error::CoreError;

/// Parse a semantic-version string, rejecting malformed input with a
/// caller-facing validation error.
pub fn parse_version(raw: &str) -> Result<Version, CoreError> {
    Version::parse(raw).map_err(|e| {
        CoreError::Validation(format!("'{raw}' is not a valid semantic version: {e}"))
    })
}

/// Ensure `next` compares strictly greater than the template's current
/// version. A current version that fails to parse is an internal error:
/// the store should never hold one.
pub fn ensure_version_increases(current: &str, next: &Version) -> Result<(), CoreError> {
    let current = Version::parse(current).map_err(|e| {
        CoreError::Internal(format!("Stored version '{current}' is not valid semver: {e}"))
    })?;

    if *next > current {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Version {next} does not increase the current version {current}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
