//! Shared primitive type aliases.

/// Database row identifier (BIGSERIAL).
pub type DbId = i64;

/// UTC timestamp used across models and snapshots.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
