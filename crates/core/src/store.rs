//! Template store traits and version-snapshot types.
//!
//! The engine is wired against these traits: `siteforge-db` provides the
//! PostgreSQL implementation, the engine crate's `MemoryTemplateStore`
//! provides an in-memory one (used as the fallback library, as a
//! degraded-mode store, and as the test double). The compound version
//! operations are transactional in the implementation; their ordering
//! and conflict checks must be re-run under the transaction's lock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::template::TemplateRecord;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A stored copy of a template's code/schema at a specific version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub template_id: DbId,
    pub version: String,
    pub code: String,
    pub schema_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Result of a successful version-create: the advanced live template
/// plus the snapshot written for the new version.
#[derive(Debug, Clone, Serialize)]
pub struct VersionCreated {
    pub template: TemplateRecord,
    pub snapshot: VersionSnapshot,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistent template store keyed by id or slug.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Look up a template by numeric id or by slug.
    async fn get_by_ident(&self, ident: &str) -> Result<Option<TemplateRecord>, CoreError>;

    /// Look up a template by slug only.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<TemplateRecord>, CoreError>;

    /// Load every template record (summary projection source).
    async fn list_records(&self) -> Result<Vec<TemplateRecord>, CoreError>;

    /// Look up one version snapshot for a template.
    async fn get_snapshot(
        &self,
        template_id: DbId,
        version: &str,
    ) -> Result<Option<VersionSnapshot>, CoreError>;

    /// List all snapshots for a template, newest first.
    async fn list_snapshots(&self, template_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError>;

    /// Atomically snapshot the live code under `new_version` and advance
    /// the live version field.
    ///
    /// Runs in a single transaction. Inside it the implementation must
    /// re-verify that `new_version` has no existing snapshot (conflict)
    /// and compares strictly greater than the live version.
    async fn snapshot_and_advance(
        &self,
        ident: &str,
        new_version: &str,
    ) -> Result<VersionCreated, CoreError>;

    /// Atomically restore the live template from the snapshot at
    /// `target_version`, snapshotting the pre-rollback live state first
    /// when it has no snapshot of its own.
    ///
    /// Runs in a single transaction; this is the only sanctioned way a
    /// template's version decreases.
    async fn restore_snapshot(
        &self,
        ident: &str,
        target_version: &str,
    ) -> Result<TemplateRecord, CoreError>;
}

/// Always-available in-memory template lookup, consulted by the
/// composer when the persistent store fails or lacks a slug.
#[async_trait]
pub trait FallbackTemplates: Send + Sync {
    async fn get_by_slug(&self, slug: &str) -> Option<TemplateRecord>;
}
