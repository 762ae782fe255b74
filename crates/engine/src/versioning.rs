//! Template versioning service.
//!
//! Thin orchestration over the store's transactional compound
//! operations: friendly up-front checks, structured logging, and a
//! listing view. The authoritative checks run again inside the store's
//! transaction.

use std::sync::Arc;

use serde::Serialize;

use siteforge_core::error::CoreError;
use siteforge_core::store::{TemplateStore, VersionCreated, VersionSnapshot};
use siteforge_core::template::TemplateRecord;
use siteforge_core::version;

/// A template's version history.
#[derive(Debug, Clone, Serialize)]
pub struct VersionListing {
    pub template: TemplateRecord,
    /// Snapshots, newest first.
    pub versions: Vec<VersionSnapshot>,
}

pub struct VersioningService {
    store: Arc<dyn TemplateStore>,
}

impl VersioningService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Snapshot the live code under `new_version` and advance the live
    /// version field.
    pub async fn create_version(
        &self,
        ident: &str,
        new_version: &str,
    ) -> Result<VersionCreated, CoreError> {
        // Reject malformed input before opening a transaction.
        let next = version::parse_version(new_version)?;

        if let Some(current) = self.store.get_by_ident(ident).await? {
            version::ensure_version_increases(&current.version, &next)?;
        }

        let created = self.store.snapshot_and_advance(ident, new_version).await?;
        tracing::info!(
            template = %created.template.slug,
            version = %created.template.version,
            "Created template version",
        );
        Ok(created)
    }

    /// Restore the live template from the snapshot at `target_version`.
    pub async fn rollback(
        &self,
        ident: &str,
        target_version: &str,
    ) -> Result<TemplateRecord, CoreError> {
        version::parse_version(target_version)?;

        let restored = self.store.restore_snapshot(ident, target_version).await?;
        tracing::info!(
            template = %restored.slug,
            version = %restored.version,
            "Rolled template back",
        );
        Ok(restored)
    }

    /// The template plus its snapshots, newest first.
    pub async fn list_versions(&self, ident: &str) -> Result<VersionListing, CoreError> {
        let template = self
            .store
            .get_by_ident(ident)
            .await?
            .ok_or_else(|| CoreError::not_found("Template", ident))?;
        let versions = self.store.list_snapshots(template.id).await?;
        Ok(VersionListing { template, versions })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryTemplateStore, FALLBACK_HERO_SLUG};

    fn service() -> (Arc<MemoryTemplateStore>, VersioningService) {
        let store = Arc::new(MemoryTemplateStore::with_builtin_library());
        (store.clone(), VersioningService::new(store))
    }

    // -- create_version -------------------------------------------------------

    #[tokio::test]
    async fn create_advances_live_version() {
        let (_, service) = service();
        let created = service
            .create_version(FALLBACK_HERO_SLUG, "1.1.0")
            .await
            .unwrap();
        assert_eq!(created.template.version, "1.1.0");
    }

    #[tokio::test]
    async fn create_rejects_malformed_version() {
        let (_, service) = service();
        let err = service
            .create_version(FALLBACK_HERO_SLUG, "not-a-version")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_decrease_before_transaction() {
        let (_, service) = service();
        let err = service
            .create_version(FALLBACK_HERO_SLUG, "0.1.0")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    // -- list_versions --------------------------------------------------------

    #[tokio::test]
    async fn listing_returns_snapshots_newest_first() {
        let (_, service) = service();
        service
            .create_version(FALLBACK_HERO_SLUG, "1.1.0")
            .await
            .unwrap();
        service
            .create_version(FALLBACK_HERO_SLUG, "1.2.0")
            .await
            .unwrap();

        let listing = service.list_versions(FALLBACK_HERO_SLUG).await.unwrap();
        assert_eq!(listing.template.version, "1.2.0");
        assert_eq!(listing.versions.len(), 2);
    }

    #[tokio::test]
    async fn listing_unknown_template_is_not_found() {
        let (_, service) = service();
        let err = service.list_versions("nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
