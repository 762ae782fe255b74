//! Repository for the `template_versions` table.

use sqlx::PgPool;

use siteforge_core::types::DbId;

use crate::models::template_version::TemplateVersionRow;

/// Column list for template_versions queries.
pub(crate) const COLUMNS: &str = "id, template_id, version, code, schema_json, created_at";

/// Provides read operations for version snapshots.
///
/// Writes happen only inside the store's version transactions; see
/// `crate::store::PgTemplateStore`.
pub struct TemplateVersionRepo;

impl TemplateVersionRepo {
    /// Find a specific snapshot by template and version string.
    pub async fn find_by_template_and_version(
        pool: &PgPool,
        template_id: DbId,
        version: &str,
    ) -> Result<Option<TemplateVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM template_versions
             WHERE template_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// List snapshots for a template, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<TemplateVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM template_versions
             WHERE template_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }
}
