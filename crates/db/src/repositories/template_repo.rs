//! Repository for the `templates` table.

use sqlx::PgPool;

use siteforge_core::types::DbId;

use crate::models::template::TemplateRow;

/// Column list for templates queries.
pub(crate) const COLUMNS: &str = "id, slug, name, kind, engine, version, schema_json, \
    tokens_json, code, tags, description, created_at, updated_at";

/// Provides read and update operations for templates.
///
/// The planning engine never inserts templates; import and authoring
/// flows own creation.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Find a template by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a template by its unique slug.
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE slug = $1");
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find a template by id-or-slug identifier.
    ///
    /// A numeric identifier is treated as an id; anything else as a slug.
    pub async fn find_by_ident(
        pool: &PgPool,
        ident: &str,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        match ident.parse::<DbId>() {
            Ok(id) => Self::find_by_id(pool, id).await,
            Err(_) => Self::find_by_slug(pool, ident).await,
        }
    }

    /// Load every template row, oldest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates ORDER BY id");
        sqlx::query_as::<_, TemplateRow>(&query).fetch_all(pool).await
    }
}
