//! Template row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use siteforge_core::error::CoreError;
use siteforge_core::template::{EngineKind, TemplateKind, TemplateRecord};
use siteforge_core::types::{DbId, Timestamp};

/// A template row from the `templates` table.
///
/// `kind` and `engine` are kept as raw strings here; the `TryFrom`
/// conversion into [`TemplateRecord`] parses them, so an invalid stored
/// value surfaces as a `CoreError::Internal` instead of a decode panic.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TemplateRow {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub kind: String,
    pub engine: String,
    pub version: String,
    pub schema_json: Option<serde_json::Value>,
    pub tokens_json: Option<serde_json::Value>,
    pub code: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TemplateRow> for TemplateRecord {
    type Error = CoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let kind = TemplateKind::from_str_value(&row.kind)
            .map_err(|e| CoreError::Internal(format!("templates.id={}: {e}", row.id)))?;
        let engine = EngineKind::from_str_value(&row.engine)
            .map_err(|e| CoreError::Internal(format!("templates.id={}: {e}", row.id)))?;

        Ok(TemplateRecord {
            id: row.id,
            slug: row.slug,
            name: row.name,
            kind,
            engine,
            version: row.version,
            schema_json: row.schema_json,
            tokens_json: row.tokens_json,
            code: row.code,
            tags: row.tags,
            description: row.description,
            updated_at: row.updated_at,
        })
    }
}
