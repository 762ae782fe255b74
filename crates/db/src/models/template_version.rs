//! Template version snapshot row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use siteforge_core::store::VersionSnapshot;
use siteforge_core::types::{DbId, Timestamp};

/// A snapshot row from the `template_versions` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TemplateVersionRow {
    pub id: DbId,
    pub template_id: DbId,
    pub version: String,
    pub code: String,
    pub schema_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl From<TemplateVersionRow> for VersionSnapshot {
    fn from(row: TemplateVersionRow) -> Self {
        VersionSnapshot {
            template_id: row.template_id,
            version: row.version,
            code: row.code,
            schema_json: row.schema_json,
            created_at: row.created_at,
        }
    }
}
