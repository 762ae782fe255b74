//! `TemplateStore` implementation over PostgreSQL.
//!
//! The compound version operations run in a single transaction each and
//! take a `FOR UPDATE` lock on the template row, so two concurrent calls
//! for the same template serialize at the database. The ordering and
//! conflict checks run again under that lock; a stale read outside the
//! transaction can never approve a conflicting write.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use siteforge_core::error::CoreError;
use siteforge_core::store::{TemplateStore, VersionCreated, VersionSnapshot};
use siteforge_core::template::TemplateRecord;
use siteforge_core::types::DbId;
use siteforge_core::version;

use crate::models::{TemplateRow, TemplateVersionRow};
use crate::repositories::{template_repo, template_version_repo, TemplateRepo, TemplateVersionRepo};

/// PostgreSQL-backed template store.
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the template row for the duration of the transaction,
    /// resolving the identifier as id-or-slug.
    async fn lock_row(
        conn: &mut PgConnection,
        ident: &str,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        let columns = template_repo::COLUMNS;
        match ident.parse::<DbId>() {
            Ok(id) => {
                let query = format!("SELECT {columns} FROM templates WHERE id = $1 FOR UPDATE");
                sqlx::query_as::<_, TemplateRow>(&query)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
            }
            Err(_) => {
                let query = format!("SELECT {columns} FROM templates WHERE slug = $1 FOR UPDATE");
                sqlx::query_as::<_, TemplateRow>(&query)
                    .bind(ident)
                    .fetch_optional(conn)
                    .await
            }
        }
    }

    /// Insert a snapshot row inside an open transaction.
    async fn insert_snapshot(
        conn: &mut PgConnection,
        template_id: DbId,
        version: &str,
        code: &str,
        schema_json: Option<&serde_json::Value>,
    ) -> Result<TemplateVersionRow, sqlx::Error> {
        let columns = template_version_repo::COLUMNS;
        let query = format!(
            "INSERT INTO template_versions (template_id, version, code, schema_json)
             VALUES ($1, $2, $3, $4)
             RETURNING {columns}"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .bind(version)
            .bind(code)
            .bind(schema_json)
            .fetch_one(conn)
            .await
    }

    /// Whether a snapshot exists for the given template and version,
    /// checked inside an open transaction.
    async fn snapshot_exists(
        conn: &mut PgConnection,
        template_id: DbId,
        version: &str,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM template_versions WHERE template_id = $1 AND version = $2",
        )
        .bind(template_id)
        .bind(version)
        .fetch_optional(conn)
        .await?;
        Ok(found.is_some())
    }
}

fn store_err(e: sqlx::Error) -> CoreError {
    CoreError::Store(e.to_string())
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn get_by_ident(&self, ident: &str) -> Result<Option<TemplateRecord>, CoreError> {
        TemplateRepo::find_by_ident(&self.pool, ident)
            .await
            .map_err(store_err)?
            .map(TemplateRecord::try_from)
            .transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TemplateRecord>, CoreError> {
        TemplateRepo::find_by_slug(&self.pool, slug)
            .await
            .map_err(store_err)?
            .map(TemplateRecord::try_from)
            .transpose()
    }

    async fn list_records(&self) -> Result<Vec<TemplateRecord>, CoreError> {
        TemplateRepo::list_all(&self.pool)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(TemplateRecord::try_from)
            .collect()
    }

    async fn get_snapshot(
        &self,
        template_id: DbId,
        version: &str,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        Ok(
            TemplateVersionRepo::find_by_template_and_version(&self.pool, template_id, version)
                .await
                .map_err(store_err)?
                .map(VersionSnapshot::from),
        )
    }

    async fn list_snapshots(&self, template_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError> {
        Ok(TemplateVersionRepo::list_for_template(&self.pool, template_id)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(VersionSnapshot::from)
            .collect())
    }

    async fn snapshot_and_advance(
        &self,
        ident: &str,
        new_version: &str,
    ) -> Result<VersionCreated, CoreError> {
        let next = version::parse_version(new_version)?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = Self::lock_row(&mut tx, ident)
            .await
            .map_err(store_err)?
            .ok_or_else(|| CoreError::not_found("Template", ident))?;

        if Self::snapshot_exists(&mut tx, row.id, new_version)
            .await
            .map_err(store_err)?
        {
            return Err(CoreError::Conflict(format!(
                "Version {new_version} already exists for template '{}'",
                row.slug
            )));
        }
        version::ensure_version_increases(&row.version, &next)?;

        // Snapshot the live code under the new version, then advance.
        let snapshot = Self::insert_snapshot(
            &mut tx,
            row.id,
            new_version,
            &row.code,
            row.schema_json.as_ref(),
        )
        .await
        .map_err(store_err)?;

        let columns = template_repo::COLUMNS;
        let query = format!(
            "UPDATE templates SET version = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {columns}"
        );
        let updated = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(row.id)
            .bind(new_version)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(VersionCreated {
            template: updated.try_into()?,
            snapshot: snapshot.into(),
        })
    }

    async fn restore_snapshot(
        &self,
        ident: &str,
        target_version: &str,
    ) -> Result<TemplateRecord, CoreError> {
        version::parse_version(target_version)?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = Self::lock_row(&mut tx, ident)
            .await
            .map_err(store_err)?
            .ok_or_else(|| CoreError::not_found("Template", ident))?;

        let columns = template_version_repo::COLUMNS;
        let query = format!(
            "SELECT {columns} FROM template_versions
             WHERE template_id = $1 AND version = $2"
        );
        let target = sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(row.id)
            .bind(target_version)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?
            .ok_or_else(|| CoreError::not_found("TemplateVersion", target_version))?;

        // Never lose the pre-rollback state: snapshot the live version
        // first if it has no snapshot of its own.
        if row.version != target_version
            && !Self::snapshot_exists(&mut tx, row.id, &row.version)
                .await
                .map_err(store_err)?
        {
            Self::insert_snapshot(&mut tx, row.id, &row.version, &row.code, row.schema_json.as_ref())
                .await
                .map_err(store_err)?;
        }

        let columns = template_repo::COLUMNS;
        let query = format!(
            "UPDATE templates
             SET code = $2, schema_json = $3, version = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {columns}"
        );
        let restored = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(row.id)
            .bind(&target.code)
            .bind(target.schema_json.as_ref())
            .bind(&target.version)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        restored.try_into()
    }
}
