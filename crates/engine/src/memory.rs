//! In-memory template store.
//!
//! Three jobs: the built-in fallback library the composer reaches for
//! when the persistent store cannot serve a slug, a degraded-mode store
//! when no database is configured, and the test double for everything
//! wired against [`TemplateStore`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use siteforge_core::error::CoreError;
use siteforge_core::store::{FallbackTemplates, TemplateStore, VersionCreated, VersionSnapshot};
use siteforge_core::template::{EngineKind, TemplateKind, TemplateRecord};
use siteforge_core::types::DbId;
use siteforge_core::version;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Built-in fallback library slugs.
pub const FALLBACK_PAGE_SLUG: &str = "landing-page-basic";
pub const FALLBACK_HERO_SLUG: &str = "hero-banner";
pub const FALLBACK_FEATURES_SLUG: &str = "feature-list";
pub const FALLBACK_THEME_SLUG: &str = "theme-light";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    templates: HashMap<String, TemplateRecord>,
    snapshots: Vec<VersionSnapshot>,
    next_id: DbId,
}

/// Mutex-backed [`TemplateStore`] and [`FallbackTemplates`] implementation.
///
/// The compound version operations hold the lock end to end, which gives
/// them the same atomicity the PostgreSQL store gets from transactions.
pub struct MemoryTemplateStore {
    inner: Mutex<Inner>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                templates: HashMap::new(),
                snapshots: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// A store pre-seeded with the built-in fallback library.
    pub fn with_builtin_library() -> Self {
        let store = Self::new();
        for record in builtin_library() {
            store.upsert(record);
        }
        store
    }

    /// Insert or replace a template by slug, assigning an id when the
    /// caller left it at zero.
    pub fn upsert(&self, mut record: TemplateRecord) {
        let mut inner = self.inner.lock().unwrap();
        if record.id == 0 {
            record.id = inner.next_id;
            inner.next_id += 1;
        } else {
            inner.next_id = inner.next_id.max(record.id + 1);
        }
        inner.templates.insert(record.slug.clone(), record);
    }

    /// Replace a template's live code without touching its version.
    pub fn update_code(&self, slug: &str, code: &str) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .templates
            .get_mut(slug)
            .ok_or_else(|| CoreError::not_found("Template", slug))?;
        record.code = code.to_string();
        record.updated_at = chrono::Utc::now();
        Ok(())
    }

    fn find<'a>(inner: &'a Inner, ident: &str) -> Option<&'a TemplateRecord> {
        if let Ok(id) = ident.parse::<DbId>() {
            if let Some(record) = inner.templates.values().find(|t| t.id == id) {
                return Some(record);
            }
        }
        inner.templates.get(ident)
    }
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get_by_ident(&self, ident: &str) -> Result<Option<TemplateRecord>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::find(&inner, ident).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<TemplateRecord>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.templates.get(slug).cloned())
    }

    async fn list_records(&self) -> Result<Vec<TemplateRecord>, CoreError> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<TemplateRecord> = inner.templates.values().cloned().collect();
        records.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(records)
    }

    async fn get_snapshot(
        &self,
        template_id: DbId,
        version: &str,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .snapshots
            .iter()
            .find(|s| s.template_id == template_id && s.version == version)
            .cloned())
    }

    async fn list_snapshots(&self, template_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError> {
        let inner = self.inner.lock().unwrap();
        let mut snapshots: Vec<VersionSnapshot> = inner
            .snapshots
            .iter()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    async fn snapshot_and_advance(
        &self,
        ident: &str,
        new_version: &str,
    ) -> Result<VersionCreated, CoreError> {
        let next = version::parse_version(new_version)?;
        let mut inner = self.inner.lock().unwrap();

        let record = Self::find(&inner, ident)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Template", ident))?;

        if inner
            .snapshots
            .iter()
            .any(|s| s.template_id == record.id && s.version == new_version)
        {
            return Err(CoreError::Conflict(format!(
                "Version {new_version} already exists for template '{}'",
                record.slug
            )));
        }
        version::ensure_version_increases(&record.version, &next)?;

        let snapshot = VersionSnapshot {
            template_id: record.id,
            version: new_version.to_string(),
            code: record.code.clone(),
            schema_json: record.schema_json.clone(),
            created_at: chrono::Utc::now(),
        };
        inner.snapshots.push(snapshot.clone());

        let live = inner
            .templates
            .get_mut(&record.slug)
            .ok_or_else(|| CoreError::not_found("Template", ident))?;
        live.version = new_version.to_string();
        live.updated_at = chrono::Utc::now();
        let template = live.clone();

        Ok(VersionCreated { template, snapshot })
    }

    async fn restore_snapshot(
        &self,
        ident: &str,
        target_version: &str,
    ) -> Result<TemplateRecord, CoreError> {
        version::parse_version(target_version)?;
        let mut inner = self.inner.lock().unwrap();

        let record = Self::find(&inner, ident)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Template", ident))?;

        let target = inner
            .snapshots
            .iter()
            .find(|s| s.template_id == record.id && s.version == target_version)
            .cloned()
            .ok_or_else(|| CoreError::not_found("TemplateVersion", target_version))?;

        // Preserve the outgoing live state when it was never snapshotted.
        let live_snapshotted = inner
            .snapshots
            .iter()
            .any(|s| s.template_id == record.id && s.version == record.version);
        if record.version != target_version && !live_snapshotted {
            inner.snapshots.push(VersionSnapshot {
                template_id: record.id,
                version: record.version.clone(),
                code: record.code.clone(),
                schema_json: record.schema_json.clone(),
                created_at: chrono::Utc::now(),
            });
        }

        let live = inner
            .templates
            .get_mut(&record.slug)
            .ok_or_else(|| CoreError::not_found("Template", ident))?;
        live.code = target.code;
        live.schema_json = target.schema_json;
        live.version = target.version;
        live.updated_at = chrono::Utc::now();
        Ok(live.clone())
    }
}

#[async_trait]
impl FallbackTemplates for MemoryTemplateStore {
    async fn get_by_slug(&self, slug: &str) -> Option<TemplateRecord> {
        let inner = self.inner.lock().unwrap();
        inner.templates.get(slug).cloned()
    }
}

// ---------------------------------------------------------------------------
// Built-in library
// ---------------------------------------------------------------------------

fn builtin(
    slug: &str,
    name: &str,
    kind: TemplateKind,
    code: &str,
    schema: serde_json::Value,
    tags: &[&str],
    description: &str,
) -> TemplateRecord {
    TemplateRecord {
        id: 0,
        slug: slug.to_string(),
        name: name.to_string(),
        kind,
        engine: EngineKind::Handlebars,
        version: "1.0.0".to_string(),
        schema_json: Some(schema),
        tokens_json: None,
        code: code.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: Some(description.to_string()),
        updated_at: chrono::Utc::now(),
    }
}

fn builtin_library() -> Vec<TemplateRecord> {
    let mut library = vec![
        builtin(
            FALLBACK_PAGE_SLUG,
            "Basic Landing Page",
            TemplateKind::Page,
            "<main>\n  <h1>{{headline}}</h1>\n  <p>{{subheading}}</p>\n  {{{components.hero}}}\n  {{{components.features}}}\n</main>",
            json!({
                "type": "object",
                "properties": {
                    "headline": {"type": "string", "default": "Welcome"},
                    "subheading": {"type": "string", "default": "We are glad you are here."}
                }
            }),
            &["landing", "fallback"],
            "A minimal landing page with hero and features slots.",
        ),
        builtin(
            FALLBACK_HERO_SLUG,
            "Hero Banner",
            TemplateKind::Component,
            "<section class=\"hero\">\n  <h2>{{title}}</h2>\n  <p>{{tagline}}</p>\n</section>",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "default": "Hello"},
                    "tagline": {"type": "string", "default": ""}
                }
            }),
            &["hero", "fallback"],
            "A full-width hero banner with title and tagline.",
        ),
        builtin(
            FALLBACK_FEATURES_SLUG,
            "Feature List",
            TemplateKind::Component,
            "<ul class=\"features\">\n{{#each items}}  <li>{{this}}</li>\n{{/each}}</ul>",
            json!({
                "type": "object",
                "properties": {
                    "items": {"type": "array", "default": []}
                }
            }),
            &["features", "fallback"],
            "A bulleted list of product features.",
        ),
        builtin(
            FALLBACK_THEME_SLUG,
            "Light Theme",
            TemplateKind::Theme,
            "<style>body { background: {{background}}; color: {{text}}; }</style>",
            json!({
                "type": "object",
                "properties": {
                    "background": {"type": "string", "default": "#ffffff"},
                    "text": {"type": "string", "default": "#1a1a1a"}
                }
            }),
            &["theme", "fallback"],
            "A light default theme.",
        ),
    ];
    if let Some(theme) = library.iter_mut().find(|t| t.slug == FALLBACK_THEME_SLUG) {
        theme.tokens_json = Some(json!({"background": "#ffffff", "text": "#1a1a1a"}));
    }
    library
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
