//! Site composition: plan in, rendered HTML out.
//!
//! The composer resolves each slug a plan references, normalizes the
//! plan's data against the template schemas, renders components into
//! their slots and composes the page. It never hard-fails on content
//! problems: a broken or unservable plan degrades to the built-in
//! fallback site and every degradation is recorded as an issue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use siteforge_core::error::CoreError;
use siteforge_core::plan::{ComponentEntry, PlanEntry, SitePlan};
use siteforge_core::render::{PageComposition, SiteRenderer};
use siteforge_core::schema;
use siteforge_core::store::{FallbackTemplates, TemplateStore};
use siteforge_core::template::TemplateRecord;
use siteforge_core::types::Timestamp;

use crate::memory::{
    FALLBACK_FEATURES_SLUG, FALLBACK_HERO_SLUG, FALLBACK_PAGE_SLUG, FALLBACK_THEME_SLUG,
};

/// How long a resolved template stays in the composer's lookup cache.
pub const DEFAULT_LOOKUP_TTL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Per-request composition options.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    pub request_id: Option<String>,
    pub user_id: Option<String>,
    /// Skip the plan entirely and serve the fallback site.
    pub fallback: bool,
}

/// One rendered secondary page.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub slug: String,
    pub html: String,
}

/// One rendered slot-mounted component.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedComponent {
    pub slot: String,
    pub slug: String,
    pub html: String,
}

/// A template that contributed to the composed site.
#[derive(Debug, Clone, Serialize)]
pub struct UsedTemplate {
    pub slug: String,
    pub kind: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeMetadata {
    pub used_templates: Vec<UsedTemplate>,
    pub fallback_used: bool,
    /// Degradations encountered, machine-readable.
    pub issues: Vec<String>,
}

/// Persistable record of the composed site.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSnapshot {
    pub plan: SitePlan,
    pub html: String,
    pub pages: Vec<RenderedPage>,
    pub components: Vec<RenderedComponent>,
    pub created_at: Timestamp,
}

/// Full composition result. `plan` is the normalized plan, with every
/// data object run through schema default-filling.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedSite {
    pub success: bool,
    pub plan: SitePlan,
    /// Primary page HTML, theme included.
    pub html: String,
    pub pages: Vec<RenderedPage>,
    pub components: Vec<RenderedComponent>,
    pub theme: Option<String>,
    pub metadata: ComposeMetadata,
    pub snapshot: SiteSnapshot,
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

struct CachedLookup {
    record: TemplateRecord,
    fetched_at: Instant,
}

pub struct SiteComposer {
    store: Arc<dyn TemplateStore>,
    fallback: Arc<dyn FallbackTemplates>,
    renderer: Arc<dyn SiteRenderer>,
    lookup_cache: Mutex<HashMap<String, CachedLookup>>,
    lookup_ttl: Duration,
    fallback_plan: SitePlan,
}

impl SiteComposer {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        fallback: Arc<dyn FallbackTemplates>,
        renderer: Arc<dyn SiteRenderer>,
        lookup_ttl: Duration,
    ) -> Self {
        Self {
            store,
            fallback,
            renderer,
            lookup_cache: Mutex::new(HashMap::new()),
            lookup_ttl,
            fallback_plan: default_fallback_plan(),
        }
    }

    /// Compose a site from a plan, degrading to the fallback site when
    /// the plan is absent, unservable, or fails to render.
    pub async fn compose_site(
        &self,
        plan: Option<SitePlan>,
        options: &ComposeOptions,
    ) -> Result<ComposedSite, CoreError> {
        let mut issues: Vec<String> = Vec::new();
        let mut fallback_used = options.fallback;

        let mut plan = if options.fallback {
            self.fallback_plan.clone()
        } else {
            match plan {
                Some(plan) => plan,
                None => {
                    issues.push("invalid_plan".to_string());
                    fallback_used = true;
                    self.fallback_plan.clone()
                }
            }
        };

        // Missing slugs invalidate the whole plan; resolve everything
        // first and substitute the fallback plan before touching the
        // renderer. Every unresolvable reference is reported, not just
        // the first.
        if !fallback_used {
            let missing = self.missing_slugs(&plan).await;
            if !missing.is_empty() {
                tracing::warn!(
                    request_id = options.request_id.as_deref().unwrap_or(""),
                    slugs = ?missing,
                    "Plan references unresolvable templates, serving fallback site",
                );
                for slug in missing {
                    issues.push(format!("missing_template:{slug}"));
                }
                fallback_used = true;
                plan = self.fallback_plan.clone();
            }
        }

        match self.render_plan(&plan, &mut issues).await {
            Ok(rendered) => Ok(self.finish(rendered, fallback_used, issues)),
            Err(e) if !fallback_used => {
                tracing::warn!(
                    request_id = options.request_id.as_deref().unwrap_or(""),
                    error = %e,
                    "Plan failed to render, serving fallback site",
                );
                issues.push("fallback_after_failure".to_string());
                let rendered = self.render_plan(&self.fallback_plan, &mut issues).await?;
                Ok(self.finish(rendered, true, issues))
            }
            Err(e) => Err(e),
        }
    }

    fn finish(&self, rendered: RenderedPlan, fallback_used: bool, issues: Vec<String>) -> ComposedSite {
        let snapshot = SiteSnapshot {
            plan: rendered.plan.clone(),
            html: rendered.html.clone(),
            pages: rendered.pages.clone(),
            components: rendered.components.clone(),
            created_at: chrono::Utc::now(),
        };
        ComposedSite {
            success: true,
            plan: rendered.plan,
            html: rendered.html,
            pages: rendered.pages,
            components: rendered.components,
            theme: rendered.theme,
            metadata: ComposeMetadata {
                used_templates: rendered.used_templates,
                fallback_used,
                issues,
            },
            snapshot,
        }
    }

    /// Every slug in the plan that neither the store nor the fallback
    /// library can serve, in plan order.
    async fn missing_slugs(&self, plan: &SitePlan) -> Vec<String> {
        let mut missing = Vec::new();
        for slug in plan.referenced_slugs() {
            if self.resolve(&slug).await.is_none() {
                missing.push(slug);
            }
        }
        missing
    }

    /// Resolve a slug: lookup cache, then the store, then the fallback
    /// library. Store errors degrade to the fallback library too.
    async fn resolve(&self, slug: &str) -> Option<TemplateRecord> {
        {
            let cache = self.lookup_cache.lock().await;
            if let Some(hit) = cache.get(slug) {
                if hit.fetched_at.elapsed() < self.lookup_ttl {
                    return Some(hit.record.clone());
                }
            }
        }

        let from_store = match self.store.get_by_slug(slug).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(slug, error = %e, "Store lookup failed, trying fallback library");
                None
            }
        };
        let record = match from_store {
            Some(record) => record,
            None => self.fallback.get_by_slug(slug).await?,
        };

        let mut cache = self.lookup_cache.lock().await;
        cache.insert(
            slug.to_string(),
            CachedLookup {
                record: record.clone(),
                fetched_at: Instant::now(),
            },
        );
        Some(record)
    }

    /// Resolve a slug that already passed [`missing_slugs`], or the
    /// fallback plan's own slugs.
    async fn must_resolve(&self, slug: &str) -> Result<TemplateRecord, CoreError> {
        self.resolve(slug)
            .await
            .ok_or_else(|| CoreError::not_found("Template", slug))
    }

    /// Normalize one data object against a template's schema. Validation
    /// problems after default-filling are recorded, not fatal.
    fn normalize(&self, template: &TemplateRecord, data: &mut Value, issues: &mut Vec<String>) {
        let Some(schema) = &template.schema_json else {
            return;
        };
        schema::fill_schema_defaults(schema, data);
        if let Err(e) = schema::validate_data(schema, data) {
            tracing::debug!(slug = %template.slug, error = %e, "Data fails schema after defaults");
            issues.push(format!("schema_invalid:{}", template.slug));
        }
    }

    async fn render_plan(
        &self,
        plan: &SitePlan,
        issues: &mut Vec<String>,
    ) -> Result<RenderedPlan, CoreError> {
        let mut normalized = plan.clone();
        let mut used_templates: Vec<UsedTemplate> = Vec::new();

        // Components first so their HTML can mount into the page.
        let mut components: Vec<RenderedComponent> = Vec::new();
        let mut slot_html: Vec<(String, String)> = Vec::new();
        for entry in &mut normalized.components {
            let template = self.must_resolve(&entry.slug).await?;
            self.normalize(&template, &mut entry.data, issues);
            let html = self.renderer.render_fragment(&template, &entry.data)?;
            slot_html.push((entry.slot.clone(), html.clone()));
            push_used(&mut used_templates, &template);
            components.push(RenderedComponent {
                slot: entry.slot.clone(),
                slug: entry.slug.clone(),
                html,
            });
        }

        // Theme, if any.
        let theme_template = match &normalized.theme {
            Some(entry) => Some(self.must_resolve(&entry.slug).await?),
            None => None,
        };
        let mut theme_name = None;
        if let (Some(template), Some(entry)) = (&theme_template, &mut normalized.theme) {
            self.normalize(template, &mut entry.data, issues);
            theme_name = Some(template.slug.clone());
            push_used(&mut used_templates, template);
        }

        // Primary page.
        let page_template = self.must_resolve(&normalized.page.slug).await?;
        self.normalize(&page_template, &mut normalized.page.data, issues);
        push_used(&mut used_templates, &page_template);
        let theme = theme_template
            .as_ref()
            .zip(normalized.theme.as_ref())
            .map(|(template, entry)| (template, &entry.data));
        let html = self.renderer.compose_page(&PageComposition {
            page: &page_template,
            page_data: &normalized.page.data,
            components: &slot_html,
            theme: theme.map(|(t, d)| (t, d)),
        })?;

        // Secondary pages render standalone; one bad page does not sink
        // the site.
        let mut pages: Vec<RenderedPage> = Vec::new();
        for entry in &mut normalized.pages {
            let template = self.must_resolve(&entry.slug).await?;
            self.normalize(&template, &mut entry.data, issues);
            match self.renderer.compose_page(&PageComposition {
                page: &template,
                page_data: &entry.data,
                components: &slot_html,
                theme: theme.map(|(t, d)| (t, d)),
            }) {
                Ok(page_html) => {
                    push_used(&mut used_templates, &template);
                    pages.push(RenderedPage {
                        slug: entry.slug.clone(),
                        html: page_html,
                    });
                }
                Err(e) => {
                    tracing::warn!(slug = %entry.slug, error = %e, "Secondary page skipped");
                    issues.push(format!("page_render_failed:{}", entry.slug));
                }
            }
        }

        Ok(RenderedPlan {
            plan: normalized,
            html,
            pages,
            components,
            theme: theme_name,
            used_templates,
        })
    }
}

struct RenderedPlan {
    plan: SitePlan,
    html: String,
    pages: Vec<RenderedPage>,
    components: Vec<RenderedComponent>,
    theme: Option<String>,
    used_templates: Vec<UsedTemplate>,
}

fn push_used(used: &mut Vec<UsedTemplate>, template: &TemplateRecord) {
    if used.iter().any(|u| u.slug == template.slug) {
        return;
    }
    used.push(UsedTemplate {
        slug: template.slug.clone(),
        kind: template.kind.as_str().to_string(),
        version: template.version.clone(),
    });
}

/// The built-in fallback site: landing page with hero and features,
/// light theme.
pub fn default_fallback_plan() -> SitePlan {
    SitePlan {
        page: PlanEntry {
            slug: FALLBACK_PAGE_SLUG.to_string(),
            data: json!({}),
        },
        pages: Vec::new(),
        components: vec![
            ComponentEntry {
                slot: "hero".to_string(),
                slug: FALLBACK_HERO_SLUG.to_string(),
                data: json!({}),
            },
            ComponentEntry {
                slot: "features".to_string(),
                slug: FALLBACK_FEATURES_SLUG.to_string(),
                data: json!({}),
            },
        ],
        theme: Some(PlanEntry {
            slug: FALLBACK_THEME_SLUG.to_string(),
            data: json!({}),
        }),
        metadata: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
