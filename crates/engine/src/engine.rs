//! The engine facade: one object owning the catalog, composer, planner
//! entry points and the versioning service, constructed once per process
//! with injected collaborators.

use std::sync::Arc;
use std::time::Duration;

use siteforge_core::chat::ChatClient;
use siteforge_core::error::CoreError;
use siteforge_core::render::SiteRenderer;
use siteforge_core::store::{FallbackTemplates, TemplateStore, VersionCreated};
use siteforge_core::summary::SummaryFilters;
use siteforge_core::template::{TemplateImportEvent, TemplateRecord};

use crate::catalog::{SummaryQueryResult, TemplateCatalog, DEFAULT_SUMMARY_TTL};
use crate::composer::{ComposeOptions, ComposedSite, SiteComposer, DEFAULT_LOOKUP_TTL};
use crate::planner::{self, PlanOutcome, PlanRequest};
use crate::prompting::{self, PromptOptions, SystemPrompt};
use crate::versioning::{VersionListing, VersioningService};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Engine tuning knobs. The defaults suit a catalog of a few hundred
/// templates.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Summary cache time-to-live.
    pub summary_ttl: Duration,
    /// Composer per-slug lookup cache time-to-live.
    pub lookup_ttl: Duration,
    /// Global template budget for one prompt composition.
    pub max_templates: usize,
    /// Templates per prompt chunk.
    pub max_templates_per_chunk: usize,
    /// Page cap for each retrieval strategy.
    pub max_pages_per_strategy: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            summary_ttl: DEFAULT_SUMMARY_TTL,
            lookup_ttl: DEFAULT_LOOKUP_TTL,
            max_templates: 40,
            max_templates_per_chunk: 10,
            max_pages_per_strategy: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct PlanningEngine {
    catalog: TemplateCatalog,
    composer: SiteComposer,
    versioning: VersioningService,
    chat: Arc<dyn ChatClient>,
    config: EngineConfig,
}

impl PlanningEngine {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        chat: Arc<dyn ChatClient>,
        renderer: Arc<dyn SiteRenderer>,
        fallback: Arc<dyn FallbackTemplates>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog: TemplateCatalog::new(Arc::clone(&store), config.summary_ttl),
            composer: SiteComposer::new(
                Arc::clone(&store),
                fallback,
                renderer,
                config.lookup_ttl,
            ),
            versioning: VersioningService::new(store),
            chat,
            config,
        }
    }

    // -- catalog --------------------------------------------------------------

    /// Filtered, paginated template summaries from the cache.
    pub async fn template_summaries(
        &self,
        filters: &SummaryFilters,
    ) -> Result<SummaryQueryResult, CoreError> {
        self.catalog.summaries(filters).await
    }

    /// Force a summary cache reload; returns the loaded count.
    pub async fn refresh_summary_cache(&self) -> Result<usize, CoreError> {
        self.catalog.refresh().await
    }

    /// Invalidate the summary cache after a template import.
    pub async fn on_template_imported(&self, event: &TemplateImportEvent) {
        self.catalog.on_template_imported(event).await;
    }

    // -- planning -------------------------------------------------------------

    /// Compose the chunked system prompt for a planning request.
    pub async fn compose_system_prompt(
        &self,
        options: &PromptOptions,
    ) -> Result<SystemPrompt, CoreError> {
        prompting::compose_system_prompt(&self.catalog, &self.config, options).await
    }

    /// Run the full plan loop: compose the prompt, then drive the chat
    /// client with retries until a plan validates or the budget runs out.
    pub async fn plan_template(
        &self,
        prompt_options: &PromptOptions,
        request: &PlanRequest,
    ) -> Result<PlanOutcome, CoreError> {
        let prompt = self.compose_system_prompt(prompt_options).await?;
        Ok(planner::run_plan(self.chat.as_ref(), &prompt, request).await)
    }

    // -- composition ----------------------------------------------------------

    /// Render a plan into a full site, degrading to the fallback site
    /// when it cannot be served.
    pub async fn compose_site(
        &self,
        plan: Option<siteforge_core::plan::SitePlan>,
        options: &ComposeOptions,
    ) -> Result<ComposedSite, CoreError> {
        self.composer.compose_site(plan, options).await
    }

    // -- versioning -----------------------------------------------------------

    pub async fn create_template_version(
        &self,
        ident: &str,
        new_version: &str,
    ) -> Result<VersionCreated, CoreError> {
        self.versioning.create_version(ident, new_version).await
    }

    pub async fn rollback_template_version(
        &self,
        ident: &str,
        target_version: &str,
    ) -> Result<TemplateRecord, CoreError> {
        self.versioning.rollback(ident, target_version).await
    }

    pub async fn list_template_versions(&self, ident: &str) -> Result<VersionListing, CoreError> {
        self.versioning.list_versions(ident).await
    }
}
