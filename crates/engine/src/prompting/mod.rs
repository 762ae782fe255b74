//! System-prompt composition: retrieval strategies plus chunk rendering.
//!
//! Given caller filters and an optional scenario, a cascade of named
//! strategies pulls candidate templates from the catalog up to a budget;
//! the accumulated set is rendered into one or more bounded prompt
//! chunks, each carrying the exact slugs the model may reference.

pub mod chunks;
pub mod strategy;

use serde::{Deserialize, Serialize};

use siteforge_core::error::CoreError;
use siteforge_core::summary::SummaryFilters;
use siteforge_core::template::{EngineKind, TemplateKind};

use crate::catalog::TemplateCatalog;
use crate::engine::EngineConfig;
use chunks::PromptChunk;
use strategy::{CascadeBudget, FetchAttempt};

/// Options for one system-prompt composition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptOptions {
    #[serde(alias = "type")]
    pub kind: Option<TemplateKind>,
    pub tag: Option<String>,
    pub keyword: Option<String>,
    pub engine: Option<EngineKind>,
    /// Free-text scenario driving the scenario-derived strategies and
    /// mentioned in the prompt intro.
    pub scenario: Option<String>,
    /// Global template budget across all strategies.
    pub max_templates: Option<usize>,
    /// Page size used when paging through the catalog.
    pub page_size: Option<u32>,
}

/// Composition result: bounded prompt chunks plus observability data.
#[derive(Debug, Clone, Serialize)]
pub struct SystemPrompt {
    pub prompts: Vec<PromptChunk>,
    /// Every slug offered to the model, across all chunks, deduplicated.
    pub slugs: Vec<String>,
    pub metadata: PromptMetadata,
}

/// Observability record of how the cascade behaved.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMetadata {
    pub total_templates: usize,
    pub chunk_count: usize,
    /// Strategies that issued at least one fetch.
    pub strategies_tried: Vec<String>,
    /// Strategies that contributed at least one new template.
    pub strategies_used: Vec<String>,
    /// One entry per page fetch.
    pub attempts: Vec<FetchAttempt>,
    /// Whether more templates existed beyond the budget or page caps.
    pub truncated: bool,
}

/// Run the strategy cascade against the catalog and render prompt chunks.
///
/// Never returns zero prompts: when the cascade finds nothing, a single
/// placeholder prompt asks the caller to request a fallback instead.
pub async fn compose_system_prompt(
    catalog: &TemplateCatalog,
    config: &EngineConfig,
    options: &PromptOptions,
) -> Result<SystemPrompt, CoreError> {
    let base = SummaryFilters {
        kind: options.kind,
        tag: options.tag.clone(),
        keyword: options.keyword.clone(),
        engine: options.engine,
        page: None,
        page_size: None,
    };
    let budget = CascadeBudget {
        max_templates: options.max_templates.unwrap_or(config.max_templates),
        page_size: options
            .page_size
            .unwrap_or(config.max_templates_per_chunk as u32),
        max_pages_per_strategy: config.max_pages_per_strategy,
    };

    let strategies = strategy::build_strategy_sequence(options.scenario.as_deref());
    let outcome = strategy::collect_candidates(&strategies, &base, &budget, |filters| async move {
        catalog.query_page(&filters).await
    })
    .await?;

    let prompts = if outcome.templates.is_empty() {
        tracing::warn!(
            scenario = options.scenario.as_deref().unwrap_or(""),
            "No templates matched any strategy; emitting placeholder prompt",
        );
        vec![chunks::placeholder_prompt(options.scenario.as_deref())]
    } else {
        chunks::render_prompt_chunks(
            &outcome.templates,
            options.scenario.as_deref(),
            config.max_templates_per_chunk,
        )
    };

    let slugs: Vec<String> = outcome.templates.iter().map(|t| t.slug.clone()).collect();

    tracing::debug!(
        templates = slugs.len(),
        chunks = prompts.len(),
        strategies_used = ?outcome.trace.strategies_used,
        truncated = outcome.trace.truncated,
        "Composed system prompt",
    );

    Ok(SystemPrompt {
        metadata: PromptMetadata {
            total_templates: slugs.len(),
            chunk_count: prompts.len(),
            strategies_tried: outcome.trace.strategies_tried,
            strategies_used: outcome.trace.strategies_used,
            attempts: outcome.trace.attempts,
            truncated: outcome.trace.truncated,
        },
        prompts,
        slugs,
    })
}
