//! Retrieval strategies and the candidate-collection cascade.
//!
//! The cascade is a pure function over a strategy list and a budget;
//! the paginated fetch is an injected async callback, so the selection
//! logic is unit-testable without a store.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;

use siteforge_core::error::CoreError;
use siteforge_core::summary::{SummaryFilters, SummaryPage, TemplateSummary};
use siteforge_core::template::TemplateKind;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A named filter configuration used to retrieve one candidate subset.
#[derive(Debug, Clone)]
pub struct RetrievalStrategy {
    pub name: String,
    /// Filter overrides merged under the caller's base filters.
    pub overrides: SummaryFilters,
}

/// Build the ordered strategy sequence for a request.
///
/// Scenario-derived strategies come first (keyword match, tag match,
/// page bias), then the configured defaults (a single balanced strategy
/// with no extra filter). The sequence is deduplicated by name.
pub fn build_strategy_sequence(scenario: Option<&str>) -> Vec<RetrievalStrategy> {
    let mut strategies = Vec::new();

    if let Some(scenario) = scenario.map(str::trim).filter(|s| !s.is_empty()) {
        strategies.push(RetrievalStrategy {
            name: "scenario-keyword".to_string(),
            overrides: SummaryFilters {
                keyword: Some(scenario.to_string()),
                ..Default::default()
            },
        });
        strategies.push(RetrievalStrategy {
            name: "scenario-tag".to_string(),
            overrides: SummaryFilters {
                tag: Some(scenario.to_string()),
                ..Default::default()
            },
        });
        strategies.push(RetrievalStrategy {
            name: "scenario-pages".to_string(),
            overrides: SummaryFilters {
                kind: Some(TemplateKind::Page),
                ..Default::default()
            },
        });
    }

    strategies.push(RetrievalStrategy {
        name: "balanced".to_string(),
        overrides: SummaryFilters::default(),
    });

    let mut seen = HashSet::new();
    strategies.retain(|s| seen.insert(s.name.clone()));
    strategies
}

/// Merge a strategy's overrides under the caller's base filters.
///
/// The caller's explicit filters always win.
fn merged_filters(
    base: &SummaryFilters,
    strategy: &RetrievalStrategy,
    page: u32,
    page_size: u32,
) -> SummaryFilters {
    SummaryFilters {
        kind: base.kind.or(strategy.overrides.kind),
        tag: base.tag.clone().or_else(|| strategy.overrides.tag.clone()),
        keyword: base
            .keyword
            .clone()
            .or_else(|| strategy.overrides.keyword.clone()),
        engine: base.engine.or(strategy.overrides.engine),
        page: Some(page),
        page_size: Some(page_size),
    }
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Budget bounding the whole cascade.
#[derive(Debug, Clone)]
pub struct CascadeBudget {
    /// Stop the cascade once this many distinct templates accumulated.
    pub max_templates: usize,
    /// Page size for each fetch.
    pub page_size: u32,
    /// Per-strategy page cap.
    pub max_pages_per_strategy: u32,
}

/// One recorded page fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub strategy: String,
    pub page: u32,
    /// Items returned by this fetch.
    pub count: usize,
    /// Total matching items reported by the index.
    pub total: usize,
    pub has_next_page: bool,
}

/// Trace of how the cascade behaved, for observability and tests.
#[derive(Debug, Clone, Default)]
pub struct CascadeTrace {
    pub attempts: Vec<FetchAttempt>,
    pub strategies_tried: Vec<String>,
    pub strategies_used: Vec<String>,
    pub truncated: bool,
}

/// Cascade result: accumulated templates plus the trace.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub templates: Vec<TemplateSummary>,
    pub trace: CascadeTrace,
}

/// Run the strategy cascade: page through each strategy in order,
/// accumulating templates deduplicated by slug, until the budget fills
/// or every strategy is exhausted.
pub async fn collect_candidates<F, Fut>(
    strategies: &[RetrievalStrategy],
    base: &SummaryFilters,
    budget: &CascadeBudget,
    fetch: F,
) -> Result<CascadeOutcome, CoreError>
where
    F: Fn(SummaryFilters) -> Fut,
    Fut: Future<Output = Result<SummaryPage, CoreError>>,
{
    let mut templates: Vec<TemplateSummary> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut trace = CascadeTrace::default();

    'cascade: for strategy in strategies {
        if templates.len() >= budget.max_templates {
            break;
        }
        trace.strategies_tried.push(strategy.name.clone());
        let mut contributed = false;

        for page in 1..=budget.max_pages_per_strategy {
            let filters = merged_filters(base, strategy, page, budget.page_size);
            let result = fetch(filters).await?;
            let has_next_page = result.has_next_page;

            trace.attempts.push(FetchAttempt {
                strategy: strategy.name.clone(),
                page,
                count: result.items.len(),
                total: result.total,
                has_next_page,
            });

            let mut items = result.items.into_iter();
            for summary in items.by_ref() {
                if !seen.insert(summary.slug.clone()) {
                    continue;
                }
                templates.push(summary);
                if !contributed {
                    contributed = true;
                    trace.strategies_used.push(strategy.name.clone());
                }
                if templates.len() >= budget.max_templates {
                    // Budget filled mid-strategy: flag truncation when
                    // this page or the index still had more to offer.
                    if items.next().is_some() || has_next_page {
                        trace.truncated = true;
                    }
                    break 'cascade;
                }
            }

            if !has_next_page {
                break;
            }
            if page == budget.max_pages_per_strategy {
                // Page cap hit with more data behind it.
                trace.truncated = true;
            }
        }
    }

    Ok(CascadeOutcome { templates, trace })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use siteforge_core::summary::summarize;
    use siteforge_core::template::{EngineKind, TemplateRecord};

    fn make_summary(slug: &str) -> TemplateSummary {
        summarize(&TemplateRecord {
            id: 1,
            slug: slug.to_string(),
            name: slug.to_string(),
            kind: TemplateKind::Component,
            engine: EngineKind::Handlebars,
            version: "1.0.0".to_string(),
            schema_json: None,
            tokens_json: None,
            code: String::new(),
            tags: vec![],
            description: None,
            updated_at: chrono::Utc::now(),
        })
    }

    /// Serve pages out of a fixed summary list, honoring page/page_size.
    fn paged_fetch(
        all: Vec<TemplateSummary>,
    ) -> impl Fn(SummaryFilters) -> std::future::Ready<Result<SummaryPage, CoreError>> {
        move |filters: SummaryFilters| {
            let page = filters.page.unwrap_or(1);
            let page_size = filters.page_size.unwrap_or(10) as usize;
            let start = ((page - 1) as usize) * page_size;
            let items: Vec<TemplateSummary> =
                all.iter().skip(start).take(page_size).cloned().collect();
            let has_next_page = start + items.len() < all.len();
            std::future::ready(Ok(SummaryPage {
                items,
                total: all.len(),
                page,
                page_size: page_size as u32,
                has_next_page,
            }))
        }
    }

    fn budget(max_templates: usize, page_size: u32, max_pages: u32) -> CascadeBudget {
        CascadeBudget {
            max_templates,
            page_size,
            max_pages_per_strategy: max_pages,
        }
    }

    // -- build_strategy_sequence ----------------------------------------------

    #[test]
    fn no_scenario_yields_balanced_only() {
        let strategies = build_strategy_sequence(None);
        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].name, "balanced");
    }

    #[test]
    fn scenario_strategies_come_first() {
        let strategies = build_strategy_sequence(Some("bakery landing page"));
        let names: Vec<&str> = strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["scenario-keyword", "scenario-tag", "scenario-pages", "balanced"]
        );
    }

    #[test]
    fn blank_scenario_ignored() {
        let strategies = build_strategy_sequence(Some("   "));
        assert_eq!(strategies.len(), 1);
    }

    // -- merged_filters -------------------------------------------------------

    #[test]
    fn caller_filters_win_over_strategy() {
        let base = SummaryFilters {
            keyword: Some("shop".to_string()),
            ..Default::default()
        };
        let strategy = &build_strategy_sequence(Some("bakery"))[0];
        let merged = merged_filters(&base, strategy, 1, 10);
        assert_eq!(merged.keyword.as_deref(), Some("shop"));
    }

    #[test]
    fn strategy_fills_unset_filters() {
        let base = SummaryFilters::default();
        let strategy = &build_strategy_sequence(Some("bakery"))[0];
        let merged = merged_filters(&base, strategy, 2, 10);
        assert_eq!(merged.keyword.as_deref(), Some("bakery"));
        assert_eq!(merged.page, Some(2));
        assert_eq!(merged.page_size, Some(10));
    }

    // -- collect_candidates ---------------------------------------------------

    #[tokio::test]
    async fn collects_until_budget() {
        let all: Vec<TemplateSummary> = (0..20).map(|i| make_summary(&format!("tpl-{i}"))).collect();
        let strategies = build_strategy_sequence(None);

        let outcome =
            collect_candidates(&strategies, &SummaryFilters::default(), &budget(7, 3, 10), {
                paged_fetch(all)
            })
            .await
            .unwrap();

        assert_eq!(outcome.templates.len(), 7);
        assert!(outcome.trace.truncated);
        assert_eq!(outcome.trace.strategies_tried, vec!["balanced"]);
        assert_eq!(outcome.trace.strategies_used, vec!["balanced"]);
        // Pages of 3: three fetches needed to reach 7 templates.
        assert_eq!(outcome.trace.attempts.len(), 3);
    }

    #[tokio::test]
    async fn exhausted_source_not_truncated() {
        let all: Vec<TemplateSummary> = (0..4).map(|i| make_summary(&format!("tpl-{i}"))).collect();
        let strategies = build_strategy_sequence(None);

        let outcome =
            collect_candidates(&strategies, &SummaryFilters::default(), &budget(10, 3, 10), {
                paged_fetch(all)
            })
            .await
            .unwrap();

        assert_eq!(outcome.templates.len(), 4);
        assert!(!outcome.trace.truncated);
    }

    #[tokio::test]
    async fn page_cap_with_more_data_flags_truncation() {
        let all: Vec<TemplateSummary> = (0..20).map(|i| make_summary(&format!("tpl-{i}"))).collect();
        let strategies = build_strategy_sequence(None);

        let outcome =
            collect_candidates(&strategies, &SummaryFilters::default(), &budget(50, 3, 2), {
                paged_fetch(all)
            })
            .await
            .unwrap();

        // Two pages of three from the only strategy, then the cap.
        assert_eq!(outcome.templates.len(), 6);
        assert!(outcome.trace.truncated);
    }

    #[tokio::test]
    async fn duplicate_slugs_across_strategies_deduplicated() {
        let all: Vec<TemplateSummary> = (0..5).map(|i| make_summary(&format!("tpl-{i}"))).collect();
        // Scenario produces four strategies that all see the same set.
        let strategies = build_strategy_sequence(Some("bakery"));

        let outcome =
            collect_candidates(&strategies, &SummaryFilters::default(), &budget(50, 10, 10), {
                paged_fetch(all)
            })
            .await
            .unwrap();

        assert_eq!(outcome.templates.len(), 5);
        // All strategies fetched, but only the first contributed.
        assert_eq!(outcome.trace.strategies_tried.len(), 4);
        assert_eq!(outcome.trace.strategies_used, vec!["scenario-keyword"]);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let strategies = build_strategy_sequence(None);
        let result = collect_candidates(
            &strategies,
            &SummaryFilters::default(),
            &budget(10, 10, 10),
            |_| std::future::ready(Err(CoreError::Store("boom".to_string()))),
        )
        .await;
        assert!(result.is_err());
    }
}
