//! Template catalog index: a TTL-bounded, single-flight cache of
//! template summaries with in-memory filtered queries.
//!
//! The full summary set is loaded from the store at most once per TTL
//! window regardless of how many distinct filter combinations callers
//! ask for; filtering and pagination happen in memory afterwards.
//! Refreshes are single-flight: a refresh already in progress is awaited
//! by every concurrent caller instead of issuing duplicate loads.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use siteforge_core::error::CoreError;
use siteforge_core::store::TemplateStore;
use siteforge_core::summary::{self, SummaryFilters, SummaryPage, TemplateSummary};
use siteforge_core::template::TemplateImportEvent;
use siteforge_core::types::Timestamp;

/// Default cache time-to-live: five minutes.
pub const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(300);

/// One page of summaries plus the timestamp of the underlying load.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SummaryQueryResult {
    pub items: Vec<TemplateSummary>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_next_page: bool,
    /// When the backing full load happened.
    pub cached_at: Timestamp,
}

/// Cached full summary set.
struct CacheEntry {
    summaries: Arc<Vec<TemplateSummary>>,
    fetched_at: Instant,
    cached_at: Timestamp,
}

/// TTL-bounded summary cache over a template store.
pub struct TemplateCatalog {
    store: Arc<dyn TemplateStore>,
    ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    /// Serializes refreshes; concurrent callers queue here and then
    /// re-check freshness instead of re-loading.
    refresh_lock: Mutex<()>,
}

impl TemplateCatalog {
    pub fn new(store: Arc<dyn TemplateStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Answer a filtered, paginated summary query from the cache,
    /// loading the full set first if the cache is cold or expired.
    pub async fn summaries(
        &self,
        filters: &SummaryFilters,
    ) -> Result<SummaryQueryResult, CoreError> {
        let (summaries, cached_at) = self.fresh_summaries().await?;
        let page = summary::query_summaries(&summaries, filters);
        Ok(result_from_page(page, cached_at))
    }

    /// Variant of [`summaries`](Self::summaries) without the cache
    /// timestamp, used by the prompt cascade.
    pub async fn query_page(&self, filters: &SummaryFilters) -> Result<SummaryPage, CoreError> {
        let (summaries, _) = self.fresh_summaries().await?;
        Ok(summary::query_summaries(&summaries, filters))
    }

    /// Force a reload of the summary set, bypassing the TTL.
    pub async fn refresh(&self) -> Result<usize, CoreError> {
        let _guard = self.refresh_lock.lock().await;
        let count = self.load_into_cache().await?;
        tracing::info!(count, "Template summary cache refreshed");
        Ok(count)
    }

    /// Invalidate and reload in response to a template import event.
    ///
    /// Best-effort: a stale cache is acceptable, a crash on import is
    /// not, so refresh errors are logged and swallowed.
    pub async fn on_template_imported(&self, event: &TemplateImportEvent) {
        tracing::info!(
            source = %event.source,
            count = event.count,
            reason = %event.reason,
            "Refreshing template summary cache after import",
        );
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Summary cache refresh after import failed; keeping stale cache");
        }
    }

    /// Return the cached summary set, loading it when cold or expired.
    async fn fresh_summaries(&self) -> Result<(Arc<Vec<TemplateSummary>>, Timestamp), CoreError> {
        if let Some(hit) = self.cache_hit().await {
            return Ok(hit);
        }

        // Single-flight: first caller loads, the rest queue on the lock
        // and find a fresh entry on the re-check.
        let _guard = self.refresh_lock.lock().await;
        if let Some(hit) = self.cache_hit().await {
            return Ok(hit);
        }
        self.load_into_cache().await?;
        self.cache_hit()
            .await
            .ok_or_else(|| CoreError::Internal("Summary cache empty after load".to_string()))
    }

    async fn cache_hit(&self) -> Option<(Arc<Vec<TemplateSummary>>, Timestamp)> {
        let cache = self.cache.read().await;
        cache.as_ref().and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some((Arc::clone(&entry.summaries), entry.cached_at))
            } else {
                None
            }
        })
    }

    /// Load the full record set and replace the cache entry.
    ///
    /// Callers must hold `refresh_lock`.
    async fn load_into_cache(&self) -> Result<usize, CoreError> {
        let records = self.store.list_records().await?;
        let summaries: Vec<TemplateSummary> = records.iter().map(summary::summarize).collect();
        let count = summaries.len();

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            summaries: Arc::new(summaries),
            fetched_at: Instant::now(),
            cached_at: chrono::Utc::now(),
        });
        Ok(count)
    }
}

fn result_from_page(page: SummaryPage, cached_at: Timestamp) -> SummaryQueryResult {
    SummaryQueryResult {
        items: page.items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
        has_next_page: page.has_next_page,
        cached_at,
    }
}
