//! Template summaries: derivation, filtering, and pagination.
//!
//! A summary is a lightweight projection of a [`TemplateRecord`] used by
//! the catalog cache and the prompt composer. Summaries are derived only;
//! they are never mutated independently of their record.

use serde::{Deserialize, Serialize};

use crate::template::{EngineKind, TemplateKind, TemplateRecord};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How many schema property names are surfaced as key fields.
pub const KEY_FIELDS_LIMIT: usize = 6;

/// Maximum length of the derived one-line summary, in characters.
pub const SUMMARY_MAX_LENGTH: usize = 120;

/// Page size bounds for summary queries.
pub const MIN_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 60;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Lightweight, cacheable projection of a template record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub kind: TemplateKind,
    pub engine: EngineKind,
    pub version: String,
    pub tags: Vec<String>,
    /// One-line summary: truncated description, or tag-derived fallback.
    pub summary: String,
    /// First [`KEY_FIELDS_LIMIT`] property names of the declared schema.
    pub key_fields: Vec<String>,
    pub updated_at: Timestamp,
}

/// Filters for summary queries. All fields are optional; `page` defaults
/// to 1 and `page_size` is clamped to `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryFilters {
    /// Accepted as `kind` or `type` in query strings.
    #[serde(alias = "type")]
    pub kind: Option<TemplateKind>,
    pub tag: Option<String>,
    pub engine: Option<EngineKind>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// One page of filtered summaries.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryPage {
    pub items: Vec<TemplateSummary>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_next_page: bool,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a [`TemplateSummary`] from a full record.
pub fn summarize(record: &TemplateRecord) -> TemplateSummary {
    TemplateSummary {
        id: record.id,
        slug: record.slug.clone(),
        name: record.name.clone(),
        kind: record.kind,
        engine: record.engine,
        version: record.version.clone(),
        tags: record.tags.clone(),
        summary: derive_summary_text(record),
        key_fields: derive_key_fields(record.schema_json.as_ref()),
        updated_at: record.updated_at,
    }
}

/// Build the one-line summary text for a record.
///
/// Uses the description truncated to [`SUMMARY_MAX_LENGTH`] characters;
/// falls back to a line derived from the kind and tags when the record
/// carries no description.
fn derive_summary_text(record: &TemplateRecord) -> String {
    match record.description.as_deref() {
        Some(desc) if !desc.trim().is_empty() => truncate_chars(desc.trim(), SUMMARY_MAX_LENGTH),
        _ => {
            if record.tags.is_empty() {
                format!("{} template", record.kind.as_str())
            } else {
                format!("{} template ({})", record.kind.as_str(), record.tags.join(", "))
            }
        }
    }
}

/// First [`KEY_FIELDS_LIMIT`] property names of a JSON Schema, in
/// document order.
fn derive_key_fields(schema: Option<&serde_json::Value>) -> Vec<String> {
    schema
        .and_then(|s| s.get("properties"))
        .and_then(|p| p.as_object())
        .map(|props| props.keys().take(KEY_FIELDS_LIMIT).cloned().collect())
        .unwrap_or_default()
}

/// Truncate a string to at most `max` characters (not bytes).
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

// ---------------------------------------------------------------------------
// Filtering and pagination
// ---------------------------------------------------------------------------

/// Clamp a requested page size into `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`.
pub fn clamp_page_size(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Clamp a requested page number to at least 1.
pub fn clamp_page(requested: Option<u32>) -> u32 {
    requested.unwrap_or(1).max(1)
}

/// Whether a summary matches the given filters (pagination ignored).
///
/// Tag matching is exact case-insensitive; keyword matching is a
/// case-insensitive substring test against name, slug, summary, and tags.
pub fn matches_filters(summary: &TemplateSummary, filters: &SummaryFilters) -> bool {
    if let Some(kind) = filters.kind {
        if summary.kind != kind {
            return false;
        }
    }
    if let Some(engine) = filters.engine {
        if summary.engine != engine {
            return false;
        }
    }
    if let Some(tag) = filters.tag.as_deref() {
        let wanted = tag.to_lowercase();
        if !summary.tags.iter().any(|t| t.to_lowercase() == wanted) {
            return false;
        }
    }
    if let Some(keyword) = filters.keyword.as_deref() {
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let in_tags = summary.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !(summary.name.to_lowercase().contains(&needle)
            || summary.slug.to_lowercase().contains(&needle)
            || summary.summary.to_lowercase().contains(&needle)
            || in_tags)
        {
            return false;
        }
    }
    true
}

/// Filter and paginate a full summary set in memory.
pub fn query_summaries(summaries: &[TemplateSummary], filters: &SummaryFilters) -> SummaryPage {
    let page = clamp_page(filters.page);
    let page_size = clamp_page_size(filters.page_size);

    let filtered: Vec<&TemplateSummary> = summaries
        .iter()
        .filter(|s| matches_filters(s, filters))
        .collect();
    let total = filtered.len();

    let start = ((page - 1) as usize) * (page_size as usize);
    let items: Vec<TemplateSummary> = filtered
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect();

    let has_next_page = start + items.len() < total;

    SummaryPage {
        items,
        total,
        page,
        page_size,
        has_next_page,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
