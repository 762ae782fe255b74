//! Prompt chunk rendering.
//!
//! Large candidate sets are split into bounded chunks so no single
//! system prompt grows past what a chat model handles well. Every chunk
//! repeats the response contract and lists the exact slugs the model is
//! allowed to reference.

use std::collections::BTreeSet;

use serde::Serialize;

use siteforge_core::summary::TemplateSummary;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// One rendered system-prompt chunk and the templates it describes.
#[derive(Debug, Clone, Serialize)]
pub struct PromptChunk {
    pub prompt: String,
    pub templates: Vec<TemplateSummary>,
}

impl PromptChunk {
    /// Slugs the model may reference when this chunk is in play.
    pub fn allowed_slugs(&self) -> BTreeSet<String> {
        self.templates.iter().map(|t| t.slug.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the candidate set into chunks of at most `chunk_size` templates.
///
/// The first chunk carries a worked JSON example; every chunk carries the
/// full response contract and its own allowed-slug list.
pub fn render_prompt_chunks(
    templates: &[TemplateSummary],
    scenario: Option<&str>,
    chunk_size: usize,
) -> Vec<PromptChunk> {
    let chunk_size = chunk_size.max(1);
    let chunk_count = templates.len().div_ceil(chunk_size);

    templates
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| PromptChunk {
            prompt: render_chunk(chunk, scenario, index, chunk_count),
            templates: chunk.to_vec(),
        })
        .collect()
}

fn render_chunk(
    templates: &[TemplateSummary],
    scenario: Option<&str>,
    index: usize,
    chunk_count: usize,
) -> String {
    let mut out = String::new();

    out.push_str("You are a website planner. You select templates from a fixed catalog and fill their data fields.\n");
    if let Some(scenario) = scenario.map(str::trim).filter(|s| !s.is_empty()) {
        out.push_str(&format!("The site being planned: {scenario}.\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "Template set {} of {}:\n",
        index + 1,
        chunk_count
    ));
    for (i, t) in templates.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} [{} | {}] | tags: {} | keyFields: {}\n",
            i + 1,
            t.slug,
            t.kind.as_str(),
            t.engine.as_str(),
            if t.tags.is_empty() {
                "none".to_string()
            } else {
                t.tags.join(", ")
            },
            if t.key_fields.is_empty() {
                "none".to_string()
            } else {
                t.key_fields.join(", ")
            },
        ));
        out.push_str(&format!("   {}\n", t.summary));
    }
    out.push('\n');

    out.push_str(
        "Respond with a single JSON object of this shape:\n\
         {\"page\": {\"slug\": \"...\", \"data\": {...}},\n \
         \"components\": [{\"slot\": \"...\", \"slug\": \"...\", \"data\": {...}}],\n \
         \"pages\": [], \"theme\": null, \"metadata\": null}\n",
    );
    if index == 0 {
        out.push_str(
            "\nExample:\n\
             {\"page\": {\"slug\": \"landing-page-basic\", \"data\": {\"headline\": \"Fresh Bread Daily\"}},\n \
             \"components\": [{\"slot\": \"hero\", \"slug\": \"hero-banner\", \"data\": {\"title\": \"Welcome\"}}],\n \
             \"pages\": [], \"theme\": null, \"metadata\": null}\n",
        );
    }

    let slugs: Vec<&str> = templates.iter().map(|t| t.slug.as_str()).collect();
    out.push_str(&format!(
        "\nOnly these template slugs are allowed: {}.\n",
        slugs.join(", ")
    ));
    out.push_str("Respond with JSON only, no explanation.\n");
    out
}

/// Prompt emitted when no templates matched any strategy: instructs the
/// model to decline planning so the caller can fall back.
pub fn placeholder_prompt(scenario: Option<&str>) -> PromptChunk {
    let mut out = String::new();
    out.push_str("You are a website planner, but the template catalog returned no candidates");
    if let Some(scenario) = scenario.map(str::trim).filter(|s| !s.is_empty()) {
        out.push_str(&format!(" for: {scenario}"));
    }
    out.push_str(
        ".\nDo not invent template slugs. Respond with exactly this JSON object so the \
         caller can use a fallback site:\n{\"page\": {\"slug\": \"unavailable\", \"data\": {}}, \
         \"components\": []}\n",
    );
    PromptChunk {
        prompt: out,
        templates: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use siteforge_core::summary::summarize;
    use siteforge_core::template::{EngineKind, TemplateKind, TemplateRecord};

    fn record(slug: &str, tags: &[&str]) -> TemplateRecord {
        TemplateRecord {
            id: 1,
            slug: slug.to_string(),
            name: slug.to_string(),
            kind: TemplateKind::Page,
            engine: EngineKind::Handlebars,
            version: "1.0.0".to_string(),
            schema_json: Some(serde_json::json!({
                "type": "object",
                "properties": {"headline": {"type": "string"}}
            })),
            tokens_json: None,
            code: "<h1>{{headline}}</h1>".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: Some(format!("The {slug} template.")),
            updated_at: chrono::Utc::now(),
        }
    }

    fn summaries(n: usize) -> Vec<TemplateSummary> {
        (0..n)
            .map(|i| summarize(&record(&format!("tpl-{i}"), &["landing"])))
            .collect()
    }

    // -- render_prompt_chunks -------------------------------------------------

    #[test]
    fn small_set_fits_one_chunk() {
        let chunks = render_prompt_chunks(&summaries(3), None, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].templates.len(), 3);
    }

    #[test]
    fn large_set_splits_by_chunk_size() {
        let chunks = render_prompt_chunks(&summaries(7), None, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].templates.len(), 3);
        assert_eq!(chunks[2].templates.len(), 1);
        assert!(chunks[0].prompt.contains("Template set 1 of 3"));
        assert!(chunks[2].prompt.contains("Template set 3 of 3"));
    }

    #[test]
    fn every_chunk_lists_its_own_slugs() {
        let chunks = render_prompt_chunks(&summaries(4), None, 2);
        assert!(chunks[0].prompt.contains("tpl-0, tpl-1"));
        assert!(chunks[1].prompt.contains("tpl-2, tpl-3"));
        assert!(!chunks[1].prompt.contains("tpl-0"));
    }

    #[test]
    fn worked_example_only_on_first_chunk() {
        let chunks = render_prompt_chunks(&summaries(4), None, 2);
        assert!(chunks[0].prompt.contains("Example:"));
        assert!(!chunks[1].prompt.contains("Example:"));
    }

    #[test]
    fn scenario_mentioned_in_intro() {
        let chunks = render_prompt_chunks(&summaries(1), Some("a bakery site"), 10);
        assert!(chunks[0].prompt.contains("a bakery site"));
    }

    #[test]
    fn template_lines_carry_kind_engine_tags_and_key_fields() {
        let chunks = render_prompt_chunks(&summaries(1), None, 10);
        let prompt = &chunks[0].prompt;
        assert!(prompt.contains("tpl-0 [page | handlebars]"));
        assert!(prompt.contains("tags: landing"));
        assert!(prompt.contains("keyFields: headline"));
    }

    #[test]
    fn contract_line_present_on_every_chunk() {
        let chunks = render_prompt_chunks(&summaries(4), None, 2);
        for chunk in &chunks {
            assert!(chunk.prompt.contains("Respond with JSON only, no explanation."));
        }
    }

    // -- allowed_slugs --------------------------------------------------------

    #[test]
    fn allowed_slugs_collects_chunk_slugs() {
        let chunks = render_prompt_chunks(&summaries(2), None, 10);
        let slugs = chunks[0].allowed_slugs();
        assert!(slugs.contains("tpl-0"));
        assert!(slugs.contains("tpl-1"));
        assert_eq!(slugs.len(), 2);
    }

    // -- placeholder_prompt ---------------------------------------------------

    #[test]
    fn placeholder_has_no_templates() {
        let chunk = placeholder_prompt(Some("a bakery"));
        assert!(chunk.templates.is_empty());
        assert!(chunk.prompt.contains("a bakery"));
        assert!(chunk.prompt.contains("Do not invent template slugs"));
    }
}
