//! Site plans: the structured selection of templates produced by the
//! language model and consumed by the composer.
//!
//! A plan references templates by slug only. Shape validation happens at
//! parse time (unknown top-level fields are rejected); allow-list
//! validation is a separate step because the allow-list depends on which
//! prompt chunk produced the plan.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// One page or theme reference in a plan: a slug plus its data object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub slug: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

/// One component reference: mounted into a named slot of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub slot: String,
    pub slug: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

/// A structured selection of slugs plus per-slug data describing one
/// composed site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitePlan {
    /// The primary page.
    pub page: PlanEntry,
    /// Additional pages in a multi-page site.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PlanEntry>,
    /// Components keyed by slot.
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    /// Optional theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<PlanEntry>,
    /// Free-form metadata the model may attach; passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl SitePlan {
    /// Construct a single-page plan with no components or theme.
    pub fn single_page(slug: impl Into<String>) -> Self {
        Self {
            page: PlanEntry {
                slug: slug.into(),
                data: empty_object(),
            },
            pages: Vec::new(),
            components: Vec::new(),
            theme: None,
            metadata: None,
        }
    }

    /// Every slug referenced anywhere in the plan, deduplicated, in
    /// first-reference order.
    pub fn referenced_slugs(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut slugs = Vec::new();
        let mut push = |slug: &str| {
            if seen.insert(slug.to_string()) {
                slugs.push(slug.to_string());
            }
        };
        push(&self.page.slug);
        for page in &self.pages {
            push(&page.slug);
        }
        for component in &self.components {
            push(&component.slug);
        }
        if let Some(theme) = &self.theme {
            push(&theme.slug);
        }
        slugs
    }
}

// ---------------------------------------------------------------------------
// Parsing and validation
// ---------------------------------------------------------------------------

/// Parse raw model output as a [`SitePlan`].
///
/// The full text must be valid JSON matching the plan shape; unknown
/// top-level fields and missing required fields are parse errors.
pub fn parse_plan(raw: &str) -> Result<SitePlan, String> {
    serde_json::from_str::<SitePlan>(raw).map_err(|e| format!("Plan is not valid JSON: {e}"))
}

/// Validate that every slug in the plan belongs to the allow-list the
/// model was given. Returns the offending slugs on failure.
pub fn validate_allowed_slugs(plan: &SitePlan, allowed: &BTreeSet<String>) -> Result<(), String> {
    let offending: Vec<String> = plan
        .referenced_slugs()
        .into_iter()
        .filter(|slug| !allowed.contains(slug))
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Plan references slugs outside the allowed set: {}",
            offending.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allow(slugs: &[&str]) -> BTreeSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    // -- parse_plan -----------------------------------------------------------

    #[test]
    fn parses_minimal_plan() {
        let plan = parse_plan(r#"{"page": {"slug": "landing-page-basic"}}"#).unwrap();
        assert_eq!(plan.page.slug, "landing-page-basic");
        assert!(plan.page.data.as_object().unwrap().is_empty());
        assert!(plan.components.is_empty());
        assert!(plan.theme.is_none());
    }

    #[test]
    fn parses_full_plan() {
        let raw = json!({
            "page": {"slug": "landing-page-basic", "data": {"headline": "Hi"}},
            "pages": [{"slug": "about-page", "data": {}}],
            "components": [{"slot": "hero", "slug": "hero-banner", "data": {"headline": "Hi"}}],
            "theme": {"slug": "theme-light", "data": {}},
            "metadata": {"style": "minimal"}
        })
        .to_string();

        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.components[0].slot, "hero");
        assert_eq!(plan.theme.as_ref().unwrap().slug, "theme-light");
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_plan("Sure! Here is your plan: {...}").unwrap_err();
        assert!(err.contains("not valid JSON"));
    }

    #[test]
    fn rejects_missing_page() {
        let err = parse_plan(r#"{"components": []}"#).unwrap_err();
        assert!(err.contains("page"));
    }

    #[test]
    fn rejects_unknown_top_level_field() {
        let err =
            parse_plan(r#"{"page": {"slug": "a"}, "layout": "grid"}"#).unwrap_err();
        assert!(err.contains("layout"));
    }

    #[test]
    fn rejects_component_without_slot() {
        let err =
            parse_plan(r#"{"page": {"slug": "a"}, "components": [{"slug": "b"}]}"#).unwrap_err();
        assert!(err.contains("slot"));
    }

    // -- referenced_slugs -----------------------------------------------------

    #[test]
    fn referenced_slugs_deduplicates() {
        let raw = json!({
            "page": {"slug": "landing"},
            "pages": [{"slug": "landing"}, {"slug": "about"}],
            "components": [
                {"slot": "hero", "slug": "hero-banner"},
                {"slot": "footer", "slug": "hero-banner"}
            ],
            "theme": {"slug": "theme-light"}
        })
        .to_string();

        let plan = parse_plan(&raw).unwrap();
        assert_eq!(
            plan.referenced_slugs(),
            vec!["landing", "about", "hero-banner", "theme-light"]
        );
    }

    // -- validate_allowed_slugs -----------------------------------------------

    #[test]
    fn allow_list_accepts_compliant_plan() {
        let plan = parse_plan(
            r#"{"page": {"slug": "landing"}, "components": [{"slot": "hero", "slug": "hero-banner"}]}"#,
        )
        .unwrap();
        assert!(validate_allowed_slugs(&plan, &allow(&["landing", "hero-banner"])).is_ok());
    }

    #[test]
    fn allow_list_rejects_unknown_slug() {
        let plan = parse_plan(
            r#"{"page": {"slug": "landing"}, "components": [{"slot": "hero", "slug": "rogue"}]}"#,
        )
        .unwrap();
        let err = validate_allowed_slugs(&plan, &allow(&["landing", "hero-banner"])).unwrap_err();
        assert!(err.contains("rogue"));
        assert!(!err.contains("landing"));
    }

    #[test]
    fn allow_list_checks_extra_pages_and_theme() {
        let plan = parse_plan(
            r#"{"page": {"slug": "landing"}, "pages": [{"slug": "about"}], "theme": {"slug": "theme-dark"}}"#,
        )
        .unwrap();
        let err = validate_allowed_slugs(&plan, &allow(&["landing"])).unwrap_err();
        assert!(err.contains("about"));
        assert!(err.contains("theme-dark"));
    }

    // -- serialization --------------------------------------------------------

    #[test]
    fn empty_collections_skipped_on_serialize() {
        let plan = SitePlan::single_page("landing");
        let value = serde_json::to_value(&plan).unwrap();
        assert!(value.get("pages").is_none());
        assert!(value.get("theme").is_none());
        // components serializes as an empty array (not skipped).
        assert_eq!(value["components"], json!([]));
    }
}
