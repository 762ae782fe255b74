//! Rendering engine contract.
//!
//! The composer drives a [`SiteRenderer`] to turn resolved templates and
//! normalized data into HTML. CSS resolution beyond the theme's own
//! output is the renderer's concern, not the composer's.

use serde_json::Value;

use crate::error::CoreError;
use crate::template::TemplateRecord;

/// Inputs for composing one full page.
#[derive(Debug)]
pub struct PageComposition<'a> {
    /// The page template to render.
    pub page: &'a TemplateRecord,
    /// Normalized page data.
    pub page_data: &'a Value,
    /// Pre-rendered component HTML keyed by slot name.
    pub components: &'a [(String, String)],
    /// Optional theme template plus its normalized data.
    pub theme: Option<(&'a TemplateRecord, &'a Value)>,
}

/// Compiles template code against a data object into HTML.
pub trait SiteRenderer: Send + Sync {
    /// Render one template standalone (components, previews).
    fn render_fragment(&self, template: &TemplateRecord, data: &Value) -> Result<String, CoreError>;

    /// Compose a full page: page data plus slot-mounted component HTML
    /// plus an optional theme contribution.
    fn compose_page(&self, input: &PageComposition<'_>) -> Result<String, CoreError>;
}
