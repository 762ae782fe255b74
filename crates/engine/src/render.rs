//! Handlebars-backed implementation of [`SiteRenderer`].

use handlebars::Handlebars;
use serde_json::{Map, Value};

use siteforge_core::error::CoreError;
use siteforge_core::render::{PageComposition, SiteRenderer};
use siteforge_core::template::{EngineKind, TemplateRecord};

/// Renders template code with Handlebars; `raw` templates pass their
/// code through untouched.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        // Missing fields render empty rather than failing the page;
        // schema normalization upstream fills what it can.
        registry.set_strict_mode(false);
        Self { registry }
    }

    fn render_code(&self, template: &TemplateRecord, data: &Value) -> Result<String, CoreError> {
        match template.engine {
            EngineKind::Raw => Ok(template.code.clone()),
            EngineKind::Handlebars => self
                .registry
                .render_template(&template.code, data)
                .map_err(|e| {
                    CoreError::Render(format!("template '{}': {e}", template.slug))
                }),
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRenderer for TemplateRenderer {
    fn render_fragment(&self, template: &TemplateRecord, data: &Value) -> Result<String, CoreError> {
        self.render_code(template, data)
    }

    fn compose_page(&self, input: &PageComposition<'_>) -> Result<String, CoreError> {
        // Slot-mounted component HTML goes in under a reserved key so
        // page templates can write {{{components.hero}}}.
        let mut data = match input.page_data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let mut slots = Map::new();
        for (slot, html) in input.components {
            slots.insert(slot.clone(), Value::String(html.clone()));
        }
        data.insert("components".to_string(), Value::Object(slots));

        let page_html = self.render_code(input.page, &Value::Object(data))?;

        let Some((theme, theme_data)) = input.theme else {
            return Ok(page_html);
        };

        // Theme templates see their own data plus the design tokens.
        let mut data = match theme_data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Some(Value::Object(tokens)) = &theme.tokens_json {
            for (k, v) in tokens {
                data.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        let theme_html = self.render_code(theme, &Value::Object(data))?;

        Ok(format!("{theme_html}\n{page_html}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
