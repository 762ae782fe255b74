//! Template record types and string-backed enums.
//!
//! A template is a named, versioned, typed unit of renderable content.
//! The `slug` is the stable unique identity used everywhere outside the
//! database, and the only identifier ever shown to the language model.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Valid template kinds (stored as text in the `templates` table).
pub const KIND_PAGE: &str = "page";
pub const KIND_COMPONENT: &str = "component";
pub const KIND_THEME: &str = "theme";

/// All valid template kind strings.
pub const VALID_TEMPLATE_KINDS: &[&str] = &[KIND_PAGE, KIND_COMPONENT, KIND_THEME];

/// Valid rendering engine identifiers.
pub const ENGINE_HANDLEBARS: &str = "handlebars";
pub const ENGINE_RAW: &str = "raw";

/// All valid engine identifier strings.
pub const VALID_ENGINES: &[&str] = &[ENGINE_HANDLEBARS, ENGINE_RAW];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of a template: a full page, a slot-mounted component, or a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Page,
    Component,
    Theme,
}

impl TemplateKind {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            KIND_PAGE => Ok(Self::Page),
            KIND_COMPONENT => Ok(Self::Component),
            KIND_THEME => Ok(Self::Theme),
            _ => Err(format!(
                "Invalid template kind '{s}'. Must be one of: {}",
                VALID_TEMPLATE_KINDS.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => KIND_PAGE,
            Self::Component => KIND_COMPONENT,
            Self::Theme => KIND_THEME,
        }
    }
}

/// Rendering engine a template's code is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Logic-less mustache-style templates rendered through handlebars.
    Handlebars,
    /// Raw HTML passthrough; data is ignored.
    Raw,
}

impl EngineKind {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            ENGINE_HANDLEBARS => Ok(Self::Handlebars),
            ENGINE_RAW => Ok(Self::Raw),
            _ => Err(format!(
                "Invalid engine '{s}'. Must be one of: {}",
                VALID_ENGINES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handlebars => ENGINE_HANDLEBARS,
            Self::Raw => ENGINE_RAW,
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// A full template record as held by the template store.
///
/// The planning engine never creates records from scratch; import and
/// authoring flows do. The engine reads them everywhere and mutates
/// only `code`, `schema_json`, and `version` through the versioning
/// component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: DbId,
    /// Globally unique, human-chosen, stable identity.
    pub slug: String,
    pub name: String,
    pub kind: TemplateKind,
    pub engine: EngineKind,
    /// Semantic version string of the live code.
    pub version: String,
    /// Optional JSON Schema describing the template's data contract.
    pub schema_json: Option<serde_json::Value>,
    /// Optional design-token map (themes only).
    pub tokens_json: Option<serde_json::Value>,
    /// Template source code.
    pub code: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub updated_at: Timestamp,
}

/// Event raised by import/authoring flows when templates change.
///
/// The catalog refreshes its summary cache in response; a stale cache is
/// acceptable, so refresh failures are swallowed after logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateImportEvent {
    /// Where the templates came from (e.g. "zip_import", "authoring").
    pub source: String,
    /// How many templates the event covers.
    pub count: usize,
    /// Human-readable reason for the refresh, used in logs.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- TemplateKind ---------------------------------------------------------

    #[test]
    fn template_kind_from_str_page() {
        assert_eq!(TemplateKind::from_str_value("page").unwrap(), TemplateKind::Page);
    }

    #[test]
    fn template_kind_from_str_component() {
        assert_eq!(
            TemplateKind::from_str_value("component").unwrap(),
            TemplateKind::Component
        );
    }

    #[test]
    fn template_kind_from_str_theme() {
        assert_eq!(TemplateKind::from_str_value("theme").unwrap(), TemplateKind::Theme);
    }

    #[test]
    fn template_kind_from_str_invalid() {
        let result = TemplateKind::from_str_value("layout");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid template kind"));
    }

    #[test]
    fn template_kind_round_trip() {
        for kind in &[TemplateKind::Page, TemplateKind::Component, TemplateKind::Theme] {
            assert_eq!(TemplateKind::from_str_value(kind.as_str()).unwrap(), *kind);
        }
    }

    // -- EngineKind -----------------------------------------------------------

    #[test]
    fn engine_kind_round_trip() {
        for engine in &[EngineKind::Handlebars, EngineKind::Raw] {
            assert_eq!(EngineKind::from_str_value(engine.as_str()).unwrap(), *engine);
        }
    }

    #[test]
    fn engine_kind_invalid_rejected() {
        let result = EngineKind::from_str_value("liquid");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid engine"));
    }

    // -- Constant completeness ------------------------------------------------

    #[test]
    fn template_kinds_complete() {
        assert_eq!(VALID_TEMPLATE_KINDS.len(), 3);
    }

    #[test]
    fn engines_complete() {
        assert_eq!(VALID_ENGINES.len(), 2);
    }
}
