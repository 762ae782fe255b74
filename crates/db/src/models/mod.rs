//! Database row models.
//!
//! Row structs derive `FromRow` and convert into the core domain types
//! via `TryFrom`, so nothing outside this crate sees raw column values.

pub mod template;
pub mod template_version;

pub use template::TemplateRow;
pub use template_version::TemplateVersionRow;
