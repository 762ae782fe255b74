//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod template_repo;
pub mod template_version_repo;

pub use template_repo::TemplateRepo;
pub use template_version_repo::TemplateVersionRepo;
