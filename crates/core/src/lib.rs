//! Pure domain logic for the Siteforge planning engine.
//!
//! This crate contains no I/O: template and plan types, summary
//! derivation and filtering, JSON Schema default-filling and validation,
//! semantic-version ordering rules, and the collaborator traits the
//! engine crate is wired against. Evaluation is done against pre-loaded
//! data passed in by the caller.

pub mod chat;
pub mod error;
pub mod plan;
pub mod render;
pub mod schema;
pub mod store;
pub mod summary;
pub mod template;
pub mod types;
pub mod version;
