//! The Siteforge planning engine.
//!
//! Owns the summary cache and the prompt/plan/compose/version flows,
//! wired against the collaborator traits from `siteforge-core`:
//! a template store, a chat client, a renderer, and an in-memory
//! fallback library. Construct a [`engine::PlanningEngine`] once per
//! process with injected collaborators; tests construct fresh instances
//! with fakes.

pub mod catalog;
pub mod chat;
pub mod composer;
pub mod engine;
pub mod memory;
pub mod planner;
pub mod prompting;
pub mod render;
pub mod versioning;

pub use engine::{EngineConfig, PlanningEngine};
