use std::sync::Arc;

use siteforge_engine::PlanningEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The planning engine (catalog, planner, composer, versioning).
    pub engine: Arc<PlanningEngine>,
    /// Database connection pool. `None` in degraded mode, where the
    /// engine runs over the in-memory store.
    pub pool: Option<siteforge_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
