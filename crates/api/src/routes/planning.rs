//! Route definitions for prompt composition, planning, and composition.

use axum::routing::post;
use axum::Router;

use crate::handlers::planning;
use crate::state::AppState;

/// Planning routes mounted at `/planning`.
///
/// ```text
/// POST /prompt   -> compose_prompt
/// POST /plan     -> plan_site
/// POST /compose  -> compose_site
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prompt", post(planning::compose_prompt))
        .route("/plan", post(planning::plan_site))
        .route("/compose", post(planning::compose_site))
}
