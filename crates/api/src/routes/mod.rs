pub mod health;
pub mod planning;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /templates/summaries                           GET, refresh POST
/// /templates/{ident}/versions                    GET, POST
/// /templates/{ident}/versions/{version}/rollback POST
/// /planning/prompt                               POST
/// /planning/plan                                 POST
/// /planning/compose                              POST
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", templates::router())
        .nest("/planning", planning::router())
}
