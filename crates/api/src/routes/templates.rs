//! Route definitions for the template catalog and versioning.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Template routes mounted at `/templates`.
///
/// ```text
/// GET  /summaries                            -> list_summaries
/// POST /summaries/refresh                    -> refresh_summaries
/// GET  /{ident}/versions                     -> list_versions
/// POST /{ident}/versions                     -> create_version
/// POST /{ident}/versions/{version}/rollback  -> rollback_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summaries", get(templates::list_summaries))
        .route("/summaries/refresh", post(templates::refresh_summaries))
        .route(
            "/{ident}/versions",
            get(templates::list_versions).post(templates::create_version),
        )
        .route(
            "/{ident}/versions/{version}/rollback",
            post(templates::rollback_version),
        )
}
