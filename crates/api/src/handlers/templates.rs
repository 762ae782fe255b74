//! Handlers for the template catalog and versioning endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use siteforge_core::summary::SummaryFilters;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Catalog endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/templates/summaries
///
/// Filtered, paginated template summaries from the cached index.
pub async fn list_summaries(
    State(state): State<AppState>,
    Query(filters): Query<SummaryFilters>,
) -> AppResult<impl IntoResponse> {
    let result = state.engine.template_summaries(&filters).await?;

    Ok(Json(DataResponse { data: result }))
}

/// Payload returned by a forced cache refresh.
#[derive(Serialize)]
pub struct RefreshResponse {
    /// Number of summaries loaded.
    pub count: usize,
}

/// POST /api/v1/templates/summaries/refresh
///
/// Force a summary cache reload, bypassing the TTL.
pub async fn refresh_summaries(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let count = state.engine.refresh_summary_cache().await?;

    tracing::info!(count, "Summary cache refreshed via API");

    Ok(Json(DataResponse {
        data: RefreshResponse { count },
    }))
}

// ---------------------------------------------------------------------------
// Versioning endpoints
// ---------------------------------------------------------------------------

/// Request body for creating a template version.
#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    /// The new semantic version, e.g. `"1.2.0"`.
    pub version: String,
}

/// GET /api/v1/templates/:ident/versions
///
/// The template plus its version snapshots, newest first. `ident` is a
/// numeric id or a slug.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> AppResult<impl IntoResponse> {
    let listing = state.engine.list_template_versions(&ident).await?;

    Ok(Json(DataResponse { data: listing }))
}

/// POST /api/v1/templates/:ident/versions
///
/// Snapshot the live code under the requested version and advance the
/// template's live version.
pub async fn create_version(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Json(input): Json<CreateVersionRequest>,
) -> AppResult<impl IntoResponse> {
    let created = state
        .engine
        .create_template_version(&ident, &input.version)
        .await?;

    tracing::info!(
        template = %created.template.slug,
        version = %created.template.version,
        "Template version created via API",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/v1/templates/:ident/versions/:version/rollback
///
/// Restore the live template from the snapshot at the target version.
pub async fn rollback_version(
    State(state): State<AppState>,
    Path((ident, version)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let restored = state
        .engine
        .rollback_template_version(&ident, &version)
        .await?;

    tracing::info!(
        template = %restored.slug,
        version = %restored.version,
        "Template rolled back via API",
    );

    Ok(Json(DataResponse { data: restored }))
}
