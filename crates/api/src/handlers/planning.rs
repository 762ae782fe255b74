//! Handlers for prompt composition, planning, and site composition.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use siteforge_core::plan::SitePlan;
use siteforge_engine::composer::ComposeOptions;
use siteforge_engine::planner::PlanRequest;
use siteforge_engine::prompting::PromptOptions;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for POST /planning/plan: catalog filters plus the chat request.
#[derive(Debug, Default, Deserialize)]
pub struct PlanBody {
    #[serde(flatten)]
    pub prompt: PromptOptions,
    #[serde(flatten)]
    pub request: PlanRequest,
}

/// Body for POST /planning/compose.
#[derive(Debug, Default, Deserialize)]
pub struct ComposeBody {
    /// The plan to render. Absent or null serves the fallback site.
    pub plan: Option<SitePlan>,
    /// Force the fallback site regardless of `plan`.
    #[serde(default)]
    pub fallback: bool,
    pub user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/planning/prompt
///
/// Compose the chunked system prompt for the given filters without
/// calling the chat backend. Useful for debugging prompt content.
pub async fn compose_prompt(
    State(state): State<AppState>,
    Json(options): Json<PromptOptions>,
) -> AppResult<impl IntoResponse> {
    let prompt = state.engine.compose_system_prompt(&options).await?;

    Ok(Json(DataResponse { data: prompt }))
}

/// POST /api/v1/planning/plan
///
/// Run the full plan loop: compose the prompt, drive the chat client
/// with retries, return the outcome (including failures; a failed plan
/// is a 200 with `success: false`, not an error).
pub async fn plan_site(
    State(state): State<AppState>,
    Json(body): Json<PlanBody>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.engine.plan_template(&body.prompt, &body.request).await?;

    tracing::info!(
        success = outcome.success,
        attempts = outcome.attempts,
        "Plan request finished",
    );

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/planning/compose
///
/// Render a plan into a full site. Unservable plans degrade to the
/// built-in fallback site; degradations appear in `metadata.issues`.
pub async fn compose_site(
    State(state): State<AppState>,
    Json(body): Json<ComposeBody>,
) -> AppResult<impl IntoResponse> {
    let options = ComposeOptions {
        request_id: Some(uuid::Uuid::new_v4().to_string()),
        user_id: body.user_id,
        fallback: body.fallback,
    };
    let site = state.engine.compose_site(body.plan, &options).await?;

    tracing::info!(
        fallback_used = site.metadata.fallback_used,
        issues = site.metadata.issues.len(),
        "Site composed",
    );

    Ok(Json(DataResponse { data: site }))
}
