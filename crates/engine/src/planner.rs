//! Chat-driven site planning.
//!
//! The planner sends prompt chunks to the chat client and tries to turn
//! the response into a validated [`SitePlan`]. Every failure mode is
//! retried up to the request's budget: transport errors, non-JSON
//! responses, shape violations, and references to slugs outside the
//! chunk's allow-list. Each chunk gets its own retry budget; chunks are
//! consulted in order, so a slug missing from one chunk can still be
//! planned from a later one.

use serde::{Deserialize, Serialize};

use siteforge_core::chat::{ChatClient, ChatMessage, ChatOptions};
use siteforge_core::plan::{self, SitePlan};

use crate::prompting::{PromptMetadata, SystemPrompt};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// One planning request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRequest {
    /// What the end user asked for, sent as the user message.
    pub user_context: String,
    pub user_id: Option<String>,
    /// Extra system prompt appended after the catalog prompt.
    pub custom_prompt: Option<String>,
    pub model: Option<String>,
    /// Retries after the first attempt. `None` means [`DEFAULT_MAX_RETRIES`].
    pub max_retries: Option<u32>,
}

/// Planning result. `success` is false only when every attempt failed;
/// the raw responses and last error are kept for diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub success: bool,
    pub plan: Option<SitePlan>,
    /// Attempts actually made.
    pub attempts: u32,
    /// Every raw model response (or transport error), in attempt order.
    pub raw_responses: Vec<String>,
    /// All slugs that were offered to the model.
    pub used_slugs: Vec<String>,
    pub error: Option<String>,
    pub metadata: PromptMetadata,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Run the plan loop against an already-composed system prompt.
pub async fn run_plan(
    chat: &dyn ChatClient,
    prompt: &SystemPrompt,
    request: &PlanRequest,
) -> PlanOutcome {
    let max_retries = request.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
    let attempts_per_chunk = max_retries + 1;

    let options = ChatOptions {
        user_id: request.user_id.clone(),
        custom_prompt: request.custom_prompt.clone(),
        model: request.model.clone(),
    };

    let mut attempts = 0u32;
    let mut raw_responses = Vec::new();
    let mut last_error: Option<String> = None;

    for chunk in &prompt.prompts {
        for _ in 1..=attempts_per_chunk {
            attempts += 1;

            let messages = [
                ChatMessage::system(chunk.prompt.clone()),
                ChatMessage::user(request.user_context.clone()),
            ];

            let raw = match chat.chat(&messages, &options).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(attempt = attempts, error = %e, "Chat request failed");
                    raw_responses.push(format!("<chat error: {e}>"));
                    last_error = Some(e.to_string());
                    continue;
                }
            };
            raw_responses.push(raw.clone());

            match validate_response(&raw, chunk) {
                Ok(plan) => {
                    tracing::info!(
                        attempt = attempts,
                        slugs = ?plan.referenced_slugs(),
                        "Plan accepted",
                    );
                    return PlanOutcome {
                        success: true,
                        plan: Some(plan),
                        attempts,
                        raw_responses,
                        used_slugs: prompt.slugs.clone(),
                        error: None,
                        metadata: prompt.metadata.clone(),
                    };
                }
                Err(e) => {
                    tracing::warn!(attempt = attempts, error = %e, "Plan rejected");
                    last_error = Some(e);
                }
            }
        }
    }

    PlanOutcome {
        success: false,
        plan: None,
        attempts,
        raw_responses,
        used_slugs: prompt.slugs.clone(),
        error: last_error,
        metadata: prompt.metadata.clone(),
    }
}

/// Parse a raw response and check it against the chunk's allow-list.
fn validate_response(
    raw: &str,
    chunk: &crate::prompting::chunks::PromptChunk,
) -> Result<SitePlan, String> {
    let plan = plan::parse_plan(strip_code_fences(raw))?;
    plan::validate_allowed_slugs(&plan, &chunk.allowed_slugs())?;
    Ok(plan)
}

/// Models sometimes wrap JSON in markdown code fences despite the
/// contract; strip them before parsing.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
