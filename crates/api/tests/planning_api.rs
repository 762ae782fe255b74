//! HTTP-level integration tests for the planning endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json};
use serde_json::json;
use siteforge_core::error::CoreError;

fn valid_plan() -> serde_json::Value {
    json!({
        "page": {"slug": "landing-page-basic", "data": {"headline": "Fresh Bread"}},
        "components": [
            {"slot": "hero", "slug": "hero-banner", "data": {"title": "Welcome"}}
        ]
    })
}

// ---------------------------------------------------------------------------
// Prompt composition
// ---------------------------------------------------------------------------

/// POST /planning/prompt returns chunked prompts with metadata.
#[tokio::test]
async fn prompt_returns_chunks_and_metadata() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(app, "/api/v1/planning/prompt", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["prompts"].as_array().map_or(false, |p| !p.is_empty()));
    assert_eq!(data["metadata"]["total_templates"], 4);
    assert_eq!(data["metadata"]["truncated"], false);
    assert!(data["slugs"]
        .as_array()
        .is_some_and(|s| s.iter().any(|v| v == "landing-page-basic")));
}

/// A template budget through the API truncates the offered set.
#[tokio::test]
async fn prompt_honors_template_budget() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/planning/prompt",
        json!({"max_templates": 2}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["metadata"]["total_templates"], 2);
    assert_eq!(json["data"]["metadata"]["truncated"], true);
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// A valid model response plans in one attempt.
#[tokio::test]
async fn plan_succeeds_with_valid_response() {
    let app = common::build_test_app(vec![Ok(valid_plan().to_string())]);

    let response = post_json(
        app,
        "/api/v1/planning/plan",
        json!({"user_context": "a bakery site"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["attempts"], 1);
    assert_eq!(json["data"]["plan"]["page"]["slug"], "landing-page-basic");
}

/// Exhausted retries return 200 with success false and the history.
#[tokio::test]
async fn plan_failure_is_a_200_with_history() {
    let app = common::build_test_app(vec![
        Ok("not json".to_string()),
        Ok("still not json".to_string()),
    ]);

    let response = post_json(
        app,
        "/api/v1/planning/plan",
        json!({"user_context": "a bakery site", "max_retries": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["attempts"], 2);
    assert_eq!(json["data"]["raw_responses"].as_array().map(Vec::len), Some(2));
    assert!(json["data"]["error"].is_string());
}

/// Transport errors are retried like bad output.
#[tokio::test]
async fn plan_retries_after_chat_error() {
    let app = common::build_test_app(vec![
        Err(CoreError::Chat("boom".to_string())),
        Ok(valid_plan().to_string()),
    ]);

    let response = post_json(
        app,
        "/api/v1/planning/plan",
        json!({"user_context": "a bakery site"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["attempts"], 2);
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// A valid plan composes into HTML with defaults filled.
#[tokio::test]
async fn compose_renders_plan() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/planning/compose",
        json!({"plan": valid_plan()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["success"], true);
    assert_eq!(data["metadata"]["fallback_used"], false);
    assert!(data["html"].as_str().is_some_and(|h| h.contains("Fresh Bread")));
    // Subheading filled from the page schema default.
    assert_eq!(data["plan"]["page"]["data"]["subheading"], "We are glad you are here.");
}

/// A plan naming an unknown slug degrades to the fallback site.
#[tokio::test]
async fn compose_degrades_on_unknown_slug() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/planning/compose",
        json!({"plan": {"page": {"slug": "ghost", "data": {}}}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["metadata"]["fallback_used"], true);
    assert_eq!(data["plan"]["page"]["slug"], "landing-page-basic");
    assert!(data["metadata"]["issues"]
        .as_array()
        .is_some_and(|i| i.iter().any(|v| v == "missing_template:ghost")));
}

/// An explicit fallback request skips the plan without issues.
#[tokio::test]
async fn compose_explicit_fallback() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/planning/compose",
        json!({"fallback": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["metadata"]["fallback_used"], true);
    assert_eq!(data["metadata"]["issues"].as_array().map(Vec::len), Some(0));
}
