//! HTTP-level integration tests for the template catalog and
//! versioning endpoints, running over the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Without a database the service reports degraded, not an error.
#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = common::build_test_app(Vec::new());

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// GET /templates/summaries returns the enveloped summary page.
#[tokio::test]
async fn list_summaries_returns_data_envelope() {
    let app = common::build_test_app(Vec::new());

    let response = get(app, "/api/v1/templates/summaries").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 4);
    assert_eq!(json["data"]["page"], 1);
    assert!(json["data"]["items"].is_array());
    assert!(json["data"]["cached_at"].is_string());
}

/// Kind filtering narrows the result set.
#[tokio::test]
async fn summaries_filter_by_kind() {
    let app = common::build_test_app(Vec::new());

    let response = get(app, "/api/v1/templates/summaries?kind=page").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["slug"], "landing-page-basic");
}

/// `type` is accepted as an alias for the `kind` query parameter.
#[tokio::test]
async fn summaries_accept_type_alias() {
    let app = common::build_test_app(Vec::new());

    let response = get(app, "/api/v1/templates/summaries?type=page").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["slug"], "landing-page-basic");
}

/// POST /templates/summaries/refresh reloads and reports the count.
#[tokio::test]
async fn refresh_returns_loaded_count() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(app, "/api/v1/templates/summaries/refresh", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 4);
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Creating a version returns 201 with the advanced template and the
/// new snapshot.
#[tokio::test]
async fn create_version_returns_created() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/templates/hero-banner/versions",
        json!({"version": "1.1.0"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["template"]["version"], "1.1.0");
    assert_eq!(json["data"]["snapshot"]["version"], "1.1.0");
}

/// A malformed version is a 400 validation error.
#[tokio::test]
async fn create_version_rejects_malformed_semver() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/templates/hero-banner/versions",
        json!({"version": "not-semver"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

/// A non-increasing version is a 409 conflict.
#[tokio::test]
async fn create_version_rejects_decrease() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/templates/hero-banner/versions",
        json!({"version": "0.5.0"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

/// An unknown template is a 404.
#[tokio::test]
async fn create_version_unknown_template_is_404() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/templates/ghost/versions",
        json!({"version": "1.1.0"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Version listing shows snapshots newest first; rollback restores and
/// returns the live record at the target version.
#[tokio::test]
async fn version_listing_and_rollback() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app.clone(),
        "/api/v1/templates/hero-banner/versions",
        json!({"version": "1.1.0"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.clone(),
        "/api/v1/templates/hero-banner/versions",
        json!({"version": "1.2.0"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(app.clone(), "/api/v1/templates/hero-banner/versions").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["template"]["version"], "1.2.0");
    assert_eq!(json["data"]["versions"].as_array().map(Vec::len), Some(2));

    let response = post_json(
        app,
        "/api/v1/templates/hero-banner/versions/1.1.0/rollback",
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["version"], "1.1.0");
}

/// Rolling back to a version with no snapshot is a 404.
#[tokio::test]
async fn rollback_unknown_version_is_404() {
    let app = common::build_test_app(Vec::new());

    let response = post_json(
        app,
        "/api/v1/templates/hero-banner/versions/9.9.9/rollback",
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
