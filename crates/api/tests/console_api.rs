//! Integration tests for the console log endpoints.
//!
//! Uses Axum's `tower::ServiceExt` to send requests directly to the router.

mod common;

use axum::http::StatusCode;
use common::{assert_error, body_json, get, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: GET /api/logs starts empty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logs_start_empty() {
    let (app, _root) = common::build_test_app();
    let response = get(app, "/api/logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["logs"], json!([]));
}

// ---------------------------------------------------------------------------
// Test: POST /api/log stores an entry that GET /api/logs returns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn posted_log_appears_in_listing() {
    let (app, _root) = common::build_test_app();

    let response = post_json(
        app.clone(),
        "/api/log",
        json!({ "message": "render started", "source": "canvas" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["log"]["message"], "render started");
    assert_eq!(json["log"]["source"], "canvas");
    assert!(json["log"]["timestamp"].is_string());

    let response = get(app, "/api/logs").await;
    let json = body_json(response).await;
    assert_eq!(json["logs"].as_array().unwrap().len(), 1);
    assert_eq!(json["logs"][0]["message"], "render started");
}

// ---------------------------------------------------------------------------
// Test: source defaults to "frontend" when omitted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn log_source_defaults_to_frontend() {
    let (app, _root) = common::build_test_app();

    let response = post_json(app, "/api/log", json!({ "message": "hello" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["log"]["source"], "frontend");
}

// ---------------------------------------------------------------------------
// Test: POST /api/log without a message returns 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_log_message_returns_400() {
    let (app, _root) = common::build_test_app();

    let response = post_json(app, "/api/log", json!({ "source": "canvas" })).await;
    assert_error(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

// ---------------------------------------------------------------------------
// Test: limit query caps the number of returned entries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limit_query_caps_returned_entries() {
    let (app, _root) = common::build_test_app();

    for i in 0..5 {
        let response = post_json(
            app.clone(),
            "/api/log",
            json!({ "message": format!("entry {i}") }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(app, "/api/logs?limit=2").await;
    let json = body_json(response).await;
    let logs = json["logs"].as_array().unwrap();

    // The two most recent entries, in chronological order.
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["message"], "entry 3");
    assert_eq!(logs[1]["message"], "entry 4");
}
