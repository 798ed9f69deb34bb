use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use api_lib::adapters::DbAdapter;
use api_lib::web::{app_router, AppState};

/// Builds the same router the server binary runs, backed by a throwaway
/// SQLite file. The `TempDir` is returned so the database outlives the test
/// body.
async fn build_test_app() -> (Router, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(tmp.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap();
    let adapter = Arc::new(DbAdapter::new(pool));
    adapter.run_migrations().await.unwrap();

    let app_state = Arc::new(AppState { store: adapter });
    let app = app_router(app_state, HeaderValue::from_static("http://localhost:5173"));
    (app, tmp)
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn habit_lifecycle_create_toggle_delete() {
    let (app, _tmp) = build_test_app().await;

    // Create a habit.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/habits/",
            serde_json::json!({ "name": "Read", "goal_days": 30 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let habit_id = created["id"].as_str().unwrap().to_string();
    assert!(!habit_id.is_empty());
    assert_eq!(created["name"], "Read");
    assert_eq!(created["goalDays"], 30);
    assert_eq!(created["completedDates"], serde_json::json!([]));

    // Toggle a date on: the completion shows up.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/habits/{habit_id}/toggle"),
            serde_json::json!({ "date": "2024-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let toggled = body_json(response).await;
    assert_eq!(toggled["completedDates"], serde_json::json!(["2024-01-01"]));

    // Toggle the same date off: back to the original state.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/habits/{habit_id}/toggle"),
            serde_json::json!({ "date": "2024-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let toggled = body_json(response).await;
    assert_eq!(toggled["completedDates"], serde_json::json!([]));

    // Delete, then the habit is gone from the listing.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/habits/{habit_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/habits/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn create_trims_surrounding_whitespace() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/habits/",
            serde_json::json!({ "name": " Read " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["name"], "Read");
}

#[tokio::test]
async fn create_rejects_blank_name_with_field_detail() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/habits/",
            serde_json::json!({ "name": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["detail"][0]["field"], "name");
}

#[tokio::test]
async fn create_rejects_missing_name() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(json_request(Method::POST, "/habits/", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_accepts_camel_case_goal_days() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/habits/",
            serde_json::json!({ "name": "Read", "goalDays": 30 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["goalDays"], 30);
}

#[tokio::test]
async fn toggle_unknown_habit_returns_404() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/habits/no-such-id/toggle",
            serde_json::json!({ "date": "2024-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_malformed_date_returns_422() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/habits/",
            serde_json::json!({ "name": "Read" }),
        ))
        .await
        .unwrap();
    let habit_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/habits/{habit_id}/toggle"),
            serde_json::json!({ "date": "not-a-date" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["detail"][0]["field"], "date");
}

#[tokio::test]
async fn delete_unknown_habit_returns_404() {
    let (app, _tmp) = build_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/habits/no-such-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activity_counts_completions_per_date() {
    let (app, _tmp) = build_test_app().await;

    let mut ids = Vec::new();
    for name in ["Read", "Run"] {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/habits/",
                serde_json::json!({ "name": name }),
            ))
            .await
            .unwrap();
        ids.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    for (id, date) in [
        (&ids[0], "2024-01-01"),
        (&ids[1], "2024-01-01"),
        (&ids[1], "2024-01-02"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/habits/{id}/toggle"),
                serde_json::json!({ "date": date }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get_request("/habits/activity")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["activity"],
        serde_json::json!({ "2024-01-01": 2, "2024-01-02": 1 })
    );

    // Deleting a habit removes its contribution from the counts.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/habits/{}", ids[1]))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/habits/activity")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["activity"], serde_json::json!({ "2024-01-01": 1 }));
}

#[tokio::test]
async fn collection_route_requires_trailing_slash() {
    let (app, _tmp) = build_test_app().await;

    // `/habits` and `/habits/` are distinct; only the latter is registered.
    let response = app.oneshot(get_request("/habits")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
