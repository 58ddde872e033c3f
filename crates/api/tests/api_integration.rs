//! API integration tests.
//!
//! These tests verify the API endpoints work correctly together.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use tower::ServiceExt;
use updown_api::{middleware::AppState, router as api_router};
use updown_core::{FeedbackCatalog, KindRegistry, VoteService};
use updown_db::{entities::vote, repositories::VoteRepository};

fn create_test_state(db: DatabaseConnection) -> AppState {
    let vote_repo = VoteRepository::new(Arc::new(db));
    let directory = Arc::new(KindRegistry::new(
        vec!["post".to_string()],
        vec!["user".to_string()],
    ));
    let catalog = FeedbackCatalog::new(vec!["like".to_string(), "dislike".to_string()]);
    let vote_service = VoteService::new(vote_repo, directory, catalog.clone());

    AppState {
        vote_service,
        catalog,
        authenticator: Arc::new(updown_api::StaticTokenAuth::new(Some("secret".to_string()))),
    }
}

fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            updown_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

fn test_vote(id: &str, direction: bool, comment: Option<&str>) -> vote::Model {
    vote::Model {
        id: id.to_string(),
        votable_type: "post".to_string(),
        votable_id: "p1".to_string(),
        voter_type: "user".to_string(),
        voter_id: "u1".to_string(),
        direction,
        comment: comment.map(ToString::to_string),
        feedback_tags: json!([]),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_vote_up_creates_vote() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<vote::Model>::new()])
        .append_query_results([[test_vote("v1", true, Some("great"))]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/up",
            &json!({
                "votableType": "post",
                "votableId": "p1",
                "voterType": "user",
                "voterId": "u1",
                "comment": "great",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["saved"], json!(true));
    assert_eq!(body["data"]["vote"]["direction"], json!("up"));
    assert_eq!(body["data"]["vote"]["comment"], json!("great"));
}

#[tokio::test]
async fn test_vote_up_with_unknown_tag_is_rejected() {
    // Only the pair lookup is mocked; the rejected write never reaches
    // storage.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<vote::Model>::new()])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/up",
            &json!({
                "votableType": "post",
                "votableId": "p1",
                "voterType": "user",
                "voterId": "u1",
                "feedbackTags": ["spam"],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["data"]["saved"], json!(false));
    assert_eq!(body["data"]["errors"][0]["kind"], json!("inclusion"));
    assert_eq!(body["data"]["errors"][0]["invalid"][0], json!("spam"));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_vote_up_with_empty_reference_is_bad_request() {
    // Caught at the request boundary before the engine runs; the mock
    // would panic on any query.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/up",
            &json!({
                "votableType": "post",
                "votableId": "",
                "voterType": "user",
                "voterId": "u1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_vote_on_unregistered_kind_is_not_saved() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/up",
            &json!({
                "votableType": "widget",
                "votableId": "w1",
                "voterType": "user",
                "voterId": "u1",
            }),
        ))
        .await
        .unwrap();

    // The false sentinel, not an error.
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["saved"], json!(false));
    assert!(body["data"]["errors"].is_null());
}

#[tokio::test]
async fn test_delete_vote() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/delete",
            &json!({
                "votableType": "post",
                "votableId": "p1",
                "voterType": "user",
                "voterId": "u1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["deleted"], json!(true));
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    let mut row = std::collections::BTreeMap::new();
    row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
    row
}

#[tokio::test]
async fn test_status_reports_counts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_vote("v1", true, None)]])
        .append_query_results([
            vec![count_row(2)],
            vec![count_row(1)],
            vec![count_row(1)],
        ])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/status",
            &json!({
                "votableType": "post",
                "votableId": "p1",
                "voterType": "user",
                "voterId": "u1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["voted"], json!(true));
    assert_eq!(body["data"]["direction"], json!("up"));
    assert_eq!(body["data"]["counts"]["total"], json!(3));
    assert_eq!(body["data"]["counts"]["score"], json!(1));
}

#[tokio::test]
async fn test_list_rejects_unknown_direction() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/votes/list",
            &json!({
                "votableType": "post",
                "votableId": "p1",
                "direction": "sideways",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_admin_requires_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json("/api/admin/feedback-options", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_catalog_roundtrip() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = create_test_state(db);
    let app = create_app(state.clone());

    let mut request = post_json(
        "/api/admin/feedback-options/update",
        &json!({ "options": ["insightful", "funny"] }),
    );
    request
        .headers_mut()
        .insert("Authorization", "Bearer secret".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"], json!(["insightful", "funny"]));

    // The live handle now validates against the replacement set.
    assert_eq!(
        state.catalog.current_tags(),
        vec!["insightful".to_string(), "funny".to_string()]
    );
}

#[tokio::test]
async fn test_health_check() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/metrics/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
