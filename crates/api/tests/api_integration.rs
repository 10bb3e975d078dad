//! API integration tests.
//!
//! Requests go through the full router, auth middleware included, against a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware,
    response::Response,
};
use chrono::Utc;
use pitchboard_api::{AppState, auth_middleware, router as api_router};
use pitchboard_common::LocalStorage;
use pitchboard_core::{PolicyTable, TrustedHeaderIdentityProvider};
use pitchboard_db::entities::{
    criteria, project,
    project::{Category, ProjectStatus},
    project_image, vote,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use serde_json::Value as Json;
use tower::ServiceExt;

fn create_test_project(id: &str, creator_id: &str, vote_count: i32) -> project::Model {
    project::Model {
        id: id.to_string(),
        name: format!("Project {id}"),
        description: String::new(),
        category: Category::App,
        creator_id: creator_id.to_string(),
        status: ProjectStatus::Published,
        is_featured: false,
        repository_link: None,
        live_link: None,
        vote_count,
        average_score: 0.0,
        rating_count: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn create_test_vote(user_id: &str, project_id: &str) -> vote::Model {
    vote::Model {
        id: "v1".to_string(),
        user_id: user_id.to_string(),
        project_id: project_id.to_string(),
        created_at: Utc::now().into(),
    }
}

/// Build the router the way the server does, over the given mock database.
fn create_test_router(db: DatabaseConnection) -> Router {
    let storage = LocalStorage::new(
        std::env::temp_dir().join("pitchboard-api-tests"),
        "/media".to_string(),
    );
    let state = AppState::new(
        Arc::new(db),
        Arc::new(storage),
        Arc::new(TrustedHeaderIdentityProvider::new("x-user-id")),
        Arc::new(PolicyTable::default()),
        1024 * 1024,
    );

    api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("GET", "/nonexistent", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_vote_is_unauthenticated() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request("POST", "/projects/p1/vote", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_vote_returns_new_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_project("p1", "alice", 0)]])
        .append_query_results([Vec::<vote::Model>::new()])
        .append_query_results([[create_test_vote("bob", "p1")]])
        .append_query_results([[count_row(1)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("POST", "/projects/p1/vote", Some("bob"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Voted successfully");
    assert_eq!(body["vote_count"], 1);
}

#[tokio::test]
async fn test_second_vote_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_project("p1", "alice", 1)]])
        .append_query_results([[create_test_vote("bob", "p1")]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("POST", "/projects/p1/vote", Some("bob"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Already voted");
    assert_eq!(body["code"], "ALREADY_VOTED");
}

#[tokio::test]
async fn test_unvote_without_vote_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_project("p1", "alice", 0)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("DELETE", "/projects/p1/vote", Some("bob"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "Not voted");
}

#[tokio::test]
async fn test_get_missing_project_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<project::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/projects/missing", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_by_non_creator_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_project("p1", "alice", 0)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "PATCH",
            "/projects/p1",
            Some("bob"),
            Some(r#"{"name":"Hijacked"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_projects_keeps_database_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            create_test_project("p3", "alice", 3),
            create_test_project("p1", "alice", 1),
            create_test_project("p0", "alice", 0),
        ]])
        .append_query_results([Vec::<project_image::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/projects?ordering=-vote_count", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let counts: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["vote_count"].as_i64().unwrap())
        .collect();
    assert_eq!(counts, vec![3, 1, 0]);
    assert_eq!(body[0]["has_voted"], false);
    assert_eq!(body[0]["category_display"], "App");
}

#[tokio::test]
async fn test_list_criteria_by_category() {
    let gameplay = criteria::Model {
        id: "c1".to_string(),
        name: "Gameplay".to_string(),
        description: "Fun".to_string(),
        weight: 1.5,
        project_category: Category::Game,
        created_at: Utc::now().into(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[gameplay]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/criteria?category=game", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["name"], "Gameplay");
    assert_eq!(body[0]["project_category"], "game");
}

#[tokio::test]
async fn test_rating_with_criteria_from_other_category() {
    let gameplay = criteria::Model {
        id: "c1".to_string(),
        name: "Gameplay".to_string(),
        description: "Fun".to_string(),
        weight: 1.5,
        project_category: Category::Game,
        created_at: Utc::now().into(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[gameplay]])
        .append_query_results([[create_test_project("p1", "alice", 0)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "POST",
            "/projects/p1/ratings",
            Some("bob"),
            Some(r#"{"criteria_id":"c1","score":7}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "CRITERIA_MISMATCH");
    assert!(body["detail"].as_str().unwrap().contains("Gameplay"));
}

#[tokio::test]
async fn test_create_project_requires_authentication() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(request(
            "POST",
            "/projects",
            None,
            Some(r#"{"name":"Mine","category":"app"}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
    std::collections::BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}
