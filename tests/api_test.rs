//! HTTP-level tests: requests go through the full router with `oneshot`.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use orgadmin::{routes, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let db = common::setup().await;
    let mut config = Config::default();
    config.security.bcrypt_cost = 4;
    routes::create_router(AppState::new(db, config))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn department_lifecycle_over_http() {
    let app = app().await;

    let (status, body) =
        call(&app, Method::POST, "/api/dept/create", Some(json!({ "name": "Head Office" }))).await;
    assert_eq!(status, StatusCode::OK);
    let root_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/dept/create",
        Some(json!({ "name": "Branch", "parent_id": root_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/api/dept/tree", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["children"][0]["name"], "Branch");

    // Self-parenting is a client error
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/dept/update/{}", root_id),
        Some(json!({ "parent_id": root_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "direct_cycle");

    let (status, body) =
        call(&app, Method::DELETE, &format!("/api/dept/delete/{}", root_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = call(&app, Method::GET, &format!("/api/dept/{}", root_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn user_password_is_hashed_and_hidden() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/user/create",
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "phone": "13800000001",
            "password": "s3cret-pass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_superuser"], false);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("hashed_password").is_none());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/user/password/{}", id),
        Some(json!({ "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/user/password/{}", id),
        Some(json!({ "password": "another-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/user/create",
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "phone": "13800000002",
            "password": "s3cret-pass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_exists");
}

#[tokio::test]
async fn menu_router_matches_list() {
    let app = app().await;

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/menu/create",
        Some(json!({ "menu_type": "menu", "menu_name": "System", "parent_id": 0 })),
    )
    .await;
    let system_id = body["data"]["id"].as_i64().unwrap();
    call(
        &app,
        Method::POST,
        "/api/menu/create",
        Some(json!({ "menu_type": "button", "menu_name": "Add", "parent_id": system_id })),
    )
    .await;

    let (status, list) = call(&app, Method::GET, "/api/menu/list", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, router) = call(&app, Method::GET, "/api/menu/getRouter", None).await;
    assert_eq!(list["data"], router["data"]);
    assert_eq!(list["data"][0]["menu_name"], "System");
    assert_eq!(list["data"][0]["children"][0]["menu_type"], "button");

    let (_, children) = call(
        &app,
        Method::GET,
        &format!("/api/menu/children?parent_id={}", system_id),
        None,
    )
    .await;
    assert_eq!(children["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn malformed_requests_use_the_error_envelope() {
    let app = app().await;

    let (status, body) =
        call(&app, Method::POST, "/api/dept/create", Some(json!({ "code": "D01" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
    assert_eq!(body["kind"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("name"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/menu/create",
        Some(json!({ "menu_type": "", "menu_name": "Dashboard" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/dept/update/not-a-uuid",
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = call(&app, Method::GET, "/api/user/list?dept_id=zzz", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");
}
