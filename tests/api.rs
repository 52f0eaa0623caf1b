//! Router-level tests against the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use todo_sdk::{app_router, AppState, MemoryStore};
use tower::ServiceExt;

fn app() -> Router {
    app_router(AppState::new(MemoryStore::new()), 64 * 1024)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn signup(app: &Router, name: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/signup",
        Some(json!({
            "username": name,
            "email": format!("{}@example.com", name),
            "password": "secret",
            "confirm_password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

async fn create_task(app: &Router, user_id: i64, title: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "user_id": user_id, "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

fn titles(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_and_ready() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = call(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
    let (status, body) = call(&app, Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "todo-sdk");
}

#[tokio::test]
async fn signup_returns_id_and_rejects_duplicates() {
    let app = app();
    let id = signup(&app, "ada").await;
    assert!(id > 0);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({
            "username": "ada",
            "email": "other@example.com",
            "password": "x",
            "confirm_password": "x"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn signup_validation() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({ "username": "bob", "email": "bob@example.com", "password": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "a",
            "confirm_password": "b"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("do not match"));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn login_hides_password_and_rejects_bad_credentials() {
    let app = app();
    let id = signup(&app, "carol").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "carol", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["email"], "carol@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let (wrong, wrong_body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "carol", "password": "nope" })),
    )
    .await;
    let (unknown, unknown_body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "nobody", "password": "secret" })),
    )
    .await;
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let (status, _) = call(&app, Method::POST, "/api/login", Some(json!({ "username": "carol" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_user_found_missing_and_bad_id() {
    let app = app();
    let id = signup(&app, "dan").await;
    let (status, body) = call(&app, Method::GET, &format!("/api/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "dan");

    let (status, body) = call(&app, Method::GET, "/api/users/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = call(&app, Method::GET, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_task_defaults_and_validation() {
    let app = app();
    let user = signup(&app, "erin").await;

    let task = create_task(&app, user, "Buy milk").await;
    assert_eq!(task["priority"], "Low");
    assert_eq!(task["completed"], false);
    assert_eq!(task["user_id"].as_i64(), Some(user));
    assert!(task["description"].is_null());

    let (status, _) = call(&app, Method::POST, "/api/tasks", Some(json!({ "user_id": user }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "user_id": user, "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "user_id": 4242, "title": "Orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn priority_is_enumerated_and_case_insensitive() {
    let app = app();
    let user = signup(&app, "fay").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "user_id": user, "title": "Taxes", "priority": "uRgEnT" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority"], "Urgent");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "user_id": user, "title": "Taxes", "priority": "someday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let id = body_id(&create_task(&app, user, "Call mum").await);
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/tasks/{}", id),
        Some(json!({ "priority": "later" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn body_id(task: &Value) -> i64 {
    task["id"].as_i64().unwrap()
}

#[tokio::test]
async fn update_task_partial_and_clearing() {
    let app = app();
    let user = signup(&app, "gus").await;
    let (_, created) = call(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({
            "user_id": user,
            "title": "Draft",
            "description": "first pass",
            "due_date": "2026-11-01",
            "priority": "Medium"
        })),
    )
    .await;
    let id = body_id(&created);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/tasks/{}", id),
        Some(json!({ "title": "Final", "description": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Final");
    assert!(body["description"].is_null());
    assert_eq!(body["due_date"], "2026-11-01");
    assert_eq!(body["priority"], "Medium");

    let (status, body) = call(&app, Method::PUT, &format!("/api/tasks/{}", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/tasks/{}", id),
        Some(json!({ "title": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_unknown_task_is_not_found_for_any_payload() {
    let app = app();
    let payloads = [
        json!({}),
        json!({ "title": "x" }),
        json!({ "priority": "bogus" }),
        json!({ "title": 5 }),
        json!({ "completed": "yes" }),
        json!(["not", "an", "object"]),
    ];
    for payload in payloads {
        let (status, body) = call(&app, Method::PUT, "/api/tasks/777", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "payload {}", payload);
        assert_eq!(body["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn mistyped_update_of_existing_task_is_bad_request() {
    let app = app();
    let user = signup(&app, "uma").await;
    let id = body_id(&create_task(&app, user, "Typed").await);
    for payload in [json!({ "title": 5 }), json!({ "completed": "yes" })] {
        let (status, body) = call(&app, Method::PUT, &format!("/api/tasks/{}", id), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn oversized_body_uses_error_envelope() {
    let app = app_router(AppState::new(MemoryStore::new()), 1024);
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "x".repeat(4096), "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let app = app();
    for uri in ["/api/nope", "/nothing/here"] {
        let (status, body) = call(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
        assert!(body["error"]["message"].as_str().unwrap().contains(uri));
    }
}

#[tokio::test]
async fn completion_toggle_and_filtering() {
    let app = app();
    let user = signup(&app, "hal").await;
    let a = body_id(&create_task(&app, user, "A").await);
    create_task(&app, user, "B").await;

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/tasks/completion/{}", a),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert!(!body["completed_at"].is_null());

    let (_, done) = call(&app, Method::GET, &format!("/api/tasks/{}?completed=true", user), None).await;
    assert_eq!(titles(&done), vec!["A"]);
    let (_, open) = call(&app, Method::GET, &format!("/api/tasks/{}?completed=FALSE", user), None).await;
    assert_eq!(titles(&open), vec!["B"]);
    let (_, all) = call(&app, Method::GET, &format!("/api/tasks/{}", user), None).await;
    assert_eq!(titles(&all), vec!["A", "B"]);

    let (status, _) = call(&app, Method::GET, &format!("/api/tasks/{}?completed=maybe", user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/tasks/completion/{}", a),
        Some(json!({ "completed": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["completed_at"].is_null());
}

#[tokio::test]
async fn completion_requires_flag_before_lookup() {
    let app = app();
    let (status, _) = call(&app, Method::PATCH, "/api/tasks/completion/99", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(
        &app,
        Method::PATCH,
        "/api/tasks/completion/99",
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_twice() {
    let app = app();
    let user = signup(&app, "ivy").await;
    let id = body_id(&create_task(&app, user, "Once").await);

    let (status, body) = call(&app, Method::DELETE, &format!("/api/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted");
    let (status, _) = call(&app, Method::DELETE, &format!("/api/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pagination_in_id_order() {
    let app = app();
    let user = signup(&app, "jon").await;
    for i in 1..=5 {
        create_task(&app, user, &format!("t{}", i)).await;
    }
    let (_, page) = call(&app, Method::GET, &format!("/api/tasks/{}?limit=2&offset=1", user), None).await;
    assert_eq!(titles(&page), vec!["t2", "t3"]);
    let (_, tail) = call(&app, Method::GET, &format!("/api/tasks/{}?limit=10&offset=4", user), None).await;
    assert_eq!(titles(&tail), vec!["t5"]);
    let (status, _) = call(&app, Method::GET, &format!("/api/tasks/{}?limit=-1", user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, Method::GET, "/api/tasks/0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lists_are_scoped_to_the_owner() {
    let app = app();
    let kim = signup(&app, "kim").await;
    let lee = signup(&app, "lee").await;
    create_task(&app, kim, "mine").await;
    let (status, body) = call(&app, Method::GET, &format!("/api/tasks/{}", lee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sweep_removes_only_completed_tasks() {
    let app = app();
    let user = signup(&app, "max").await;
    let done = body_id(&create_task(&app, user, "done").await);
    let reopened = body_id(&create_task(&app, user, "reopened").await);
    create_task(&app, user, "open").await;
    for id in [done, reopened] {
        call(
            &app,
            Method::PATCH,
            &format!("/api/tasks/completion/{}", id),
            Some(json!({ "completed": true })),
        )
        .await;
    }
    call(
        &app,
        Method::PATCH,
        &format!("/api/tasks/completion/{}", reopened),
        Some(json!({ "completed": false })),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/users/{}/completed-tasks", user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 0, "default retention keeps fresh completions");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/users/{}/completed-tasks?older_than_days=0", user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (_, all) = call(&app, Method::GET, &format!("/api/tasks/{}", user), None).await;
    assert_eq!(titles(&all), vec!["reopened", "open"]);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/users/{}/completed-tasks?older_than_days=5000", user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
