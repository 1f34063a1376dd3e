use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keycolony::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("keycolony-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = keycolony::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    keycolony::api::router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_banner_and_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");

    let (status, body) = send(&app, "GET", "/api/system/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, body) = send(&app, "GET", "/api/system/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_device_activation_flow() {
    let app = spawn_app().await;
    let identity = json!({ "mac": "aa:bb:cc:dd:ee:ff", "hostname": "PC1" });

    let (status, body) = send(&app, "POST", "/api/devices/check", Some(identity.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["active"], false);
    assert!(body["data"]["key_code"].is_null());
    let id = body["data"]["device_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/devices/{id}/generate-key?user_id=1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = body["data"]["key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 16);
    assert!(body["data"]["expires_at"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices/activate",
        Some(json!({ "mac": "aa:bb:cc:dd:ee:ff", "hostname": "PC1", "key_code": key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);
    assert_eq!(body["data"]["device_id"], id);

    let (_, body) = send(&app, "POST", "/api/devices/check", Some(identity)).await;
    assert_eq!(body["data"]["active"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/devices/{id}/reset?user_id=1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);
    assert!(body["data"]["key_code"].is_null());

    let (_, body) = send(&app, "GET", "/api/logs", None).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["action"].as_str())
        .collect();
    assert_eq!(actions.len(), 3);
    assert!(actions.contains(&"generate_key"));
    assert!(actions.contains(&"activate"));
    assert!(actions.contains(&"reset"));
}

#[tokio::test]
async fn test_invalid_key_is_a_client_error() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices/activate",
        Some(json!({ "mac": "m", "hostname": "h", "key_code": "WRONG" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Key is invalid or has already been used");
}

#[tokio::test]
async fn test_generate_key_authorization() {
    let app = spawn_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/devices/check",
        Some(json!({ "mac": "m", "hostname": "h" })),
    )
    .await;
    let id = body["data"]["device_id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "bob", "password_hash": "x" })),
    )
    .await;
    let bob = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/devices/{id}/generate-key?user_id={bob}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "POST", "/api/devices/999/generate-key?user_id=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", &format!("/api/devices/{id}/generate-key"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_device_update_and_activation_by_id() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices",
        Some(json!({ "mac": "m", "hostname": "h", "key_code": "PRESET" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["added_by"], 1);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/devices",
        Some(json!({ "mac": "m", "hostname": "h" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "PUT", &format!("/api/devices/{id}/update"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/devices/{id}/update"),
        Some(json!({ "active": 1, "expires_at": "2030-01-02T03:04:05Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);
    assert!(body["data"]["activated_at"].is_string());

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/devices/{id}/activate"),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    let (status, _) = send(&app, "DELETE", &format!("/api/devices/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/devices/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users_never_expose_password_hashes() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "alice", "password_hash": "secret-hash", "role": "staff" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "alice", "password_hash": "again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user["username"].is_string());
        assert!(user["role"].is_string());
    }
}

#[tokio::test]
async fn test_primary_admin_delete_is_forbidden() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "DELETE", "/api/users/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_permission_endpoints() {
    let app = spawn_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "alice", "password_hash": "x" })),
    )
    .await;
    let alice = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/permissions/{alice}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], json!(["view_dashboard"]));
    assert_eq!(body["data"]["user"]["username"], "alice");

    let check = json!({ "user_id": alice, "permission": "manage_logs" });
    let (_, body) = send(&app, "POST", "/api/permissions/check", Some(check.clone())).await;
    assert_eq!(body["data"]["has_permission"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/permissions/grant",
        Some(json!({ "user_id": alice, "permission": "manage_logs", "granted_by": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/permissions/grant",
        Some(json!({ "user_id": alice, "permission": "manage_logs" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/permissions/check", Some(check.clone())).await;
    assert_eq!(body["data"]["has_permission"], true);

    let (status, _) = send(&app, "DELETE", "/api/permissions/revoke", Some(check.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/permissions/check", Some(check)).await;
    assert_eq!(body["data"]["has_permission"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/permissions/check",
        Some(json!({ "user_id": 404, "permission": "view_dashboard" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/api/permissions/1", None).await;
    assert_eq!(body["data"]["permissions"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_log_endpoints() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/logs",
        Some(json!({ "mac": "m", "hostname": "h", "action": "note" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["performed_by"], 1);
    let id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        "POST",
        "/api/logs",
        Some(json!({ "mac": "m", "hostname": "h", "action": "note", "performed_by": 1 })),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &format!("/api/logs/{id}?user_id=404"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/api/logs/{id}?user_id=1"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "DELETE", "/api/logs?user_id=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (_, body) = send(&app, "GET", "/api/logs", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
