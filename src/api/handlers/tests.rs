//! Router tests driving the full axum stack against an in-memory store.

use crate::api::router;
use crate::auth::{AccountRecord, DecisionEngine, MemoryAccountStore, StoreConfig};
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn account(uid: &str, email: &str, password: &str, role: &str, is_blocked: bool) -> AccountRecord {
    AccountRecord {
        uid: uid.to_string(),
        email: email.to_string(),
        password: SecretString::from(password.to_string()),
        role: role.to_string(),
        label: "A".to_string(),
        is_blocked,
    }
}

fn app() -> Router {
    let store = MemoryAccountStore::default()
        .with_record(account("7", "a@x.com", "p", "artist", false))
        .with_record(account("8", "blocked@x.com", "p", "artist", true))
        .with_record(account("9", "boss@x.com", "root", "admin", false));

    router(Arc::new(DecisionEngine::new(StoreConfig::configured(store))))
}

fn unconfigured_app() -> Router {
    router(Arc::new(DecisionEngine::new(StoreConfig::Missing)))
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Result<Response> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .context("failed to build request")?,
    )
    .await
    .context("router failed")
}

async fn post_login(app: Router, payload: Value) -> Result<(StatusCode, Value)> {
    let response = send(app, Method::POST, "/", Body::from(payload.to_string())).await?;
    let status = response.status();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes).context("response is not JSON")?;
    Ok((status, body))
}

#[tokio::test]
async fn login_success() -> Result<()> {
    let (status, body) = post_login(
        app(),
        json!({"email": "a@x.com", "password": "p", "role": "artist"}),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "user": {"uid": "7", "email": "a@x.com", "role": "artist", "label": "A"}
        })
    );
    Ok(())
}

#[tokio::test]
async fn login_admin_success() -> Result<()> {
    let (status, body) = post_login(
        app(),
        json!({"email": "boss@x.com", "password": "root", "role": "admin"}),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn login_failures() -> Result<()> {
    let cases = [
        (
            json!({"email": "", "password": "x", "role": "artist"}),
            StatusCode::BAD_REQUEST,
            "Email is required",
        ),
        (
            json!({"email": "a@x.com"}),
            StatusCode::BAD_REQUEST,
            "Password is required",
        ),
        (
            json!({"email": "nobody@x.com", "password": "p", "role": "artist"}),
            StatusCode::UNAUTHORIZED,
            "Invalid email or role",
        ),
        (
            json!({"email": "boss@x.com", "password": "root"}),
            StatusCode::UNAUTHORIZED,
            "Invalid email or role",
        ),
        (
            json!({"email": "a@x.com", "password": "wrong", "role": "artist"}),
            StatusCode::UNAUTHORIZED,
            "Invalid password",
        ),
        (
            json!({"email": "blocked@x.com", "password": "p", "role": "artist"}),
            StatusCode::FORBIDDEN,
            "User is blocked",
        ),
    ];

    for (payload, expected_status, expected_error) in cases {
        let (status, body) = post_login(app(), payload.clone()).await?;
        assert_eq!(status, expected_status, "payload: {payload}");
        assert_eq!(
            body,
            json!({"success": false, "error": expected_error}),
            "payload: {payload}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn login_without_store_is_server_error() -> Result<()> {
    let (status, body) = post_login(
        unconfigured_app(),
        json!({"email": "a@x.com", "password": "p", "role": "artist"}),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "Server configuration error"})
    );
    Ok(())
}

#[tokio::test]
async fn login_malformed_body() -> Result<()> {
    let response = send(app(), Method::POST, "/", Body::from("{not json")).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Malformed request body");
    Ok(())
}

#[tokio::test]
async fn login_ignores_content_type() -> Result<()> {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(CONTENT_TYPE, "text/plain")
                .body(Body::from(
                    json!({"email": "a@x.com", "password": "p"}).to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn preflight_is_answered_without_body() -> Result<()> {
    let response = send(unconfigured_app(), Method::OPTIONS, "/", Body::empty()).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));
    assert_eq!(
        header("access-control-allow-methods").as_deref(),
        Some("POST, OPTIONS")
    );
    assert_eq!(
        header("access-control-allow-headers").as_deref(),
        Some("Content-Type")
    );
    assert_eq!(header("access-control-max-age").as_deref(), Some("86400"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(bytes.is_empty());
    Ok(())
}

#[tokio::test]
async fn other_methods_are_rejected() -> Result<()> {
    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let response = send(app(), method.clone(), "/", Body::empty()).await?;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "method: {method}"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(
            body,
            json!({"success": false, "error": "Method not supported"})
        );
    }
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_and_propagated() -> Result<()> {
    let response = send(app(), Method::OPTIONS, "/", Body::empty()).await?;
    let generated = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert!(generated.is_some_and(|id| ulid::Ulid::from_string(id).is_ok()));

    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/")
                .header("x-request-id", "abc-123")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    Ok(())
}

#[tokio::test]
async fn health_reports_database() -> Result<()> {
    let response = send(app(), Method::GET, "/health", Body::empty()).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-app").is_some());

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["database"], "ok");
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn health_without_store_is_unavailable() -> Result<()> {
    let response = send(unconfigured_app(), Method::GET, "/health", Body::empty()).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["database"], "unconfigured");
    Ok(())
}
