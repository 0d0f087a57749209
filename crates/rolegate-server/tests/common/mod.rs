//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use rolegate_server::{api, auth::hash_password, config::Config};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub const CLIENT_IP: &str = "198.51.100.7";

/// Insert a live user directly, bypassing the audited pipeline
pub async fn seed_user(pool: &PgPool, email: &str, password: &str) -> i64 {
    let hash = hash_password(password).expect("hash password");
    sqlx::query_scalar("INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id")
        .bind("Seed")
        .bind(email)
        .bind(hash)
        .fetch_one(pool)
        .await
        .expect("seed user")
}

/// Full application router over one pool, with the given RBAC mode
pub fn app(pool: &PgPool, rbac_enforce: bool) -> Router {
    let mut config = Config::default();
    config.auth.rbac_enforce = rbac_enforce;
    let state = api::build_state(&config, pool.clone(), pool.clone());
    api::build_router(state, &config)
}

/// Send a JSON request and return the status with the parsed body
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (Response<()>, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (Response::from_parts(parts, ()), json)
}

/// Log in and return the bearer token
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (response, body) = send(
        app,
        "POST",
        "/api/v1/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), 200, "login failed: {body}");
    body["data"]["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}
