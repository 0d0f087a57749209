//! End-to-end API tests through the full router and middleware stack

use rolegate_server::audit::PgAuditStore;
use serde_json::json;
use sqlx::PgPool;

mod common;

use common::{app, login, seed_user, send, CLIENT_IP};

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_health_reports_ok(pool: PgPool) {
    let app = app(&pool, false);

    let (response, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_rejects_wrong_password(pool: PgPool) {
    seed_user(&pool, "admin@example.com", "secret123").await;
    let app = app(&pool, false);

    let (response, body) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong-pass" })),
    )
    .await;

    assert_eq!(response.status(), 401);
    assert_eq!(body["success"], false);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_authenticated_create_is_attributed(pool: PgPool) {
    let admin_id = seed_user(&pool, "admin@example.com", "secret123").await;
    let app = app(&pool, false);
    let token = login(&app, "admin@example.com", "secret123").await;

    let (response, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        Some(&token),
        Some(json!({ "name": "Grace", "email": "grace@example.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(response.status(), 201, "{body}");
    assert!(body["data"].get("password").is_none());
    let id = body["data"]["id"].as_i64().unwrap();

    let trail = PgAuditStore::new(pool.clone())
        .trail_for_record("users", id as u64)
        .await
        .unwrap();

    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].user_id, admin_id);
    assert_eq!(trail[0].ip, CLIENT_IP);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_unauthenticated_mutation_is_anonymous(pool: PgPool) {
    let app = app(&pool, false);

    let (response, body) = send(
        &app,
        "POST",
        "/api/v1/roles",
        None,
        Some(json!({ "name": "viewer" })),
    )
    .await;
    assert_eq!(response.status(), 201, "{body}");
    let id = body["data"]["id"].as_i64().unwrap();

    let trail = PgAuditStore::new(pool.clone())
        .trail_for_record("roles", id as u64)
        .await
        .unwrap();

    assert_eq!(trail[0].user_id, 0);
    assert_eq!(trail[0].ip, CLIENT_IP);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_email_is_conflict(pool: PgPool) {
    seed_user(&pool, "taken@example.com", "secret123").await;
    let app = app(&pool, false);

    let (response, _) = send(
        &app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({ "name": "Dup", "email": "taken@example.com", "password": "secret123" })),
    )
    .await;

    assert_eq!(response.status(), 409);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_list_users_pagination_meta(pool: PgPool) {
    for i in 0..3 {
        seed_user(&pool, &format!("user{i}@example.com"), "secret123").await;
    }
    let app = app(&pool, false);

    let (response, body) = send(&app, "GET", "/api/v1/users?page=1&page_size=2", None, None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["pagination"]["total"], 3);
    assert_eq!(body["meta"]["pagination"]["has_next"], true);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_rbac_requires_claims_then_permission(pool: PgPool) {
    let user_id = seed_user(&pool, "staff@example.com", "secret123").await;
    let app = app(&pool, true);

    let (response, _) = send(&app, "GET", "/api/v1/users", None, None).await;
    assert_eq!(response.status(), 401);

    let token = login(&app, "staff@example.com", "secret123").await;
    let (response, _) = send(&app, "GET", "/api/v1/users", Some(&token), None).await;
    assert_eq!(response.status(), 403);

    let role_id: i64 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ('reader') RETURNING id")
        .fetch_one(&pool)
        .await
        .unwrap();
    let permission_id: i64 = sqlx::query_scalar(
        "INSERT INTO permissions (resource, action) VALUES ('user', 'read') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
        .bind(role_id)
        .bind(permission_id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(role_id)
        .execute(&pool)
        .await
        .unwrap();

    let (response, _) = send(&app, "GET", "/api/v1/users", Some(&token), None).await;
    assert_eq!(response.status(), 200);
}
