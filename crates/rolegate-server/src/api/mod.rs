//! HTTP application assembly
//!
//! [`build_state`] wires the pools into an audited [`Pipeline`];
//! [`build_router`] mounts the feature routes and the middleware stack.

pub mod response;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Duration;
use serde_json::json;
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;

use crate::audit::{ActorContextLayer, AuditInterceptor, PgAuditStore};
use crate::auth::{authenticate, TokenService};
use crate::config::Config;
use crate::db::{self, pipeline::Pipeline};
use crate::features::{self, FeatureState};
use crate::middleware;

/// Build feature state from the business pool and the dedicated audit pool
pub fn build_state(config: &Config, pool: PgPool, audit_pool: PgPool) -> FeatureState {
    let store = Arc::new(PgAuditStore::new(audit_pool.clone()));
    let pipeline = Pipeline::new(audit_pool).with_hook(Arc::new(AuditInterceptor::new(store)));

    let tokens = TokenService::new(
        &config.auth.jwt_secret,
        Duration::minutes(config.auth.jwt_expire_minutes),
    );

    FeatureState {
        pool,
        pipeline,
        tokens,
        rbac_enforce: config.auth.rbac_enforce,
    }
}

/// Create the application router with all routes and middleware
///
/// Layers, outermost first: CORS, request tracing, compression, bearer
/// authentication, actor context. Authentication must run before the actor
/// context so verified claims are visible to it.
pub fn build_router(state: FeatureState, config: &Config) -> Router {
    let tokens = state.tokens.clone();
    let health_pool = state.pool.clone();

    Router::new()
        .route("/health", get(health_check))
        .with_state(health_pool)
        .nest("/api/v1", features::router(state))
        .layer(ActorContextLayer::new())
        .layer(from_fn_with_state(tokens, authenticate))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(pool): State<PgPool>) -> impl IntoResponse {
    match db::health_check(&pool).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        },
    }
}
