//! Request authentication and authorization middleware
//!
//! [`authenticate`] is optional: a valid `Authorization: Bearer` token puts
//! [`Claims`] into the request extensions, anything else passes through
//! untouched. [`require_permission`] then gates individual routes on the
//! RBAC tables.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use super::{Claims, TokenService};
use crate::error::AppError;
use crate::features::permissions::queries::has_permission;

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Attach verified [`Claims`] to the request when a valid bearer token is present
pub async fn authenticate(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    if let Some(token) = token {
        match tokens.verify(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            },
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            },
        }
    }

    next.run(request).await
}

/// Route guard state: which `(resource, action)` pair a route needs
#[derive(Debug, Clone)]
pub struct PermissionRule {
    pub pool: PgPool,
    pub resource: &'static str,
    pub action: &'static str,
}

impl PermissionRule {
    pub fn new(pool: PgPool, resource: &'static str, action: &'static str) -> Self {
        Self {
            pool,
            resource,
            action,
        }
    }
}

/// Reject requests whose caller lacks the rule's permission.
///
/// No claims → `401`, lookup failure → `500`, missing permission → `403`.
pub async fn require_permission(
    State(rule): State<PermissionRule>,
    request: Request,
    next: Next,
) -> Response {
    let Some(user_id) = request.extensions().get::<Claims>().map(|c| c.user_id) else {
        return AppError::Unauthorized("Authentication required".to_string()).into_response();
    };

    match has_permission(&rule.pool, user_id, rule.resource, rule.action).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::info!(
                user_id,
                resource = rule.resource,
                action = rule.action,
                "Permission denied"
            );
            AppError::Forbidden(format!("Missing permission {}:{}", rule.resource, rule.action))
                .into_response()
        },
        Err(e) => AppError::Database(e).into_response(),
    }
}
