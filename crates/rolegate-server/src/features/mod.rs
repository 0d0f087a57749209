//! Feature modules implementing the rolegate API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes. Commands that mutate a table go through the shared
//! [`Pipeline`], so the audit trail sees them without the handler doing
//! anything audit-specific.
//!
//! # Features
//!
//! - **auth**: login and token issuance
//! - **users**: user management and role assignment
//! - **roles**: role management and permission grants
//! - **permissions**: permission catalogue and the RBAC lookup
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations (create, update, delete)
//! - `queries/` - Read operations (get, list)
//! - `routes.rs` - HTTP route definitions

pub mod auth;
pub mod permissions;
pub mod roles;
pub mod shared;
pub mod users;

use axum::{middleware, routing::MethodRouter, Router};
use sqlx::PgPool;

use crate::auth::{
    middleware::{require_permission, PermissionRule},
    TokenService,
};
use crate::db::pipeline::Pipeline;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Business connection pool
    pub pool: PgPool,
    /// Audited mutation pipeline
    pub pipeline: Pipeline,
    /// Token issuer used by login
    pub tokens: TokenService,
    /// Whether management routes check role permissions
    pub rbac_enforce: bool,
}

impl FeatureState {
    /// Wrap `route` in a permission check when RBAC enforcement is on
    pub fn guard(
        &self,
        resource: &'static str,
        action: &'static str,
        route: MethodRouter<FeatureState>,
    ) -> MethodRouter<FeatureState> {
        if !self.rbac_enforce {
            return route;
        }

        let rule = PermissionRule::new(self.pool.clone(), resource, action);
        route.route_layer(middleware::from_fn_with_state(rule, require_permission))
    }
}

/// Creates the main API router with all feature routes mounted
///
/// - `/login` - Token issuance
/// - `/users` - User management
/// - `/roles` - Role management
/// - `/permissions` - Permission catalogue
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(auth::auth_routes())
        .nest("/users", users::users_routes(&state))
        .nest("/roles", roles::roles_routes(&state))
        .nest("/permissions", permissions::permissions_routes(&state))
        .with_state(state)
}
