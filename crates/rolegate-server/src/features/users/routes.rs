//! User API routes
//!
//! - `POST /api/v1/users` - Create a user
//! - `GET /api/v1/users` - List users (`page`, `page_size`)
//! - `GET /api/v1/users/:id` - Get a user
//! - `PUT /api/v1/users/:id` - Update name and/or status
//! - `DELETE /api/v1/users/:id` - Soft-delete a user
//! - `PUT /api/v1/users/:id/roles` - Replace the user's roles
//!
//! With RBAC enforcement on, each route requires the `user` permission for
//! its action (`create`, `read`, `update`, `delete`, `assign`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;

use super::{
    commands::{
        AssignRolesCommand, AssignRolesError, CreateUserCommand, CreateUserError,
        DeleteUserCommand, DeleteUserError, UpdateUserCommand, UpdateUserError,
    },
    queries::{GetUserError, GetUserQuery, ListUsersError, ListUsersQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::audit::AuditContext;
use crate::features::FeatureState;

/// RBAC resource name guarding these routes
pub const RESOURCE: &str = "user";

pub fn users_routes(state: &FeatureState) -> Router<FeatureState> {
    Router::new()
        .route("/", state.guard(RESOURCE, "create", post(create_user)))
        .route("/", state.guard(RESOURCE, "read", get(list_users)))
        .route("/:id", state.guard(RESOURCE, "read", get(get_user)))
        .route("/:id", state.guard(RESOURCE, "update", put(update_user)))
        .route("/:id", state.guard(RESOURCE, "delete", delete(delete_user)))
        .route("/:id/roles", state.guard(RESOURCE, "assign", put(assign_roles)))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

#[tracing::instrument(skip(state, ctx, command), fields(email = %command.email))]
async fn create_user(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Json(command): Json<CreateUserCommand>,
) -> Result<Response, UserApiError> {
    let user =
        super::commands::create::handle(state.pool.clone(), &state.pipeline, &ctx, command)
            .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))).into_response())
}

#[tracing::instrument(skip(state, ctx, command))]
async fn update_user(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Path(id): Path<i64>,
    Json(mut command): Json<UpdateUserCommand>,
) -> Result<Response, UserApiError> {
    command.id = id;

    let user =
        super::commands::update::handle(state.pool.clone(), &state.pipeline, &ctx, command)
            .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(user))).into_response())
}

#[tracing::instrument(skip(state, ctx))]
async fn delete_user(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Path(id): Path<i64>,
) -> Result<Response, UserApiError> {
    let response = super::commands::delete::handle(
        state.pool.clone(),
        &state.pipeline,
        &ctx,
        DeleteUserCommand { id },
    )
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, command))]
async fn assign_roles(
    State(state): State<FeatureState>,
    Path(user_id): Path<i64>,
    Json(mut command): Json<AssignRolesCommand>,
) -> Result<Response, UserApiError> {
    command.user_id = user_id;

    let response = super::commands::assign_roles::handle(state.pool.clone(), command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(state))]
async fn get_user(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
) -> Result<Response, UserApiError> {
    let user = super::queries::get::handle(state.pool.clone(), GetUserQuery { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(user))).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_users(
    State(state): State<FeatureState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Response, UserApiError> {
    let response = super::queries::list::handle(state.pool.clone(), query).await?;

    tracing::debug!(
        count = response.items.len(),
        total = response.pagination.total,
        "Users listed via API"
    );

    let meta = json!({ "pagination": response.pagination });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for user API endpoints
#[derive(Debug, thiserror::Error)]
enum UserApiError {
    #[error(transparent)]
    Create(#[from] CreateUserError),
    #[error(transparent)]
    Update(#[from] UpdateUserError),
    #[error(transparent)]
    Delete(#[from] DeleteUserError),
    #[error(transparent)]
    AssignRoles(#[from] AssignRolesError),
    #[error(transparent)]
    Get(#[from] GetUserError),
    #[error(transparent)]
    List(#[from] ListUsersError),
}

impl UserApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Create(CreateUserError::Name(_))
            | Self::Create(CreateUserError::Email(_))
            | Self::Create(CreateUserError::PasswordTooShort)
            | Self::Update(UpdateUserError::Name(_))
            | Self::Update(UpdateUserError::InvalidStatus(_))
            | Self::AssignRoles(AssignRolesError::InvalidRoleId)
            | Self::AssignRoles(AssignRolesError::UnknownRole) => StatusCode::BAD_REQUEST,

            Self::Create(CreateUserError::DuplicateEmail(_)) => StatusCode::CONFLICT,

            Self::Update(UpdateUserError::NotFound(_))
            | Self::Delete(DeleteUserError::NotFound(_))
            | Self::AssignRoles(AssignRolesError::UserNotFound(_))
            | Self::Get(GetUserError::NotFound(_)) => StatusCode::NOT_FOUND,

            Self::Create(CreateUserError::Hashing(_))
            | Self::Create(CreateUserError::Database(_))
            | Self::Update(UpdateUserError::Database(_))
            | Self::Delete(DeleteUserError::Database(_))
            | Self::AssignRoles(AssignRolesError::Database(_))
            | Self::Get(GetUserError::Database(_))
            | Self::List(ListUsersError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match status {
            StatusCode::BAD_REQUEST => ErrorResponse::new("VALIDATION_ERROR", self.to_string()),
            StatusCode::CONFLICT => ErrorResponse::new("CONFLICT", self.to_string()),
            StatusCode::NOT_FOUND => ErrorResponse::new("NOT_FOUND", self.to_string()),
            _ => {
                tracing::error!(error = %self, "User request failed");
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
            },
        };
        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            UserApiError::from(CreateUserError::DuplicateEmail("a@x.com".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            UserApiError::from(CreateUserError::PasswordTooShort).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UserApiError::from(DeleteUserError::NotFound(4)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            UserApiError::from(GetUserError::Database(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display_passes_through() {
        let err = UserApiError::from(UpdateUserError::InvalidStatus(5));
        assert!(err.to_string().contains("got 5"));
    }
}
