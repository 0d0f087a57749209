//! Role API routes
//!
//! - `POST /api/v1/roles` - Create a role
//! - `GET /api/v1/roles` - List roles (`page`, `page_size`)
//! - `GET /api/v1/roles/:id` - Get a role and its permissions
//! - `PUT /api/v1/roles/:id` - Update name and/or description
//! - `DELETE /api/v1/roles/:id` - Soft-delete a role
//! - `POST /api/v1/roles/:id/permissions` - Grant a permission
//! - `DELETE /api/v1/roles/:id/permissions/:permission_id` - Revoke a permission

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
        CreateRoleCommand, CreateRoleError, DeleteRoleCommand, DeleteRoleError,
        GrantPermissionCommand, GrantPermissionError, RevokePermissionCommand, UpdateRoleCommand,
        UpdateRoleError,
    },
    queries::{GetRoleError, GetRoleQuery, ListRolesError, ListRolesQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::audit::AuditContext;
use crate::features::FeatureState;

/// RBAC resource name guarding these routes
pub const RESOURCE: &str = "role";

pub fn roles_routes(state: &FeatureState) -> Router<FeatureState> {
    Router::new()
        .route("/", state.guard(RESOURCE, "create", post(create_role)))
        .route("/", state.guard(RESOURCE, "read", get(list_roles)))
        .route("/:id", state.guard(RESOURCE, "read", get(get_role)))
        .route("/:id", state.guard(RESOURCE, "update", put(update_role)))
        .route("/:id", state.guard(RESOURCE, "delete", delete(delete_role)))
        .route("/:id/permissions", state.guard(RESOURCE, "grant", post(grant_permission)))
        .route(
            "/:id/permissions/:permission_id",
            state.guard(RESOURCE, "grant", delete(revoke_permission)),
        )
}

#[tracing::instrument(skip(state, ctx))]
async fn create_role(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Json(command): Json<CreateRoleCommand>,
) -> Result<Response, RoleApiError> {
    let role =
        super::commands::create::handle(state.pool.clone(), &state.pipeline, &ctx, command)
            .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(role))).into_response())
}

#[tracing::instrument(skip(state, ctx, command))]
async fn update_role(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Path(id): Path<i64>,
    Json(mut command): Json<UpdateRoleCommand>,
) -> Result<Response, RoleApiError> {
    command.id = id;

    let role =
        super::commands::update::handle(state.pool.clone(), &state.pipeline, &ctx, command)
            .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(role))).into_response())
}

#[tracing::instrument(skip(state, ctx))]
async fn delete_role(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Path(id): Path<i64>,
) -> Result<Response, RoleApiError> {
    let response = super::commands::delete::handle(
        state.pool.clone(),
        &state.pipeline,
        &ctx,
        DeleteRoleCommand { id },
    )
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, command))]
async fn grant_permission(
    State(state): State<FeatureState>,
    Path(role_id): Path<i64>,
    Json(mut command): Json<GrantPermissionCommand>,
) -> Result<Response, RoleApiError> {
    command.role_id = role_id;

    let response = super::commands::grant::grant(state.pool.clone(), command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state))]
async fn revoke_permission(
    State(state): State<FeatureState>,
    Path((role_id, permission_id)): Path<(i64, i64)>,
) -> Result<Response, RoleApiError> {
    super::commands::grant::revoke(
        state.pool.clone(),
        RevokePermissionCommand {
            role_id,
            permission_id,
        },
    )
    .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[tracing::instrument(skip(state))]
async fn get_role(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
) -> Result<Response, RoleApiError> {
    let role = super::queries::get::handle(state.pool.clone(), GetRoleQuery { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(role))).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_roles(
    State(state): State<FeatureState>,
    Query(query): Query<ListRolesQuery>,
) -> Result<Response, RoleApiError> {
    let response = super::queries::list::handle(state.pool.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

/// Unified error type for role API endpoints
#[derive(Debug, thiserror::Error)]
enum RoleApiError {
    #[error(transparent)]
    Create(#[from] CreateRoleError),
    #[error(transparent)]
    Update(#[from] UpdateRoleError),
    #[error(transparent)]
    Delete(#[from] DeleteRoleError),
    #[error(transparent)]
    Grant(#[from] GrantPermissionError),
    #[error(transparent)]
    Get(#[from] GetRoleError),
    #[error(transparent)]
    List(#[from] ListRolesError),
}

impl RoleApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Create(CreateRoleError::Name(_))
            | Self::Update(UpdateRoleError::Name(_))
            | Self::Update(UpdateRoleError::NoFieldsToUpdate) => StatusCode::BAD_REQUEST,

            Self::Create(CreateRoleError::DuplicateName(_))
            | Self::Update(UpdateRoleError::DuplicateName(_)) => StatusCode::CONFLICT,

            Self::Update(UpdateRoleError::NotFound(_))
            | Self::Delete(DeleteRoleError::NotFound(_))
            | Self::Grant(GrantPermissionError::RoleNotFound(_))
            | Self::Grant(GrantPermissionError::PermissionNotFound(_))
            | Self::Grant(GrantPermissionError::NotGranted { .. })
            | Self::Get(GetRoleError::NotFound(_)) => StatusCode::NOT_FOUND,

            Self::Create(CreateRoleError::Database(_))
            | Self::Update(UpdateRoleError::Database(_))
            | Self::Delete(DeleteRoleError::Database(_))
            | Self::Grant(GrantPermissionError::Database(_))
            | Self::Get(GetRoleError::Database(_))
            | Self::List(ListRolesError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RoleApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match status {
            StatusCode::BAD_REQUEST => ErrorResponse::new("VALIDATION_ERROR", self.to_string()),
            StatusCode::CONFLICT => ErrorResponse::new("CONFLICT", self.to_string()),
            StatusCode::NOT_FOUND => ErrorResponse::new("NOT_FOUND", self.to_string()),
            _ => {
                tracing::error!(error = %self, "Role request failed");
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
            },
        };
        (status, Json(error)).into_response()
    }
}
