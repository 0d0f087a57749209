//! Permission API routes
//!
//! - `POST /api/v1/permissions` - Create a permission
//! - `GET /api/v1/permissions` - List permissions (optional `resource` filter)
//! - `DELETE /api/v1/permissions/:id` - Delete a permission

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use super::{
    commands::{
        CreatePermissionCommand, CreatePermissionError, DeletePermissionCommand,
        DeletePermissionError,
    },
    queries::{ListPermissionsError, ListPermissionsQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::audit::AuditContext;
use crate::features::FeatureState;

/// RBAC resource name guarding these routes
pub const RESOURCE: &str = "permission";

pub fn permissions_routes(state: &FeatureState) -> Router<FeatureState> {
    Router::new()
        .route("/", state.guard(RESOURCE, "create", post(create_permission)))
        .route("/", state.guard(RESOURCE, "read", get(list_permissions)))
        .route("/:id", state.guard(RESOURCE, "delete", delete(delete_permission)))
}

#[tracing::instrument(skip(state, ctx))]
async fn create_permission(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Json(command): Json<CreatePermissionCommand>,
) -> Result<Response, PermissionApiError> {
    let permission =
        super::commands::create::handle(state.pool.clone(), &state.pipeline, &ctx, command)
            .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(permission))).into_response())
}

#[tracing::instrument(skip(state, ctx))]
async fn delete_permission(
    State(state): State<FeatureState>,
    ctx: AuditContext,
    Path(id): Path<i64>,
) -> Result<Response, PermissionApiError> {
    let response = super::commands::delete::handle(
        state.pool.clone(),
        &state.pipeline,
        &ctx,
        DeletePermissionCommand { id },
    )
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_permissions(
    State(state): State<FeatureState>,
    Query(query): Query<ListPermissionsQuery>,
) -> Result<Response, PermissionApiError> {
    let permissions = super::queries::list::handle(state.pool.clone(), query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(permissions))).into_response())
}

#[derive(Debug, thiserror::Error)]
enum PermissionApiError {
    #[error(transparent)]
    Create(#[from] CreatePermissionError),
    #[error(transparent)]
    Delete(#[from] DeletePermissionError),
    #[error(transparent)]
    List(#[from] ListPermissionsError),
}

impl IntoResponse for PermissionApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::Create(CreatePermissionError::InvalidResource)
            | Self::Create(CreatePermissionError::InvalidAction) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", self.to_string()),
            ),
            Self::Create(CreatePermissionError::Duplicate { .. }) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("CONFLICT", self.to_string()),
            ),
            Self::Delete(DeletePermissionError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", self.to_string()),
            ),
            Self::Create(CreatePermissionError::Database(_))
            | Self::Delete(DeletePermissionError::Database(_))
            | Self::List(ListPermissionsError::Database(_)) => {
                tracing::error!(error = %self, "Permission request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "A database error occurred"),
                )
            },
        };
        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_conflict() {
        let response = PermissionApiError::from(CreatePermissionError::Duplicate {
            resource: "user".into(),
            action: "read".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_is_not_found() {
        let response = PermissionApiError::from(DeletePermissionError::NotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
