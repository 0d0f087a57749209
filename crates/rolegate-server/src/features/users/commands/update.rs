//! Update user command
//!
//! Partially updates a live user. Fields that are absent, and a blank name,
//! leave the stored value unchanged.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::features::shared::validation::{validate_name, NameValidationError};
use crate::models::{User, UserResponse, USER_STATUS_ACTIVE, USER_STATUS_DISABLED};

/// Command to update an existing user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserCommand {
    /// Taken from the request path
    #[serde(default)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

/// Errors that can occur when updating a user
#[derive(Debug, thiserror::Error)]
pub enum UpdateUserError {
    #[error("{0}")]
    Name(#[from] NameValidationError),
    #[error("Status must be 0 (disabled) or 1 (active), got {0}")]
    InvalidStatus(i32),
    #[error("User {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateUserCommand {
    /// The name to write, with blank input meaning "keep the current one"
    pub fn new_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn validate(&self) -> Result<(), UpdateUserError> {
        if let Some(name) = self.new_name() {
            validate_name(name, 100)?;
        }
        if let Some(status) = self.status {
            if status != USER_STATUS_ACTIVE && status != USER_STATUS_DISABLED {
                return Err(UpdateUserError::InvalidStatus(status));
            }
        }
        Ok(())
    }
}

/// Handles the update user command
///
/// # Errors
///
/// - Validation errors if command parameters are invalid
/// - `NotFound` - No live user with the given id
/// - `Database` - A database error occurred
#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: UpdateUserCommand,
) -> Result<UserResponse, UpdateUserError> {
    command.validate()?;

    let id = u64::try_from(command.id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or(UpdateUserError::NotFound(command.id))?;

    let user: User = pipeline
        .update_by_id(ctx, id, async {
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET name = COALESCE($2, name),
                    status = COALESCE($3, status),
                    updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(command.id)
            .bind(command.new_name())
            .bind(command.status)
            .fetch_optional(&pool)
            .await?
            .ok_or(UpdateUserError::NotFound(command.id))
        })
        .await?;

    tracing::info!(user_id = user.id, "User updated");

    Ok(user.into())
}
