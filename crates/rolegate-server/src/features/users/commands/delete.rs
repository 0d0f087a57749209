//! Delete user command
//!
//! Soft-deletes a user by stamping `deleted_at`. The row stays in the table,
//! so its email becomes free for a new account while its history remains.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::models::User;

/// Command to delete a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    #[error("User {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handles the delete user command
///
/// # Errors
///
/// - `NotFound` - No live user with the given id
/// - `Database` - A database error occurred
#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    if command.id <= 0 {
        return Err(DeleteUserError::NotFound(command.id));
    }

    let affected = pipeline
        .delete_by_id::<User, DeleteUserError, _>(ctx, command.id, async {
            let result = sqlx::query(
                "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(command.id)
            .execute(&pool)
            .await?;
            Ok::<_, DeleteUserError>(result.rows_affected())
        })
        .await?;

    if affected == 0 {
        return Err(DeleteUserError::NotFound(command.id));
    }

    tracing::info!(user_id = command.id, "User deleted");

    Ok(DeleteUserResponse {
        id: command.id,
        deleted: true,
    })
}
