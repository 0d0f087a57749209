use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRoleCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRoleResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteRoleError {
    #[error("Role {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Soft-deletes the role and drops its user assignments
#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: DeleteRoleCommand,
) -> Result<DeleteRoleResponse, DeleteRoleError> {
    if command.id <= 0 {
        return Err(DeleteRoleError::NotFound(command.id));
    }

    let affected = pipeline
        .delete_by_id::<Role, DeleteRoleError, _>(ctx, command.id, async {
            let mut tx = pool.begin().await?;

            let result = sqlx::query(
                "UPDATE roles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(command.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
                    .bind(command.id)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok::<_, DeleteRoleError>(result.rows_affected())
        })
        .await?;

    if affected == 0 {
        return Err(DeleteRoleError::NotFound(command.id));
    }

    tracing::info!(role_id = command.id, "Role deleted");

    Ok(DeleteRoleResponse {
        id: command.id,
        deleted: true,
    })
}
