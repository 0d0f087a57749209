//! Delete permission command
//!
//! Permissions are hard-deleted; grants referencing them cascade away. The
//! row is loaded first and passed to the pipeline, which is what the audit
//! trail records as the last known state once the row is gone.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::models::Permission;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePermissionCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePermissionResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeletePermissionError {
    #[error("Permission {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: DeletePermissionCommand,
) -> Result<DeletePermissionResponse, DeletePermissionError> {
    let permission = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
        .bind(command.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(DeletePermissionError::NotFound(command.id))?;

    let affected = pipeline
        .delete(ctx, &permission, async {
            let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
                .bind(permission.id)
                .execute(&pool)
                .await?;
            Ok::<_, DeletePermissionError>(result.rows_affected())
        })
        .await?;

    if affected == 0 {
        return Err(DeletePermissionError::NotFound(command.id));
    }

    tracing::info!(permission_id = permission.id, "Permission deleted");

    Ok(DeletePermissionResponse {
        id: permission.id,
        deleted: true,
    })
}
