//! Grant and revoke role permissions
//!
//! `role_permissions` rows are keyed by the pair of ids, so these writes go
//! straight to the pool rather than through the audited pipeline.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::map_foreign_key_violation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantPermissionCommand {
    /// Taken from the request path
    #[serde(default)]
    pub role_id: i64,
    pub permission_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantPermissionResponse {
    pub role_id: i64,
    pub permission_id: i64,
    /// False when the role already held the permission
    pub granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokePermissionCommand {
    pub role_id: i64,
    pub permission_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GrantPermissionError {
    #[error("Role {0} not found")]
    RoleNotFound(i64),
    #[error("Permission {0} not found")]
    PermissionNotFound(i64),
    #[error("Role {role_id} does not hold permission {permission_id}")]
    NotGranted { role_id: i64, permission_id: i64 },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

async fn ensure_live_role(pool: &PgPool, role_id: i64) -> Result<(), GrantPermissionError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM roles WHERE id = $1 AND deleted_at IS NULL")
            .bind(role_id)
            .fetch_optional(pool)
            .await?;
    found
        .map(|_| ())
        .ok_or(GrantPermissionError::RoleNotFound(role_id))
}

#[tracing::instrument(skip(pool))]
pub async fn grant(
    pool: PgPool,
    command: GrantPermissionCommand,
) -> Result<GrantPermissionResponse, GrantPermissionError> {
    ensure_live_role(&pool, command.role_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(command.role_id)
    .bind(command.permission_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        map_foreign_key_violation(
            e,
            GrantPermissionError::PermissionNotFound(command.permission_id),
            GrantPermissionError::Database,
        )
    })?;

    let granted = result.rows_affected() > 0;
    tracing::info!(
        role_id = command.role_id,
        permission_id = command.permission_id,
        granted,
        "Permission granted to role"
    );

    Ok(GrantPermissionResponse {
        role_id: command.role_id,
        permission_id: command.permission_id,
        granted,
    })
}

#[tracing::instrument(skip(pool))]
pub async fn revoke(pool: PgPool, command: RevokePermissionCommand) -> Result<(), GrantPermissionError> {
    let result =
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(command.role_id)
            .bind(command.permission_id)
            .execute(&pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(GrantPermissionError::NotGranted {
            role_id: command.role_id,
            permission_id: command.permission_id,
        });
    }

    tracing::info!(
        role_id = command.role_id,
        permission_id = command.permission_id,
        "Permission revoked from role"
    );
    Ok(())
}
