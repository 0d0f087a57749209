//! Assign roles command
//!
//! Replaces the set of roles held by a user in one transaction. Join-table
//! rows have no single-column identity, so these writes bypass the pipeline
//! and are not audited.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::map_foreign_key_violation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignRolesCommand {
    /// Taken from the request path
    #[serde(default)]
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRolesResponse {
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssignRolesError {
    #[error("Role ids must be positive")]
    InvalidRoleId,
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("One or more roles do not exist")]
    UnknownRole,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AssignRolesCommand {
    /// Sorted, de-duplicated role ids
    pub fn normalized_role_ids(&self) -> Vec<i64> {
        let mut ids = self.role_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn validate(&self) -> Result<(), AssignRolesError> {
        if self.role_ids.iter().any(|id| *id <= 0) {
            return Err(AssignRolesError::InvalidRoleId);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: AssignRolesCommand,
) -> Result<AssignRolesResponse, AssignRolesError> {
    command.validate()?;
    let role_ids = command.normalized_role_ids();

    let mut tx = pool.begin().await?;

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
            .bind(command.user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        return Err(AssignRolesError::UserNotFound(command.user_id));
    }

    let live_roles: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id = ANY($1) AND deleted_at IS NULL")
            .bind(&role_ids)
            .fetch_one(&mut *tx)
            .await?;
    if live_roles != role_ids.len() as i64 {
        return Err(AssignRolesError::UnknownRole);
    }

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(command.user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(command.user_id)
        .bind(&role_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_foreign_key_violation(e, AssignRolesError::UnknownRole, AssignRolesError::Database)
        })?;

    tx.commit().await?;

    tracing::info!(
        user_id = command.user_id,
        roles = role_ids.len(),
        "User roles replaced"
    );

    Ok(AssignRolesResponse {
        user_id: command.user_id,
        role_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ids_are_normalized() {
        let command = AssignRolesCommand {
            user_id: 1,
            role_ids: vec![3, 1, 3, 2],
        };
        assert_eq!(command.normalized_role_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_non_positive_role_id_rejected() {
        let command = AssignRolesCommand {
            user_id: 1,
            role_ids: vec![1, 0],
        };
        assert!(matches!(command.validate(), Err(AssignRolesError::InvalidRoleId)));
    }

    #[test]
    fn test_empty_assignment_is_valid() {
        let command = AssignRolesCommand {
            user_id: 1,
            role_ids: vec![],
        };
        assert!(command.validate().is_ok());
    }
}
