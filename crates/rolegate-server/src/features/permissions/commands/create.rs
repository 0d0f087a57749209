use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::features::shared::{error_helpers::map_unique_violation, validation::is_valid_identifier};
use crate::models::Permission;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionCommand {
    pub resource: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePermissionError {
    #[error("Resource must be 1-100 lowercase letters, digits, '_', '-' or '.'")]
    InvalidResource,
    #[error("Action must be 1-50 lowercase letters, digits, '_', '-' or '.'")]
    InvalidAction,
    #[error("Permission {resource}:{action} already exists")]
    Duplicate { resource: String, action: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreatePermissionCommand {
    pub fn validate(&self) -> Result<(), CreatePermissionError> {
        if !is_valid_identifier(&self.resource, 100) {
            return Err(CreatePermissionError::InvalidResource);
        }
        if !is_valid_identifier(&self.action, 50) {
            return Err(CreatePermissionError::InvalidAction);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: CreatePermissionCommand,
) -> Result<Permission, CreatePermissionError> {
    command.validate()?;

    let permission: Permission = pipeline
        .create(ctx, async {
            sqlx::query_as::<_, Permission>(
                r#"
                INSERT INTO permissions (resource, action, description)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(&command.resource)
            .bind(&command.action)
            .bind(command.description.as_deref())
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    CreatePermissionError::Duplicate {
                        resource: command.resource.clone(),
                        action: command.action.clone(),
                    },
                    CreatePermissionError::Database,
                )
            })
        })
        .await?;

    tracing::info!(
        permission_id = permission.id,
        resource = %permission.resource,
        action = %permission.action,
        "Permission created"
    );

    Ok(permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(resource: &str, action: &str) -> CreatePermissionCommand {
        CreatePermissionCommand {
            resource: resource.to_string(),
            action: action.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_validation() {
        assert!(command("user", "read").validate().is_ok());
        assert!(matches!(
            command("User", "read").validate(),
            Err(CreatePermissionError::InvalidResource)
        ));
        assert!(matches!(
            command("user", "").validate(),
            Err(CreatePermissionError::InvalidAction)
        ));
    }
}
