//! Update role command
//!
//! Loads the live role first and hands it to the pipeline as the update
//! target, so the audit pre-image is read for exactly that row.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::features::shared::{
    error_helpers::map_unique_violation,
    validation::{validate_name, NameValidationError},
};
use crate::models::Role;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoleCommand {
    /// Taken from the request path
    #[serde(default)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateRoleError {
    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
    #[error("{0}")]
    Name(#[from] NameValidationError),
    #[error("Role {0} not found")]
    NotFound(i64),
    #[error("A role named '{0}' already exists")]
    DuplicateName(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpdateRoleCommand {
    pub fn validate(&self) -> Result<(), UpdateRoleError> {
        if self.name.is_none() && self.description.is_none() {
            return Err(UpdateRoleError::NoFieldsToUpdate);
        }
        if let Some(ref name) = self.name {
            validate_name(name, 100)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: UpdateRoleCommand,
) -> Result<Role, UpdateRoleError> {
    command.validate()?;

    let existing =
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL")
            .bind(command.id)
            .fetch_optional(&pool)
            .await?
            .ok_or(UpdateRoleError::NotFound(command.id))?;

    let name = command
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(existing.name.as_str())
        .to_string();
    let description = command.description.clone().or_else(|| existing.description.clone());

    let role: Role = pipeline
        .update(ctx, &existing, async {
            sqlx::query_as::<_, Role>(
                r#"
                UPDATE roles
                SET name = $2, description = $3, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(existing.id)
            .bind(&name)
            .bind(description.as_deref())
            .fetch_optional(&pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    UpdateRoleError::DuplicateName(name.clone()),
                    UpdateRoleError::Database,
                )
            })?
            .ok_or(UpdateRoleError::NotFound(existing.id))
        })
        .await?;

    tracing::info!(role_id = role.id, "Role updated");

    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_a_field() {
        let command = UpdateRoleCommand {
            id: 1,
            ..Default::default()
        };
        assert!(matches!(command.validate(), Err(UpdateRoleError::NoFieldsToUpdate)));
    }

    #[test]
    fn test_description_only_is_valid() {
        let command = UpdateRoleCommand {
            id: 1,
            name: None,
            description: Some("Support staff".to_string()),
        };
        assert!(command.validate().is_ok());
    }
}
