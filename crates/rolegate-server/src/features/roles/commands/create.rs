use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::db::pipeline::Pipeline;
use crate::features::shared::{
    error_helpers::map_unique_violation,
    validation::{validate_name, NameValidationError},
};
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleCommand {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateRoleError {
    #[error("{0}")]
    Name(#[from] NameValidationError),
    #[error("A role named '{0}' already exists")]
    DuplicateName(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateRoleCommand {
    pub fn validate(&self) -> Result<(), CreateRoleError> {
        validate_name(&self.name, 100)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool, pipeline))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: CreateRoleCommand,
) -> Result<Role, CreateRoleError> {
    command.validate()?;
    let name = command.name.trim().to_string();

    let role: Role = pipeline
        .create(ctx, async {
            sqlx::query_as::<_, Role>(
                "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING *",
            )
            .bind(&name)
            .bind(command.description.as_deref())
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    CreateRoleError::DuplicateName(name.clone()),
                    CreateRoleError::Database,
                )
            })
        })
        .await?;

    tracing::info!(role_id = role.id, role = %role.name, "Role created");

    Ok(role)
}
