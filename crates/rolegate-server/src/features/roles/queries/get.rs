use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::{Permission, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRoleQuery {
    pub id: i64,
}

/// A role with the permissions it grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetRoleError {
    #[error("Role {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetRoleQuery) -> Result<RoleDetail, GetRoleError> {
    let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL")
        .bind(query.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(GetRoleError::NotFound(query.id))?;

    let permissions = sqlx::query_as::<_, Permission>(
        r#"
        SELECT p.*
        FROM permissions p
        JOIN role_permissions rp ON rp.permission_id = p.id
        WHERE rp.role_id = $1
        ORDER BY p.resource, p.action
        "#,
    )
    .bind(role.id)
    .fetch_all(&pool)
    .await?;

    Ok(RoleDetail { role, permissions })
}
