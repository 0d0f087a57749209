use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::Permission;

/// List the permission catalogue, optionally for one resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPermissionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListPermissionsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListPermissionsQuery,
) -> Result<Vec<Permission>, ListPermissionsError> {
    let permissions = sqlx::query_as::<_, Permission>(
        r#"
        SELECT * FROM permissions
        WHERE ($1::TEXT IS NULL OR resource = $1)
        ORDER BY resource, action
        "#,
    )
    .bind(query.resource.as_deref())
    .fetch_all(&pool)
    .await?;

    Ok(permissions)
}
