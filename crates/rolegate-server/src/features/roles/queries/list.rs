use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::{Paginated, PaginationParams};
use crate::models::Role;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRolesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl ListRolesQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListRolesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListRolesQuery) -> Result<Paginated<Role>, ListRolesError> {
    let params = query.pagination();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL")
        .fetch_one(&pool)
        .await?;

    let roles = sqlx::query_as::<_, Role>(
        "SELECT * FROM roles WHERE deleted_at IS NULL ORDER BY name LIMIT $1 OFFSET $2",
    )
    .bind(params.page_size())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(roles, &params, total))
}
