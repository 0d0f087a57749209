//! Append-only audit record stores
//!
//! [`PgAuditStore`] writes through its own connection pool, separate from the
//! pool business statements use. Every append is a single autocommit INSERT,
//! so it lands even when the caller's transaction later rolls back.
//! [`MemoryAuditStore`] keeps records in memory for tests and local tooling.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;

use super::models::{
    AuditRecord, NewAuditRecord, AUDIT_TABLE, DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT,
};

/// Errors raised while persisting or reading audit records
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit store query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{field} {value} does not fit in a BIGINT column")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("Audit store unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Name of the table records are written to
    fn table_name(&self) -> &str;

    /// Persist one record and return it as stored
    async fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError>;
}

fn to_bigint(field: &'static str, value: u64) -> Result<i64, AuditError> {
    i64::try_from(value).map_err(|_| AuditError::OutOfRange { field, value })
}

/// PostgreSQL-backed store on a dedicated pool
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full history of one row, oldest first
    #[tracing::instrument(skip(self))]
    pub async fn trail_for_record(
        &self,
        table_name: &str,
        record_id: u64,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let record_id = to_bigint("record_id", record_id)?;

        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, created_at, table_name, record_id, action,
                   old_values, new_values, user_id, ip
            FROM audit_logs
            WHERE table_name = $1 AND record_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(table_name)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Most recent records attributed to `user_id`, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_AUDIT_QUERY_LIMIT`] and is capped at
    /// [`MAX_AUDIT_QUERY_LIMIT`].
    #[tracing::instrument(skip(self))]
    pub async fn records_by_actor(
        &self,
        user_id: u64,
        limit: Option<i64>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let user_id = to_bigint("user_id", user_id)?;
        let limit = limit
            .unwrap_or(DEFAULT_AUDIT_QUERY_LIMIT)
            .clamp(1, MAX_AUDIT_QUERY_LIMIT);

        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, created_at, table_name, record_id, action,
                   old_values, new_values, user_id, ip
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    fn table_name(&self) -> &str {
        AUDIT_TABLE
    }

    async fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError> {
        let record_id = to_bigint("record_id", record.record_id)?;
        let user_id = to_bigint("user_id", record.user_id)?;

        let stored = sqlx::query_as::<_, AuditRecord>(
            r#"
            INSERT INTO audit_logs (
                table_name, record_id, action, old_values, new_values, user_id, ip
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, created_at, table_name, record_id, action,
                      old_values, new_values, user_id, ip
            "#,
        )
        .bind(&record.table_name)
        .bind(record_id)
        .bind(record.action.as_str())
        .bind(&record.old_values)
        .bind(&record.new_values)
        .bind(user_id)
        .bind(&record.ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of everything appended so far
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    fn table_name(&self) -> &str {
        AUDIT_TABLE
    }

    async fn append(&self, record: NewAuditRecord) -> Result<AuditRecord, AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable("memory store set to fail".to_string()));
        }

        let record_id = to_bigint("record_id", record.record_id)?;
        let user_id = to_bigint("user_id", record.user_id)?;

        let mut records = self.records.lock().await;
        let id = i64::try_from(records.len()).unwrap_or(i64::MAX).saturating_add(1);
        let stored = AuditRecord {
            id,
            created_at: Utc::now(),
            table_name: record.table_name,
            record_id,
            action: record.action.as_str().to_string(),
            old_values: record.old_values,
            new_values: record.new_values,
            user_id,
            ip: record.ip,
        };
        records.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::AuditAction;

    fn record(record_id: u64) -> NewAuditRecord {
        NewAuditRecord::builder()
            .table_name("users")
            .record_id(record_id)
            .action(AuditAction::Create)
            .new_values(r#"{"id":1}"#)
            .user_id(5)
            .ip("10.0.0.2")
            .try_build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_assigns_sequential_ids() {
        let store = MemoryAuditStore::new();
        let first = store.append(record(1)).await.unwrap();
        let second = store.append(record(2)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.action, "create");
        assert_eq!(second.user_id, 5);
        assert_eq!(store.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_failure_toggle() {
        let store = MemoryAuditStore::new();
        store.set_failing(true);
        assert!(matches!(
            store.append(record(1)).await,
            Err(AuditError::Unavailable(_))
        ));
        assert!(store.records().await.is_empty());

        store.set_failing(false);
        assert!(store.append(record(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_out_of_range_record_id_is_rejected() {
        let store = MemoryAuditStore::new();
        let result = store.append(record(u64::MAX)).await;
        assert!(matches!(
            result,
            Err(AuditError::OutOfRange {
                field: "record_id",
                ..
            })
        ));
    }

    #[test]
    fn test_stores_report_audit_table() {
        assert_eq!(MemoryAuditStore::new().table_name(), "audit_logs");
    }
}
