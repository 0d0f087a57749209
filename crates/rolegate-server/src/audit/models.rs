//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Audit Trail Constants
// ============================================================================

/// Backing table of the audit trail. Mutations against it are never audited.
pub const AUDIT_TABLE: &str = "audit_logs";

/// Default number of records returned by the operator reads
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;

/// Upper bound on records returned by a single operator read
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// Persisted audit record, immutable once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub table_name: String,
    pub record_id: i64,
    pub action: String,
    /// Pre-image snapshot; empty for creates
    pub old_values: String,
    /// Post-image snapshot; empty for deletes
    pub new_values: String,
    /// Acting user, `0` when unknown
    pub user_id: i64,
    /// Client IP, empty when unavailable
    pub ip: String,
}

/// Mutation kinds recorded in the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for appending an audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub table_name: String,
    pub record_id: u64,
    pub action: AuditAction,
    pub old_values: String,
    pub new_values: String,
    pub user_id: u64,
    pub ip: String,
}

impl NewAuditRecord {
    /// Create a builder for constructing audit records
    pub fn builder() -> NewAuditRecordBuilder {
        NewAuditRecordBuilder::default()
    }
}

/// Builder for [`NewAuditRecord`]
#[derive(Debug, Clone, Default)]
pub struct NewAuditRecordBuilder {
    table_name: Option<String>,
    record_id: Option<u64>,
    action: Option<AuditAction>,
    old_values: String,
    new_values: String,
    user_id: u64,
    ip: String,
}

impl NewAuditRecordBuilder {
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn record_id(mut self, record_id: u64) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn old_values(mut self, old_values: impl Into<String>) -> Self {
        self.old_values = old_values.into();
        self
    }

    pub fn new_values(mut self, new_values: impl Into<String>) -> Self {
        self.new_values = new_values.into();
        self
    }

    pub fn user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    /// Build the record, returning an error if a required field is missing
    /// or the record id is zero
    pub fn try_build(self) -> Result<NewAuditRecord, &'static str> {
        let table_name = self.table_name.ok_or("table_name is required")?;
        let record_id = self
            .record_id
            .filter(|id| *id > 0)
            .ok_or("record_id must be positive")?;
        let action = self.action.ok_or("action is required")?;

        Ok(NewAuditRecord {
            table_name,
            record_id,
            action,
            old_values: self.old_values,
            new_values: self.new_values,
            user_id: self.user_id,
            ip: self.ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_as_str() {
        assert_eq!(AuditAction::Create.as_str(), "create");
        assert_eq!(AuditAction::Update.as_str(), "update");
        assert_eq!(AuditAction::Delete.as_str(), "delete");
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&AuditAction::Create).unwrap();
        assert_eq!(json, r#""create""#);

        let action: AuditAction = serde_json::from_str(r#""update""#).unwrap();
        assert_eq!(action, AuditAction::Update);
    }

    #[test]
    fn test_builder_defaults_actor_fields() {
        let record = NewAuditRecord::builder()
            .table_name("users")
            .record_id(3)
            .action(AuditAction::Delete)
            .old_values(r#"{"id":3}"#)
            .try_build()
            .unwrap();

        assert_eq!(record.user_id, 0);
        assert_eq!(record.ip, "");
        assert_eq!(record.new_values, "");
    }

    #[test]
    fn test_builder_requires_positive_record_id() {
        let result = NewAuditRecord::builder()
            .table_name("users")
            .record_id(0)
            .action(AuditAction::Create)
            .try_build();
        assert_eq!(result, Err("record_id must be positive"));
    }

    #[test]
    fn test_builder_requires_table_and_action() {
        assert!(NewAuditRecord::builder().record_id(1).try_build().is_err());
        assert!(NewAuditRecord::builder()
            .table_name("users")
            .record_id(1)
            .try_build()
            .is_err());
    }
}
