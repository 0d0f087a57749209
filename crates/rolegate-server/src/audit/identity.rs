//! Record identity resolution
//!
//! Works out which table and which row a pending mutation targets. Resolution
//! order for the record id, first hit wins:
//!
//! 1. the destination object's `id` field
//! 2. the destination object's schema primary-key field
//! 3. for deletes with no destination, the first positive integer among the
//!    bound statement parameters
//!
//! Integer handling: unsigned values count when non-zero, signed values only
//! when strictly positive. Anything else (floats, strings, null) is absent.

use serde_json::Value;

use crate::db::pipeline::{MutationKind, MutationScope};

/// Field name checked first on every destination object
pub const IDENTITY_FIELD: &str = "id";

/// Table and primary key a mutation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub table: String,
    pub record_id: u64,
}

/// Resolve both table and record id; `None` when either is missing
pub fn resolve(scope: &MutationScope<'_>) -> Option<ResolvedTarget> {
    let table = resolve_table(scope)?;
    let record_id = resolve_record_id(scope)?;
    Some(ResolvedTarget { table, record_id })
}

/// Schema table name, else the scope's explicit table override
pub fn resolve_table(scope: &MutationScope<'_>) -> Option<String> {
    let schema_table: Option<&str> = scope.schema().map(|schema| schema.table);
    schema_table
        .or_else(|| scope.table_override())
        .filter(|table| !table.is_empty())
        .map(str::to_owned)
}

pub fn resolve_record_id(scope: &MutationScope<'_>) -> Option<u64> {
    if let Some(dest) = scope.dest() {
        if let Some(id) = field_identity(dest, IDENTITY_FIELD) {
            return Some(id);
        }
        if let Some(schema) = scope.schema() {
            if let Some(id) = field_identity(dest, schema.primary_key) {
                return Some(id);
            }
        }
        return None;
    }

    if scope.kind() == MutationKind::Delete {
        return scope.params().iter().find_map(|param| param.as_identity());
    }

    None
}

fn field_identity(dest: &Value, field: &str) -> Option<u64> {
    dest.get(field).and_then(positive_integer)
}

fn positive_integer(value: &Value) -> Option<u64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(unsigned) = number.as_u64() {
        return Some(unsigned).filter(|id| *id > 0);
    }
    number
        .as_i64()
        .filter(|id| *id > 0)
        .and_then(|id| u64::try_from(id).ok())
}
