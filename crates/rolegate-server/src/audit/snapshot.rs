//! Redacted JSON snapshots of entity state
//!
//! Every before/after image written to the audit trail goes through this
//! module. A record is turned into a `serde_json::Value`, its top-level keys
//! are filtered against [`REDACTED_FIELDS`], and the result is written as
//! compact JSON with keys in sorted order so two snapshots of the same row are
//! byte-identical regardless of how the row was obtained.
//!
//! Failures never propagate: an unencodable record, or a single record that is
//! not a JSON object, yields an empty string and a warning.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Field names never written to a snapshot.
///
/// Matching is case-insensitive and ignores underscores, so `Password`,
/// `passwordHash` and `DeletedAt` are caught as well.
pub const REDACTED_FIELDS: &[&str] = &["password", "password_hash", "deleted_at"];

/// Serialize a record (or a sequence of records) into a redacted snapshot
pub fn serialize<T>(record: &T) -> String
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(record) {
        Ok(value) => serialize_value(&value),
        Err(e) => {
            tracing::warn!(target: "rolegate::audit", error = %e, "Failed to encode record for audit snapshot");
            String::new()
        },
    }
}

/// Serialize an already-encoded record into a redacted snapshot
pub fn serialize_value(value: &Value) -> String {
    let encoded = match value {
        Value::Object(_) => redact(value).map(|object| serde_json::to_string(&object)),
        Value::Array(items) => Some(serde_json::to_string(
            &items.iter().filter_map(redact).collect::<Vec<_>>(),
        )),
        other => {
            tracing::warn!(
                target: "rolegate::audit",
                kind = value_kind(other),
                "Audit snapshot requires a JSON object"
            );
            None
        },
    };

    match encoded {
        Some(Ok(snapshot)) => snapshot,
        Some(Err(e)) => {
            tracing::warn!(target: "rolegate::audit", error = %e, "Failed to write audit snapshot");
            String::new()
        },
        None => String::new(),
    }
}

/// Whether `key` names a field that must stay out of snapshots
pub fn is_redacted(key: &str) -> bool {
    let normalized = normalize(key);
    REDACTED_FIELDS
        .iter()
        .any(|field| normalize(field) == normalized)
}

fn redact(value: &Value) -> Option<BTreeMap<String, Value>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter(|(key, _)| !is_redacted(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Account {
        id: u64,
        name: String,
        email: String,
        password: String,
        nickname: Option<String>,
        deleted_at: Option<String>,
    }

    fn account() -> Account {
        Account {
            id: 1,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret".to_string(),
            nickname: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_redacts_credentials_and_soft_delete_marker() {
        let snapshot = serialize(&account());
        let parsed: Value = serde_json::from_str(&snapshot).unwrap();
        let object = parsed.as_object().unwrap();

        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("deleted_at"));
        assert_eq!(object["name"], "A");
        assert_eq!(object["email"], "a@x.com");
    }

    #[test]
    fn test_absent_optionals_are_null_not_omitted() {
        let snapshot = serialize(&account());
        assert!(snapshot.contains(r#""nickname":null"#));
    }

    #[test]
    fn test_keys_are_sorted() {
        let snapshot = serialize_value(&json!({"zeta": 1, "alpha": 2, "mid": 3}));
        assert_eq!(snapshot, r#"{"alpha":2,"mid":3,"zeta":1}"#);
    }

    #[test]
    fn test_redaction_ignores_case_and_underscores() {
        let snapshot = serialize_value(&json!({
            "Name": "A",
            "Password": "x",
            "passwordHash": "y",
            "DeletedAt": null,
        }));
        assert_eq!(snapshot, r#"{"Name":"A"}"#);
    }

    #[test]
    fn test_sequence_serializes_each_object() {
        let snapshot = serialize_value(&json!([
            {"id": 1, "password": "a"},
            "stray",
            {"id": 2, "password_hash": "b"},
        ]));
        assert_eq!(snapshot, r#"[{"id":1},{"id":2}]"#);
    }

    #[test]
    fn test_non_object_record_yields_empty() {
        assert_eq!(serialize(&42), "");
        assert_eq!(serialize_value(&Value::Null), "");
        assert_eq!(serialize(&"just a string"), "");
    }

    #[test]
    fn test_encoding_failure_yields_empty() {
        use std::collections::HashMap;

        // Non-string map keys cannot be represented in JSON.
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        assert_eq!(serialize(&bad), "");
    }

    #[test]
    fn test_is_redacted() {
        assert!(is_redacted("password"));
        assert!(is_redacted("PASSWORD_HASH"));
        assert!(is_redacted("deletedAt"));
        assert!(!is_redacted("email"));
        assert!(!is_redacted("password_hint"));
    }
}
