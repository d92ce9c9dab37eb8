//! Typed wire values for remote documents.
//!
//! # Responsibility
//! - Encode domain fields into the document database's typed value JSON.
//! - Decode returned documents into domain records.
//!
//! # Invariants
//! - Decoding is tolerant: missing titles become empty strings, missing
//!   order keys become zero, and a missing client timestamp falls back to
//!   the server one, then to "now".

use crate::model::board::{epoch_millis_now, Project, Task};
use chrono::DateTime;
use serde_json::{json, Map, Value};

/// Encodes a string field.
pub(crate) fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

/// Encodes an integer field. The wire format carries integers as strings.
pub(crate) fn integer_value(value: i64) -> Value {
    json!({ "integerValue": value.to_string() })
}

/// Extracts a string field, `None` when absent or differently typed.
pub(crate) fn field_string(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

/// Extracts a numeric field as `i64`.
///
/// Integers arrive as decimal strings; doubles are truncated since every
/// order key the system writes is a whole multiple of the order step.
pub(crate) fn field_i64(fields: &Map<String, Value>, name: &str) -> Option<i64> {
    let value = fields.get(name)?;
    if let Some(raw) = value.get("integerValue").and_then(Value::as_str) {
        return raw.parse().ok();
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .map(|v| v as i64)
}

/// Extracts a timestamp field as epoch milliseconds.
pub(crate) fn field_timestamp_millis(fields: &Map<String, Value>, name: &str) -> Option<i64> {
    let raw = fields.get(name)?.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.timestamp_millis())
}

/// Document id: the last segment of a full resource name.
pub(crate) fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn created_at(fields: &Map<String, Value>) -> i64 {
    field_i64(fields, "createdAt")
        .or_else(|| field_timestamp_millis(fields, "createdAtServer"))
        .unwrap_or_else(epoch_millis_now)
}

/// Fields for a fresh project document (server timestamp added separately).
pub(crate) fn project_fields(title: &str, order: i64, created_at: i64) -> Value {
    json!({
        "title": string_value(title),
        "order": integer_value(order),
        "createdAt": integer_value(created_at),
    })
}

/// Fields for a fresh task document.
pub(crate) fn task_fields(project_id: &str, title: &str, order: i64, created_at: i64) -> Value {
    json!({
        "projectId": string_value(project_id),
        "title": string_value(title),
        "comment": string_value(""),
        "order": integer_value(order),
        "createdAt": integer_value(created_at),
    })
}

/// Decodes one project document.
pub(crate) fn decode_project(name: &str, fields: &Map<String, Value>) -> Project {
    Project {
        id: document_id(name).to_string(),
        title: field_string(fields, "title").unwrap_or_default(),
        order: field_i64(fields, "order").unwrap_or(0),
        created_at: created_at(fields),
    }
}

/// Decodes one task document.
pub(crate) fn decode_task(name: &str, fields: &Map<String, Value>) -> Task {
    Task {
        id: document_id(name).to_string(),
        project_id: field_string(fields, "projectId").unwrap_or_default(),
        title: field_string(fields, "title").unwrap_or_default(),
        comment: field_string(fields, "comment").unwrap_or_default(),
        order: field_i64(fields, "order").unwrap_or(0),
        created_at: created_at(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_project, decode_task, document_id, field_i64, integer_value, project_fields,
    };
    use serde_json::{json, Map, Value};

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn integer_fields_round_trip_as_strings() {
        let fields = as_map(json!({ "order": integer_value(3000) }));
        assert_eq!(fields["order"]["integerValue"], "3000");
        assert_eq!(field_i64(&fields, "order"), Some(3000));
    }

    #[test]
    fn doubles_are_accepted_for_order_keys() {
        let fields = as_map(json!({ "order": { "doubleValue": 2000.0 } }));
        assert_eq!(field_i64(&fields, "order"), Some(2000));
    }

    #[test]
    fn document_id_is_the_last_name_segment() {
        let name = "projects/demo/databases/(default)/documents/projects/abc123";
        assert_eq!(document_id(name), "abc123");
    }

    #[test]
    fn project_decode_round_trips_encoded_fields() {
        let fields = as_map(project_fields("inbox", 1000, 42));
        let project = decode_project("x/projects/p1", &fields);
        assert_eq!(project.id, "p1");
        assert_eq!(project.title, "inbox");
        assert_eq!(project.order, 1000);
        assert_eq!(project.created_at, 42);
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        let fields = as_map(json!({}));
        let task = decode_task("x/tasks/t1", &fields);
        assert_eq!(task.title, "");
        assert_eq!(task.comment, "");
        assert_eq!(task.order, 0);
        // created_at falls back to "now"; just check it is plausible.
        assert!(task.created_at > 0);
    }

    #[test]
    fn server_timestamp_backfills_a_missing_client_timestamp() {
        let fields = as_map(json!({
            "createdAtServer": { "timestampValue": "2024-05-01T12:00:00Z" }
        }));
        let project = decode_project("x/projects/p1", &fields);
        assert_eq!(project.created_at, 1_714_564_800_000);
    }
}
