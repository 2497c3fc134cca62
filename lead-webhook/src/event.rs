use serde_json::Value;

/// Event type that triggers an upsert
pub const INSERT: &str = "INSERT";

/// Insert notification for a single row, borrowed from the parsed webhook payload.
///
/// The envelope looks like `{"type": "INSERT", "table": "leads", "schema": "public",
/// "record": {...}, "old_record": null}`. Only `type` and `record` decide whether
/// the event is handled.
#[derive(Debug, PartialEq)]
pub struct InsertEvent<'a> {
    pub table: Option<&'a str>,
    pub schema: Option<&'a str>,
    pub record: &'a Value,
}

impl<'a> InsertEvent<'a> {
    /// Returns `None` for anything other than an insert carrying a non-null record.
    pub fn from_payload(payload: &'a Value) -> Option<Self> {
        if payload.get("type").and_then(Value::as_str) != Some(INSERT) {
            return None;
        }
        let record = payload.get("record").filter(|record| !record.is_null())?;

        Some(InsertEvent {
            table: payload.get("table").and_then(Value::as_str),
            schema: payload.get("schema").and_then(Value::as_str),
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_event() {
        let payload = json!({
            "type": "INSERT",
            "table": "leads",
            "schema": "public",
            "record": {"email": "lead@example.com"},
            "old_record": null,
        });

        let event = InsertEvent::from_payload(&payload).unwrap();
        assert_eq!(event.table, Some("leads"));
        assert_eq!(event.schema, Some("public"));
        assert_eq!(event.record, &json!({"email": "lead@example.com"}));
    }

    #[test]
    fn test_minimal_insert_event() {
        let payload = json!({"type": "INSERT", "record": {"phone": "1"}});
        let event = InsertEvent::from_payload(&payload).unwrap();
        assert_eq!(event.table, None);
        assert_eq!(event.schema, None);
    }

    #[test]
    fn test_ignored_payloads() {
        let ignored = [
            json!({"type": "UPDATE", "record": {"email": "a@b.c"}}),
            json!({"type": "DELETE", "old_record": {"email": "a@b.c"}}),
            json!({"type": "insert", "record": {"email": "a@b.c"}}),
            json!({"type": "INSERT"}),
            json!({"type": "INSERT", "record": null}),
            json!({"record": {"email": "a@b.c"}}),
            json!([{"type": "INSERT"}]),
            json!(null),
            json!("INSERT"),
        ];

        for payload in &ignored {
            assert_eq!(InsertEvent::from_payload(payload), None, "{payload}");
        }
    }
}
