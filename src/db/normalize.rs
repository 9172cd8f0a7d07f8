//! Result normalization
//!
//! Stored procedures report their outcome in whatever shape they happen to
//! produce: a bare status row, a row set, or nested row sets; the identifier
//! field name varies procedure to procedure. [`normalize`] imposes one
//! canonical view on top of a [`RawProcedureResult`].
//!
//! The success contract across every procedure is 1-vs-not-1: a `status` of
//! numeric or string `1` means success, anything else (including `"0"`) does
//! not. An `affectedRows` greater than zero also counts as success.

use serde_json::Value;

use super::procedure::{ProcRow, RawProcedureResult};

/// Identifier candidates, in priority order. The first value of the row is
/// the last resort.
const ID_FIELDS: [&str; 3] = ["product_id", "insertId", "id"];

/// Canonical view of a procedure outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub identifier: Option<i64>,
    pub affected_count: Option<i64>,
    pub status_flag: Option<Value>,
    pub message: Option<String>,
}

impl Normalized {
    /// `status == 1` (numeric or string) or `affectedRows > 0`.
    pub fn is_success(&self) -> bool {
        let status_ok = match &self.status_flag {
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => s.trim() == "1",
            _ => false,
        };
        status_ok || self.affected_count.is_some_and(|n| n > 0)
    }

    /// Message for user display, with a caller-supplied default.
    pub fn message_or(&self, default: &str) -> String {
        self.message.clone().unwrap_or_else(|| default.to_string())
    }
}

/// Reduce a procedure result to the canonical record. An empty result
/// normalizes to all-`None` (not found / failed), never an error.
pub fn normalize(raw: &RawProcedureResult) -> Normalized {
    let Some(row) = first_row(raw) else {
        return Normalized::default();
    };
    Normalized {
        identifier: extract_identifier(row),
        affected_count: row.get("affectedRows").and_then(as_i64),
        status_flag: row.get("status").filter(|v| !v.is_null()).cloned(),
        message: row
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// First row-set, first row — descending one level per nesting.
fn first_row(raw: &RawProcedureResult) -> Option<&ProcRow> {
    match raw {
        RawProcedureResult::Row(row) => Some(row),
        RawProcedureResult::RowSet(rows) => rows.first(),
        RawProcedureResult::RowSetList(sets) => sets.first().and_then(|set| set.first()),
    }
}

fn extract_identifier(row: &ProcRow) -> Option<i64> {
    for field in ID_FIELDS {
        if let Some(id) = row.get(field).and_then(as_i64) {
            return Some(id);
        }
    }
    // Fall back to the first value of the row if it is numeric-coercible
    row.values().next().and_then(as_i64)
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn row(pairs: &[(&str, Value)]) -> ProcRow {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        map
    }

    #[test]
    fn test_same_record_for_all_three_shapes() {
        let fields = [
            ("product_id", json!(42)),
            ("status", json!(1)),
            ("message", json!("ok")),
        ];
        let bare = RawProcedureResult::Row(row(&fields));
        let nested = RawProcedureResult::RowSet(vec![row(&fields)]);
        let doubly = RawProcedureResult::RowSetList(vec![vec![row(&fields)]]);

        let expected = normalize(&bare);
        assert_eq!(expected.identifier, Some(42));
        assert_eq!(normalize(&nested), expected);
        assert_eq!(normalize(&doubly), expected);
    }

    #[test]
    fn test_status_convention_one_vs_not_one() {
        for status in [json!(1), json!("1")] {
            let raw = RawProcedureResult::Row(row(&[("status", status)]));
            assert!(normalize(&raw).is_success());
        }
        for status in [json!(0), json!("0"), json!(2), json!("ok")] {
            let raw = RawProcedureResult::Row(row(&[("status", status)]));
            assert!(!normalize(&raw).is_success());
        }
    }

    #[test]
    fn test_affected_rows_success() {
        let raw = RawProcedureResult::Row(row(&[("affectedRows", json!(2))]));
        assert!(normalize(&raw).is_success());

        let raw = RawProcedureResult::Row(row(&[("affectedRows", json!(0))]));
        assert!(!normalize(&raw).is_success());
    }

    #[test]
    fn test_identifier_priority_order() {
        // product_id beats insertId beats id beats first value
        let raw = RawProcedureResult::Row(row(&[
            ("first", json!(99)),
            ("id", json!(9)),
            ("insertId", json!(5)),
            ("product_id", json!(3)),
        ]));
        assert_eq!(normalize(&raw).identifier, Some(3));

        let raw = RawProcedureResult::Row(row(&[("id", json!(9)), ("insertId", json!(5))]));
        assert_eq!(normalize(&raw).identifier, Some(5));

        let raw = RawProcedureResult::Row(row(&[("id", json!(9))]));
        assert_eq!(normalize(&raw).identifier, Some(9));
    }

    #[test]
    fn test_identifier_falls_back_to_first_value() {
        let raw = RawProcedureResult::Row(row(&[("LAST_INSERT_ID()", json!("17"))]));
        assert_eq!(normalize(&raw).identifier, Some(17));

        let raw = RawProcedureResult::Row(row(&[("name", json!("Pen"))]));
        assert_eq!(normalize(&raw).identifier, None);
    }

    #[test]
    fn test_empty_row_set_is_failure_not_panic() {
        let raw = RawProcedureResult::RowSet(Vec::new());
        let outcome = normalize(&raw);
        assert_eq!(outcome, Normalized::default());
        assert!(!outcome.is_success());

        let raw = RawProcedureResult::RowSetList(vec![Vec::new()]);
        assert!(!normalize(&raw).is_success());
    }

    #[test]
    fn test_message_passes_through_verbatim() {
        let raw = RawProcedureResult::Row(row(&[
            ("status", json!("1")),
            ("message", json!("Product saved")),
        ]));
        let outcome = normalize(&raw);
        assert_eq!(outcome.message.as_deref(), Some("Product saved"));
        assert_eq!(outcome.message_or("default"), "Product saved");

        let raw = RawProcedureResult::Row(row(&[("status", json!("1"))]));
        assert_eq!(normalize(&raw).message_or("default"), "default");
    }
}
