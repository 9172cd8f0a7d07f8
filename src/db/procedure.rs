//! Stored-procedure call interface
//!
//! Procedures are invoked as `CALL name(?, …)` with positional parameters.
//! The MySQL client streams the rows of every result set of a CALL in one
//! sequence; this boundary groups consecutive rows by column signature and
//! classifies the outcome into [`RawProcedureResult`] so the rest of the
//! service never probes shapes ad hoc.

use serde_json::{Map, Value};
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::{Column, Executor, Row, TypeInfo};

/// One row of a procedure result set, field name → JSON value in column order
pub type ProcRow = Map<String, Value>;

/// A positional stored-procedure parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ProcValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for ProcValue {
    fn from(v: i64) -> Self {
        ProcValue::Int(v)
    }
}

impl From<f64> for ProcValue {
    fn from(v: f64) -> Self {
        ProcValue::Float(v)
    }
}

impl From<&str> for ProcValue {
    fn from(v: &str) -> Self {
        ProcValue::Text(v.to_string())
    }
}

impl From<String> for ProcValue {
    fn from(v: String) -> Self {
        ProcValue::Text(v)
    }
}

impl<T> From<Option<T>> for ProcValue
where
    T: Into<ProcValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ProcValue::Null)
    }
}

impl From<&Value> for ProcValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => ProcValue::Null,
            Value::Bool(b) => ProcValue::Int(*b as i64),
            Value::Number(n) => n
                .as_i64()
                .map(ProcValue::Int)
                .or_else(|| n.as_f64().map(ProcValue::Float))
                .unwrap_or(ProcValue::Null),
            Value::String(s) => ProcValue::Text(s.clone()),
            other => ProcValue::Text(other.to_string()),
        }
    }
}

/// The untyped outcome of a procedure invocation: a bare row, one row set,
/// or a list of row sets. Callers choose how deep to look; the normalizer
/// accepts all three.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProcedureResult {
    Row(ProcRow),
    RowSet(Vec<ProcRow>),
    RowSetList(Vec<Vec<ProcRow>>),
}

impl RawProcedureResult {
    /// First result set (the data rows of a single-SELECT procedure).
    pub fn into_first_row_set(self) -> Vec<ProcRow> {
        match self {
            RawProcedureResult::Row(row) => vec![row],
            RawProcedureResult::RowSet(rows) => rows,
            RawProcedureResult::RowSetList(sets) => sets.into_iter().next().unwrap_or_default(),
        }
    }

    /// All result sets, for procedures returning several
    /// (bill header / items / customer style).
    pub fn into_row_sets(self) -> Vec<Vec<ProcRow>> {
        match self {
            RawProcedureResult::Row(row) => vec![vec![row]],
            RawProcedureResult::RowSet(rows) => vec![rows],
            RawProcedureResult::RowSetList(sets) => sets,
        }
    }
}

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

fn bind_value(query: MySqlQuery<'_>, value: ProcValue) -> MySqlQuery<'_> {
    match value {
        ProcValue::Null => query.bind(None::<String>),
        ProcValue::Int(v) => query.bind(v),
        ProcValue::Float(v) => query.bind(v),
        ProcValue::Text(v) => query.bind(v),
    }
}

/// Invoke `CALL name(?, …)` with positional parameters on any executor
/// (pool or open transaction).
pub async fn call<'e, E>(
    executor: E,
    name: &str,
    params: Vec<ProcValue>,
) -> Result<RawProcedureResult, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let placeholders = vec!["?"; params.len()].join(", ");
    let sql = format!("CALL {name}({placeholders})");

    let mut query = sqlx::query(&sql);
    for param in params {
        query = bind_value(query, param);
    }

    let rows = query.fetch_all(executor).await?;
    let tagged: Vec<(Vec<String>, ProcRow)> = rows.iter().map(row_to_map).collect();
    Ok(group_by_signature(tagged))
}

/// Group consecutive rows with identical column signatures into row sets.
/// One signature yields a `RowSet`; several yield a `RowSetList`.
fn group_by_signature(rows: Vec<(Vec<String>, ProcRow)>) -> RawProcedureResult {
    let mut sets: Vec<Vec<ProcRow>> = Vec::new();
    let mut current_sig: Option<Vec<String>> = None;

    for (sig, row) in rows {
        if current_sig.as_ref() != Some(&sig) {
            sets.push(Vec::new());
            current_sig = Some(sig);
        }
        if let Some(set) = sets.last_mut() {
            set.push(row);
        }
    }

    match sets.len() {
        0 => RawProcedureResult::RowSet(Vec::new()),
        1 => RawProcedureResult::RowSet(sets.into_iter().next().unwrap_or_default()),
        _ => RawProcedureResult::RowSetList(sets),
    }
}

fn row_to_map(row: &MySqlRow) -> (Vec<String>, ProcRow) {
    let mut signature = Vec::with_capacity(row.columns().len());
    let mut map = Map::new();
    for col in row.columns() {
        signature.push(col.name().to_string());
        map.insert(
            col.name().to_string(),
            decode_column(row, col.ordinal(), col.type_info().name()),
        );
    }
    (signature, map)
}

/// Decode one column into a JSON value by the server-reported type name.
/// Unknown types fall back to their string form; a failed decode is NULL
/// rather than an error, since procedure result shapes are not under our
/// control.
fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> Value {
    match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        // DECIMAL stays a string, as the original wire format did
        "DECIMAL" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(idx)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> (Vec<String>, ProcRow) {
        let mut sig = Vec::new();
        let mut map = Map::new();
        for (k, v) in pairs {
            sig.push(k.to_string());
            map.insert(k.to_string(), v.clone());
        }
        (sig, map)
    }

    #[test]
    fn test_group_single_signature_is_one_row_set() {
        let rows = vec![
            row(&[("ProductID", json!(1)), ("ProductName", json!("Pen"))]),
            row(&[("ProductID", json!(2)), ("ProductName", json!("Book"))]),
        ];
        match group_by_signature(rows) {
            RawProcedureResult::RowSet(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected RowSet, got {other:?}"),
        }
    }

    #[test]
    fn test_group_mixed_signatures_split_into_sets() {
        let rows = vec![
            row(&[("BillNumber", json!(7))]),
            row(&[("ProductName", json!("Pen")), ("Qty", json!(2))]),
            row(&[("ProductName", json!("Book")), ("Qty", json!(1))]),
            row(&[("Customer", json!("Asha"))]),
        ];
        match group_by_signature(rows) {
            RawProcedureResult::RowSetList(sets) => {
                assert_eq!(sets.len(), 3);
                assert_eq!(sets[1].len(), 2);
            }
            other => panic!("expected RowSetList, got {other:?}"),
        }
    }

    #[test]
    fn test_group_empty_is_empty_row_set() {
        assert_eq!(
            group_by_signature(Vec::new()),
            RawProcedureResult::RowSet(Vec::new())
        );
    }

    #[test]
    fn test_proc_value_from_json() {
        assert_eq!(ProcValue::from(&json!(null)), ProcValue::Null);
        assert_eq!(ProcValue::from(&json!(3)), ProcValue::Int(3));
        assert_eq!(ProcValue::from(&json!(2.5)), ProcValue::Float(2.5));
        assert_eq!(ProcValue::from(&json!("8")), ProcValue::Text("8".into()));
        assert_eq!(ProcValue::from(&json!(true)), ProcValue::Int(1));
    }

    #[test]
    fn test_proc_value_from_option() {
        assert_eq!(ProcValue::from(None::<i64>), ProcValue::Null);
        assert_eq!(ProcValue::from(Some(4_i64)), ProcValue::Int(4));
    }
}
