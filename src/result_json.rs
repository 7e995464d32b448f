//! Purpose: JSON envelopes for query output.
//! Exports: `result_set_json`, `record_json`, `column_json`.
//! Role: Keep the stdout shape of `rowset query` in one place.
//! Invariants: Field order in every object follows column declaration order.
//! Invariants: Records serialize straight to text, so duplicate column names are all kept.

use rowset::api::{Error, Record, ResultSet, RowSource, Value};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ResultSetJson {
    row_count: usize,
    fields: Vec<FieldJson>,
    rows: Vec<Record>,
}

#[derive(Debug, Serialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    column_type: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordJson {
    row: usize,
    record: Record,
}

#[derive(Debug, Serialize)]
pub(crate) struct ColumnJson {
    column: String,
    values: Vec<Value>,
}

pub(crate) fn result_set_json<S: RowSource>(set: &mut ResultSet<S>) -> Result<ResultSetJson, Error> {
    let fields = set
        .columns()
        .iter()
        .map(|column| FieldJson {
            name: column.name.clone(),
            column_type: column.column_type.as_str(),
        })
        .collect();
    let rows = set.iter().collect::<Result<Vec<_>, _>>()?;
    Ok(ResultSetJson {
        row_count: set.row_count(),
        fields,
        rows,
    })
}

pub(crate) fn record_json(index: usize, record: Record) -> RecordJson {
    RecordJson { row: index, record }
}

pub(crate) fn column_json(name: &str, values: Vec<Value>) -> ColumnJson {
    ColumnJson {
        column: name.to_string(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::{column_json, record_json, result_set_json};
    use rowset::api::{BufferedRows, FieldMeta, NativeType, ResultSet, Value, mysql};

    fn set(names: &[&str], rows: Vec<Vec<Option<Vec<u8>>>>) -> ResultSet<BufferedRows> {
        let fields = names
            .iter()
            .map(|name| FieldMeta::new(*name, NativeType::Mysql(mysql::LONGLONG)))
            .collect();
        let source = BufferedRows::new(fields, rows).expect("rows");
        ResultSet::new(source).expect("set").expect("non-empty")
    }

    fn cell(text: &str) -> Option<Vec<u8>> {
        Some(text.as_bytes().to_vec())
    }

    #[test]
    fn rows_keep_declaration_order() {
        let mut set = set(&["zeta", "alpha"], vec![vec![cell("1"), cell("2")]]);
        let json = serde_json::to_string(&result_set_json(&mut set).expect("json")).expect("text");
        assert_eq!(
            json,
            r#"{"row_count":1,"fields":[{"name":"zeta","type":"integer"},{"name":"alpha","type":"integer"}],"rows":[{"zeta":1,"alpha":2}]}"#
        );
    }

    #[test]
    fn duplicate_names_are_all_emitted() {
        let mut set = set(&["a", "a"], vec![vec![cell("1"), cell("2")]]);
        let record = set.get(0).expect("row");
        let json = serde_json::to_string(&record_json(0, record)).expect("text");
        assert_eq!(json, r#"{"row":0,"record":{"a":1,"a":2}}"#);
    }

    #[test]
    fn column_envelope() {
        let json = serde_json::to_string(&column_json("n", vec![Value::Int(1), Value::Null]))
            .expect("text");
        assert_eq!(json, r#"{"column":"n","values":[1,null]}"#);
    }
}
