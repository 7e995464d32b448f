//! Purpose: Embedded SQLite backend that buffers whole statement results as text cells.
//! Exports: `SqliteConnection`.
//! Role: Concrete `Connection` used by the CLI and integration tests.
//! Invariants: Every row is fetched before the result is handed out (fully buffered).
//! Invariants: Cells use canonical text (integers, reals) or raw bytes (text, blobs); NULL stays `None`.
//! Notes: Column types come from declared types; expressions without one take the storage class
//! Notes: of their first non-null value (integer or real), else decode as strings.

use std::path::Path;

use rusqlite::types::ValueRef;
use tracing::debug;

use crate::core::column::{FieldMeta, NativeType};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::source::{BufferedRows, Cell, Connection};

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = rusqlite::Connection::open(path).map_err(|err| {
            Error::new(ErrorKind::Connection)
                .with_message(err.to_string())
                .with_hint(format!("Check that {} is a writable SQLite file.", path.display()))
                .with_source(err)
        })?;
        debug!(path = %path.display(), "opened sqlite database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|err| {
            Error::new(ErrorKind::Connection)
                .with_message(err.to_string())
                .with_source(err)
        })?;
        Ok(Self { conn })
    }
}

impl Connection for SqliteConnection {
    type Rows = BufferedRows;

    fn execute_query(&mut self, sql: &str) -> Result<BufferedRows> {
        let mut stmt = self.conn.prepare(sql).map_err(query_error)?;
        let mut fields = stmt
            .columns()
            .iter()
            .map(|column| {
                let native = column
                    .decl_type()
                    .map_or(NativeType::Unknown, |decl| NativeType::Declared(decl.to_string()));
                FieldMeta::new(column.name(), native)
            })
            .collect::<Vec<_>>();
        let width = fields.len();
        // Expression columns carry no declared type; the first non-null value's storage
        // class stands in for it.
        let mut undeclared = fields
            .iter()
            .map(|field| field.native == NativeType::Unknown)
            .collect::<Vec<_>>();

        let mut buffered = Vec::new();
        let mut rows = stmt.query([]).map_err(query_error)?;
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value = row.get_ref(idx).map_err(query_error)?;
                if undeclared[idx] && !matches!(value, ValueRef::Null) {
                    fields[idx].native = storage_class(value);
                    undeclared[idx] = false;
                }
                cells.push(cell_text(value));
            }
            buffered.push(cells);
        }

        debug!(rows = buffered.len(), fields = width, "buffered sqlite result");
        BufferedRows::new(fields, buffered)
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        let affected = self.conn.execute(sql, []).map_err(query_error)?;
        Ok(affected as u64)
    }
}

fn cell_text(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value.to_string().into_bytes()),
        ValueRef::Real(value) => Some(value.to_string().into_bytes()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
    }
}

fn storage_class(value: ValueRef<'_>) -> NativeType {
    match value {
        ValueRef::Integer(_) => NativeType::Declared("INTEGER".to_string()),
        ValueRef::Real(_) => NativeType::Declared("REAL".to_string()),
        ValueRef::Null | ValueRef::Text(_) | ValueRef::Blob(_) => NativeType::Unknown,
    }
}

fn query_error(err: rusqlite::Error) -> Error {
    Error::new(ErrorKind::Query)
        .with_message(err.to_string())
        .with_source(err)
}
