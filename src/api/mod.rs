//! Purpose: Define the stable public Rust API boundary for rowset.
//! Exports: Core types and operations needed by the CLI and embedders.
//! Role: Public, additive-only surface over the cursor, decoder, and backends.
//! Invariants: Callers reach result sets only through `Database` or `ResultSet::new`.
//! Invariants: Backend specifics stay behind the `Connection` and `RowSource` traits.

mod database;
pub mod sqlite;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::column::{Column, ColumnType, FieldMeta, NativeType, mysql};
pub use crate::core::cursor::{Records, ResultSet, row_index};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::record::Record;
pub use crate::core::source::{BufferedRows, Cell, Connection, RawRow, RowSource};
pub use crate::core::value::{DecodePolicy, Value, decode};
pub use database::{ApiResult, Database};
pub use sqlite::SqliteConnection;
