//! Purpose: Public entry point pairing a backend connection with result-set construction.
//! Exports: `Database`, `ApiResult`.
//! Role: Stable boundary for the CLI and embedders; backends plug in via `Connection`.
//! Invariants: Statements yielding zero rows or zero fields return `None`, never an empty set.
//! Invariants: The decode policy chosen here applies to every result set it creates.

use tracing::debug;

use crate::core::cursor::ResultSet;
use crate::core::error::Error;
use crate::core::source::Connection;
use crate::core::value::DecodePolicy;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Debug)]
pub struct Database<C: Connection> {
    conn: C,
    policy: DecodePolicy,
}

impl<C: Connection> Database<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            policy: DecodePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Runs `sql` and buffers its rows; `None` when there is nothing to read.
    pub fn query(&mut self, sql: &str) -> ApiResult<Option<ResultSet<C::Rows>>> {
        debug!(sql_len = sql.len(), "executing query");
        let rows = self.conn.execute_query(sql)?;
        ResultSet::with_policy(rows, self.policy)
    }

    /// Runs a statement and returns the number of affected rows.
    pub fn execute(&mut self, sql: &str) -> ApiResult<u64> {
        debug!(sql_len = sql.len(), "executing statement");
        let affected = self.conn.execute(sql)?;
        debug!(affected, "statement complete");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::core::column::{FieldMeta, NativeType, mysql};
    use crate::core::error::{Error, ErrorKind, Result};
    use crate::core::source::{BufferedRows, Connection};
    use crate::core::value::{DecodePolicy, Value};

    /// Canned backend: `SELECT` returns fixed rows, `EMPTY` returns none, anything else fails.
    struct Canned {
        executed: Vec<String>,
    }

    impl Connection for Canned {
        type Rows = BufferedRows;

        fn execute_query(&mut self, sql: &str) -> Result<BufferedRows> {
            let fields = vec![
                FieldMeta::new("n", NativeType::Mysql(mysql::LONG)),
                FieldMeta::new("at", NativeType::Mysql(mysql::TIMESTAMP)),
            ];
            match sql {
                "SELECT" => BufferedRows::new(
                    fields,
                    vec![
                        vec![Some(b"1".to_vec()), Some(b"2024-01-15 13:45:09.000001".to_vec())],
                        vec![Some(b"x".to_vec()), None],
                    ],
                ),
                "EMPTY" => BufferedRows::new(fields, Vec::new()),
                _ => Err(Error::new(ErrorKind::Query).with_message("syntax error")),
            }
        }

        fn execute(&mut self, sql: &str) -> Result<u64> {
            self.executed.push(sql.to_string());
            Ok(3)
        }
    }

    fn database() -> Database<Canned> {
        Database::new(Canned {
            executed: Vec::new(),
        })
    }

    #[test]
    fn query_builds_result_set() {
        let mut db = database();
        let mut set = db.query("SELECT").expect("query").expect("rows");
        assert_eq!(set.row_count(), 2);
        assert_eq!(set.get(0).expect("row")["n"], Value::Int(1));
    }

    #[test]
    fn empty_query_is_no_result() {
        let mut db = database();
        assert!(db.query("EMPTY").expect("query").is_none());
    }

    #[test]
    fn query_errors_keep_connection_usable() {
        let mut db = database();
        let err = db.query("BROKEN").expect_err("query error");
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(db.query("SELECT").expect("query").is_some());
    }

    #[test]
    fn policy_flows_into_result_sets() {
        let mut db = database().with_policy(DecodePolicy::Lenient);
        let mut set = db.query("SELECT").expect("query").expect("rows");
        assert_eq!(set.policy(), DecodePolicy::Lenient);
        assert!(set.get(1).expect("row")["n"].is_null());
    }

    #[test]
    fn execute_returns_affected_rows() {
        let mut db = database();
        assert_eq!(db.execute("DELETE").expect("execute"), 3);
        assert_eq!(db.connection().executed, ["DELETE"]);
    }
}
