//! Purpose: Hold top-level CLI command dispatch for `rowset`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: `query` prints `null` when the statement yields no result set.
//! Invariants: Row indices from the command line go through `row_index` before reaching the cursor.

use super::*;

use clap::CommandFactory;
use rowset::api::{Database, SqliteConnection, row_index};

use crate::result_json::{column_json, record_json, result_set_json};

pub(super) fn dispatch_command(command: Command, settings: &Settings) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "rowset", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Exec { sql } => {
            let mut db = open_database(settings)?;
            let affected = db.execute(&sql)?;
            emit_json(&json!({ "affected": affected }), settings.pretty);
            Ok(RunOutcome::ok())
        }
        Command::Query { sql, row, column } => {
            let mut db = open_database(settings)?;
            let Some(mut set) = db.query(&sql)? else {
                emit_json(&Value::Null, settings.pretty);
                return Ok(RunOutcome::ok());
            };
            match (row, column) {
                (Some(row), _) => {
                    let index = row_index(row, set.row_count())?;
                    emit_json(&record_json(index, set.get(index)?), settings.pretty);
                }
                (None, Some(name)) => {
                    emit_json(&column_json(&name, set.column(&name)?), settings.pretty);
                }
                (None, None) => emit_json(&result_set_json(&mut set)?, settings.pretty),
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn open_database(settings: &Settings) -> Result<Database<SqliteConnection>, Error> {
    let conn = match &settings.target {
        Target::File(path) => SqliteConnection::open(path)?,
        Target::Memory => SqliteConnection::open_in_memory()?,
    };
    Ok(Database::new(conn).with_policy(settings.policy))
}
