use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::ScriptError;

/// Outcome of one provisioning script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptReport {
    pub lines: usize,
    pub statements: usize,
}

/// Opens the id store for provisioning, creating the file when missing.
///
/// Only the provisioning path may create the store; the issuer refuses to.
pub fn open_for_provisioning(path: impl AsRef<Path>) -> anyhow::Result<Connection> {
    let path = path.as_ref();
    let existed = path.exists();

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

    if !existed {
        info!(path = %path.display(), "created id store");
    }
    Ok(conn)
}

/// Runs a SQL script one statement at a time.
///
/// Lines starting with `--` are skipped. Other lines are accumulated until one
/// ends with `;`, at which point the accumulated statement is executed.
/// A trailing statement without `;` is never executed.
pub fn run_sql_script(conn: &Connection, script: impl AsRef<Path>) -> Result<ScriptReport, ScriptError> {
    let script = script.as_ref();
    let io_error = |source| ScriptError::Io {
        path: script.display().to_string(),
        source,
    };

    let reader = BufReader::new(File::open(script).map_err(io_error)?);
    let mut report = ScriptReport { lines: 0, statements: 0 };
    let mut command = String::new();

    for line in reader.lines() {
        let line = line.map_err(io_error)?;
        report.lines += 1;

        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        command.push_str(trimmed);
        if trimmed.ends_with(';') {
            debug!(line = report.lines, statement = %command, "executing statement");
            conn.execute_batch(&command).map_err(|source| ScriptError::Statement {
                line: report.lines,
                source,
            })?;
            report.statements += 1;
            command.clear();
        } else {
            command.push('\n');
        }
    }

    info!(lines = report.lines, statements = report.statements, script = %script.display(), "processed script");
    Ok(report)
}
