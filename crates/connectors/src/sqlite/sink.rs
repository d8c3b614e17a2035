use crate::{
    error::SinkError,
    sink::{FrameSink, check_columns},
};
use model::{core::value::Value, records::frame::Frame};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Appends frames to a table of an embedded SQLite database.
///
/// The table is created from the first frame when missing. Rows are inserted in
/// fixed-size batches, one transaction per batch.
pub struct SqliteSink {
    conn: Connection,
    table: String,
    batch_size: usize,
    columns: Option<Vec<String>>,
    insert_sql: String,
    rows: usize,
}

impl SqliteSink {
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        Ok(Self::with_connection(conn, table))
    }

    pub fn with_connection(conn: Connection, table: &str) -> Self {
        SqliteSink {
            conn,
            table: table.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            columns: None,
            insert_sql: String::new(),
            rows: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn ensure_table(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let defs = frame
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("{} {}", quote_ident(name), affinity(frame, idx)))
            .collect::<Vec<_>>()
            .join(", ");

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} ({defs})",
            quote_ident(&self.table)
        );
        self.conn.execute(&create, [])?;
        info!(table = %self.table, columns = frame.columns.len(), "Table ready");

        let names = frame
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; frame.columns.len()].join(", ");
        self.insert_sql = format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            quote_ident(&self.table)
        );
        self.columns = Some(frame.columns.clone());
        Ok(())
    }
}

impl FrameSink for SqliteSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<usize, SinkError> {
        // Records still count without columns; there is just nothing to store.
        if frame.columns.is_empty() {
            if self.rows == 0 && !frame.is_empty() {
                warn!(table = %self.table, "Query projects no columns; rows are counted only");
            }
            self.rows += frame.len();
            return Ok(frame.len());
        }

        match &self.columns {
            Some(columns) => check_columns(columns, frame)?,
            None => self.ensure_table(frame)?,
        }

        for batch in frame.rows.chunks(self.batch_size) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&self.insert_sql)?;
                for row in batch {
                    stmt.execute(params_from_iter(row.values.iter().map(to_sql)))?;
                }
            }
            tx.commit()?;
            debug!(table = %self.table, rows = batch.len(), "Inserted batch");
        }

        self.rows += frame.len();
        Ok(frame.len())
    }

    fn rows_written(&self) -> usize {
        self.rows
    }

    fn finish(&mut self) -> Result<usize, SinkError> {
        Ok(self.rows)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared type of column `idx`, from its first non-null value.
fn affinity(frame: &Frame, idx: usize) -> &'static str {
    let first = frame
        .rows
        .iter()
        .filter_map(|row| row.get(idx))
        .find(|v| !v.is_null());

    match first {
        Some(Value::Int(_) | Value::Uint(_) | Value::Boolean(_)) => "INTEGER",
        Some(Value::Float(_)) => "REAL",
        _ => "TEXT",
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Uint(v) => match i64::try_from(*v) {
            Ok(v) => SqlValue::Integer(v),
            Err(_) => SqlValue::Text(v.to_string()),
        },
        Value::Float(v) => SqlValue::Real(*v),
        Value::String(v) => SqlValue::Text(v.clone()),
        Value::Boolean(v) => SqlValue::Integer(i64::from(*v)),
        Value::Json(v) => SqlValue::Text(v.to_string()),
        Value::Null => SqlValue::Null,
    }
}
