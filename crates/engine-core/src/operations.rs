//! The operations an external scheduler can invoke.
//!
//! Each operation opens (or reuses) the connection's session, runs to
//! completion and reports its artifact. None of them retries.

use crate::{
    attachments::{BulkOutcome, store_attachments},
    connection::Connection,
    error::EngineError,
    export::{self, ExportSummary},
};
use connectors::store::StoreSink;
use soql_syntax::{columns::Substitutions, statement::QueryStatement};
use std::{fmt, path::Path, str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ExportFile,
    ExportTable,
    ExportObject,
    Attachments,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::ExportFile,
        Operation::ExportTable,
        Operation::ExportObject,
        Operation::Attachments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ExportFile => "export-file",
            Operation::ExportTable => "export-table",
            Operation::ExportObject => "export-object",
            Operation::Attachments => "attachments",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::ExportFile => "Export a query to a delimited file",
            Operation::ExportTable => "Export a query to a table of a SQLite database",
            Operation::ExportObject => "Export a query as a delimited object in an object store",
            Operation::Attachments => "Copy attachment bodies into an object store",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown operation: {s}"))
    }
}

/// Writes the query result to `destination`, or to a fresh temporary `*.csv`.
pub async fn export_to_file(
    conn: &Connection,
    statement: &QueryStatement,
    subs: &Substitutions,
    destination: Option<&Path>,
) -> Result<ExportSummary, EngineError> {
    // Statement errors must win over login errors.
    export::prepare(statement, subs)?;
    let session = conn.session().await?;
    export::export_delimited(session, statement, subs, destination).await
}

/// Appends the query result to `table` in the SQLite database at `path`.
pub async fn export_to_table(
    conn: &Connection,
    statement: &QueryStatement,
    subs: &Substitutions,
    path: &Path,
    table: &str,
) -> Result<ExportSummary, EngineError> {
    export::prepare(statement, subs)?;
    let session = conn.session().await?;
    export::export_table(session, statement, subs, path, table).await
}

/// Uploads the query result as one delimited object under `key` in `location`.
pub async fn export_to_object(
    conn: &Connection,
    statement: &QueryStatement,
    subs: &Substitutions,
    location: &str,
    key: &str,
) -> Result<ExportSummary, EngineError> {
    export::prepare(statement, subs)?;
    let store = StoreSink::from_location(location, request_timeout(conn))?;
    let session = conn.session().await?;
    export::export_to_store(session, statement, subs, &store, key).await
}

/// Copies the bodies of the attachments in `ids` into `location`.
///
/// Only a failed login or an unusable location is returned as an error;
/// per-attachment failures are collected in the outcome.
pub async fn attachments_to_store(
    conn: &Connection,
    ids: &[String],
    location: &str,
    concurrency: usize,
) -> Result<BulkOutcome, EngineError> {
    let store = StoreSink::from_location(location, request_timeout(conn))?;
    let session = conn.session().await?;
    info!(location, "Copying attachments");
    Ok(store_attachments(session, &store, ids, concurrency).await)
}

fn request_timeout(conn: &Connection) -> Duration {
    Duration::from_secs(conn.profile().request_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::salesforce::profile::{ConnectionProfile, Credentials};

    #[test]
    fn test_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), *op);
            assert!(!op.description().is_empty());
        }
        assert_eq!(Operation::ALL.len(), 4);
        assert_eq!("EXPORT-TABLE".parse::<Operation>(), Ok(Operation::ExportTable));
        assert!("plugins".parse::<Operation>().is_err());
    }

    #[tokio::test]
    async fn test_malformed_query_reported_before_login() {
        let conn = Connection::new(ConnectionProfile::new(Credentials::Direct {
            instance_url: "".into(),
            session_id: "".into(),
        }));

        let err = export_to_file(
            &conn,
            &QueryStatement::new("SELECT Id FROM Contact WHERE Id = %s").with_params(["1", "2"]),
            &Substitutions::new(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::MalformedQuery(_)));
        assert!(!conn.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_failure_aborts_attachments() {
        let conn = Connection::new(ConnectionProfile::new(Credentials::Direct {
            instance_url: "".into(),
            session_id: "".into(),
        }));

        let err = attachments_to_store(&conn, &["00P1".to_string()], "memory://", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Authentication(_)));
    }
}
