use crate::{error::EngineError, flatten::RowFlattener, pagination::Paginator};
use chrono::{DateTime, Utc};
use connectors::{
    file::csv::sink::DelimitedSink,
    salesforce::source::PageSource,
    sink::FrameSink,
    sqlite::sink::SqliteSink,
    store::ObjectSink,
};
use futures::{Stream, StreamExt, TryStreamExt, future, stream};
use model::pagination::cursor::PaginationCursor;
use serde::Serialize;
use soql_syntax::{
    columns::{OutputSchema, Substitutions},
    statement::QueryStatement,
};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of one query export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub run_id: Uuid,
    pub table: String,
    pub columns: Vec<String>,
    pub pages: usize,
    pub rows: usize,
    /// File path, `path#table` or object key the rows were written to.
    pub destination: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A rendered statement together with its declared output shape.
pub(crate) struct Prepared {
    pub query: String,
    pub schema: OutputSchema,
}

pub(crate) fn prepare(
    statement: &QueryStatement,
    subs: &Substitutions,
) -> Result<Prepared, EngineError> {
    let query = statement.render()?;
    let schema = OutputSchema::from_query(&query, subs)?;
    Ok(Prepared { query, schema })
}

/// Runs one query to completion, handing every page's frame to `sink` in order.
///
/// Each page is fetched, flattened and written before the next one is
/// requested. On failure the sink keeps whatever was written before it.
pub async fn export_frames<S, K>(
    source: &S,
    statement: &QueryStatement,
    subs: &Substitutions,
    sink: &mut K,
    destination: String,
) -> Result<ExportSummary, EngineError>
where
    S: PageSource + ?Sized,
    K: FrameSink,
{
    let started_at = Utc::now();
    let Prepared { query, schema } = prepare(statement, subs)?;

    let flattener = RowFlattener::new(&schema);
    let cursor = PaginationCursor::new(&schema.table, schema.columns.clone());
    let run_id = cursor.correlation_id;
    info!(
        run_id = %run_id,
        table = %schema.table,
        columns = ?schema.columns,
        destination = %destination,
        "Starting export"
    );

    let mut paginator = Paginator::new(source, query, cursor);
    let mut pages = 0;
    while let Some(page) = paginator.next_page().await? {
        let page_index = paginator.cursor().page_index;
        let frame = flattener.flatten_page(page, page_index)?;
        sink.write_frame(&frame)?;
        pages += 1;
    }
    let rows = sink.finish()?;

    info!(run_id = %run_id, pages, rows, "Export finished");
    Ok(ExportSummary {
        run_id,
        table: schema.table,
        columns: schema.columns,
        pages,
        rows,
        destination,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Exports to a delimited file; without `destination` a temporary `*.csv` is created.
pub async fn export_delimited<S>(
    source: &S,
    statement: &QueryStatement,
    subs: &Substitutions,
    destination: Option<&Path>,
) -> Result<ExportSummary, EngineError>
where
    S: PageSource + ?Sized,
{
    let mut sink = match destination {
        Some(path) => DelimitedSink::open(path)?,
        None => DelimitedSink::temporary()?,
    };
    let target = sink.path().display().to_string();
    export_frames(source, statement, subs, &mut sink, target).await
}

/// Exports to `table` of the SQLite database at `path`.
pub async fn export_table<S>(
    source: &S,
    statement: &QueryStatement,
    subs: &Substitutions,
    path: &Path,
    table: &str,
) -> Result<ExportSummary, EngineError>
where
    S: PageSource + ?Sized,
{
    let mut sink = SqliteSink::open(path, table)?;
    let target = format!("{}#{table}", path.display());
    export_frames(source, statement, subs, &mut sink, target).await
}

/// Exports to a temporary delimited file, then uploads it under `key`.
///
/// An existing object under `key` is replaced.
pub async fn export_to_store<S, O>(
    source: &S,
    statement: &QueryStatement,
    subs: &Substitutions,
    store: &O,
    key: &str,
) -> Result<ExportSummary, EngineError>
where
    S: PageSource + ?Sized,
    O: ObjectSink + ?Sized,
{
    let mut summary = export_delimited(source, statement, subs, None).await?;
    let local = summary.destination.clone();

    let upload = async {
        let body = tokio::fs::read(&local).await?;
        if store.exists(key).await? {
            warn!(run_id = %summary.run_id, key, "Replacing existing object");
        }
        store.put_bytes(body.into(), key).await?;
        Ok::<_, EngineError>(())
    }
    .await;

    if let Err(e) = tokio::fs::remove_file(&local).await {
        warn!(path = %local, error = %e, "Could not remove temporary export");
    }
    upload?;

    info!(run_id = %summary.run_id, key, rows = summary.rows, "Uploaded export");
    summary.destination = key.to_string();
    summary.finished_at = Utc::now();
    Ok(summary)
}

/// Streams the normalized header followed by every flattened row as text fields.
///
/// Statement errors surface before the first fetch; remote and schema errors
/// end the stream.
pub fn query_rows<'a, S>(
    source: &'a S,
    statement: &QueryStatement,
    subs: &Substitutions,
) -> Result<impl Stream<Item = Result<Vec<String>, EngineError>> + 'a, EngineError>
where
    S: PageSource + ?Sized,
{
    let Prepared { query, schema } = prepare(statement, subs)?;
    let header = schema.columns.clone();
    let flattener = RowFlattener::new(&schema);
    let cursor = PaginationCursor::new(&schema.table, schema.columns);

    let rows = Paginator::new(source, query, cursor)
        .into_stream()
        .and_then(move |(page_index, page)| {
            future::ready(flattener.flatten_page(page, page_index))
        })
        .map_ok(|frame| {
            stream::iter(
                frame
                    .rows
                    .into_iter()
                    .map(|row| Ok::<_, EngineError>(row.fields())),
            )
        })
        .try_flatten();

    Ok(stream::once(future::ready(Ok(header))).chain(rows))
}
