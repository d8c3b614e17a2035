use crate::error::EngineError;
use connectors::salesforce::source::PageSource;
use futures::{Stream, stream};
use model::pagination::{
    cursor::{CursorState, PaginationCursor},
    page::Page,
};
use tracing::{debug, info};

/// Pulls the pages of one query execution, strictly in order.
///
/// The first request goes to the soft-delete inclusive endpoint with the query
/// text; every later request follows the previous page's continuation
/// reference verbatim. Stops after the page that reports `done`.
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    query: String,
    cursor: PaginationCursor,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    pub fn new(source: &'a S, query: impl Into<String>, cursor: PaginationCursor) -> Self {
        Paginator {
            source,
            query: query.into(),
            cursor,
        }
    }

    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    /// Fetches the next page, or `None` once the cursor is done.
    ///
    /// Any failure finishes the cursor; later calls return `None`.
    pub async fn next_page(&mut self) -> Result<Option<Page>, EngineError> {
        let result = match &self.cursor.state {
            CursorState::Done => return Ok(None),
            CursorState::Initial => {
                debug!(
                    run_id = %self.cursor.correlation_id,
                    table = %self.cursor.table,
                    "Requesting first page"
                );
                self.source.query(&self.query, true).await
            }
            CursorState::More(next) => {
                debug!(
                    run_id = %self.cursor.correlation_id,
                    next = %next,
                    "Following continuation"
                );
                self.source.query_more(next).await
            }
        };

        let attempted = self.cursor.page_index + 1;
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.cursor.finish();
                return Err(EngineError::RemoteQuery {
                    page: attempted,
                    message: e.to_string(),
                });
            }
        };

        self.cursor
            .advance(&page)
            .map_err(|e| EngineError::RemoteQuery {
                page: attempted,
                message: e.to_string(),
            })?;

        info!(
            run_id = %self.cursor.correlation_id,
            page = self.cursor.page_index,
            records = page.len(),
            done = self.cursor.is_done(),
            "Fetched page"
        );
        Ok(Some(page))
    }

    /// Lazy sequence of `(page_index, page)`; ends after the `done` page or
    /// the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<(usize, Page), EngineError>> + 'a
    where
        S: 'a,
    {
        stream::try_unfold(self, |mut paginator| async move {
            let next = paginator.next_page().await?;
            Ok(next.map(|page| ((paginator.cursor.page_index, page), paginator)))
        })
    }
}
