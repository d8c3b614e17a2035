use crate::pagination::page::{Page, PageError};
use serde::Serialize;
use uuid::Uuid;

/// Where a query execution stands between two page fetches.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum CursorState {
    /// Nothing fetched yet; the next request carries the query text.
    Initial,

    /// The last page reported more data; holds its continuation reference.
    More(String),

    /// The last page reported `done`, or the execution failed.
    Done,
}

/// Per-execution pagination state. Never shared between executions.
#[derive(Serialize, Debug, Clone)]
pub struct PaginationCursor {
    pub table: String,
    pub columns: Vec<String>,
    pub state: CursorState,
    /// Number of pages fetched so far; the first page is 1.
    pub page_index: usize,
    /// Only used to tie log lines of one execution together.
    pub correlation_id: Uuid,
}

impl PaginationCursor {
    pub fn new(table: &str, columns: Vec<String>) -> Self {
        PaginationCursor {
            table: table.to_string(),
            columns,
            state: CursorState::Initial,
            page_index: 0,
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn current_token(&self) -> Option<&str> {
        match &self.state {
            CursorState::More(token) => Some(token),
            CursorState::Initial | CursorState::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == CursorState::Done
    }

    /// Records a fetched page and moves to `More` or `Done`.
    pub fn advance(&mut self, page: &Page) -> Result<(), PageError> {
        let next = match page.continuation() {
            Ok(next) => next.map(str::to_string),
            Err(err) => {
                self.finish();
                return Err(err);
            }
        };

        self.page_index += 1;
        self.state = match next {
            Some(token) => CursorState::More(token),
            None => CursorState::Done,
        };
        Ok(())
    }

    pub fn finish(&mut self) {
        self.state = CursorState::Done;
    }
}
