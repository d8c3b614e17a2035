use crate::records::row::FlatRow;
use chrono::{DateTime, Utc};

/// The flattened rows of one page together with the column names they follow.
///
/// A frame may hold zero rows; sinks still use its columns to write headers
/// or create tables.
#[derive(Debug, Clone)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
    pub page_index: usize,
    pub fetched_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<FlatRow>, page_index: usize) -> Self {
        Frame {
            columns,
            rows,
            page_index,
            fetched_at: Utc::now(),
        }
    }

    pub fn empty(columns: Vec<String>, page_index: usize) -> Self {
        Frame::new(columns, Vec::new(), page_index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks a column up by name, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }
}
