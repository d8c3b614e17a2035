use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// One flattened record, aligned 1:1 with the column list it was built for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatRow {
    pub values: Vec<Value>,
}

impl FlatRow {
    pub fn new(values: Vec<Value>) -> Self {
        FlatRow { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Text rendering of every cell, in column order.
    pub fn fields(&self) -> Vec<String> {
        self.values.iter().map(Value::as_field).collect()
    }
}

impl From<Vec<Value>> for FlatRow {
    fn from(values: Vec<Value>) -> Self {
        FlatRow::new(values)
    }
}
