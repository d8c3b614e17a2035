use crate::error::EngineError;
use model::{
    core::value::Value,
    pagination::page::{METADATA_KEY, Page, RawRecord},
    records::{frame::Frame, row::FlatRow},
};
use soql_syntax::columns::OutputSchema;
use std::collections::HashMap;

/// Turns nested page records into rows aligned with an [`OutputSchema`].
///
/// Joined sub-objects (the left-hand segment of a dotted identifier) are
/// inlined as `{group}_{field}`, lower-cased, recursing through deeper joins.
/// A join that is `null` on a record yields `Null` for each of its columns.
/// Scalars pass through untouched.
///
/// Fields are selected by the schema's lookup keys; the frame is labelled with
/// its output columns, so substitutions rename headers without touching lookup.
#[derive(Debug, Clone)]
pub struct RowFlattener {
    columns: Vec<String>,
    keys: Vec<String>,
    groups: Vec<String>,
}

impl RowFlattener {
    pub fn new(schema: &OutputSchema) -> Self {
        RowFlattener {
            columns: schema.columns.clone(),
            keys: schema.keys.clone(),
            groups: schema.join_groups(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Flattens every record of `page` into one frame.
    ///
    /// An empty page gives an empty frame that still carries the columns.
    pub fn flatten_page(&self, page: Page, page_index: usize) -> Result<Frame, EngineError> {
        let rows = page
            .records
            .into_iter()
            .map(|record| self.flatten_record(record, page_index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame::new(self.columns.clone(), rows, page_index))
    }

    pub fn flatten_record(
        &self,
        record: RawRecord,
        page_index: usize,
    ) -> Result<FlatRow, EngineError> {
        let mut flat = FlatRecord::default();

        for (key, value) in record {
            if key == METADATA_KEY {
                continue;
            }

            let name = key.to_lowercase();
            if self.is_group(&key) {
                flat.inline(name, value);
            } else {
                flat.insert(name, value);
            }
        }

        let mut values = Vec::with_capacity(self.keys.len());
        let mut missing = Vec::new();
        for key in &self.keys {
            match flat.get(key) {
                Some(value) => values.push(value),
                None => missing.push(key.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(EngineError::SchemaMismatch {
                page: page_index,
                missing,
            });
        }

        Ok(FlatRow::new(values))
    }

    fn is_group(&self, key: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(key))
    }
}

/// Single-level view of one record.
#[derive(Default)]
struct FlatRecord {
    fields: HashMap<String, Value>,
    /// Prefixes (`account_`) of joins that were `null` on this record.
    null_joins: Vec<String>,
}

impl FlatRecord {
    fn insert(&mut self, name: String, mut value: serde_json::Value) {
        strip_metadata(&mut value);
        self.fields.insert(name, Value::from(value));
    }

    /// Inlines a joined sub-object under `prefix`.
    fn inline(&mut self, prefix: String, value: serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, nested) in map {
                    if key == METADATA_KEY {
                        continue;
                    }
                    let name = format!("{prefix}_{}", key.to_lowercase());
                    if nested.is_object() || nested.is_null() {
                        self.inline(name, nested);
                    } else {
                        self.insert(name, nested);
                    }
                }
            }
            serde_json::Value::Null => {
                self.null_joins.push(format!("{prefix}_"));
                self.fields.insert(prefix, Value::Null);
            }
            other => self.insert(prefix, other),
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.fields.get(key) {
            return Some(value.clone());
        }
        self.null_joins
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
            .then_some(Value::Null)
    }
}

fn strip_metadata(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.remove(METADATA_KEY);
            map.values_mut().for_each(strip_metadata);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_metadata),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::contact;
    use serde_json::json;
    use soql_syntax::columns::Substitutions;

    fn flattener(query: &str) -> RowFlattener {
        RowFlattener::new(&OutputSchema::from_query(query, &Substitutions::new()).unwrap())
    }

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_join_round_trip() {
        let f = flattener("SELECT Id, Account.Name FROM Contact");
        let record = record(json!({
            "attributes": {"type": "Contact"},
            "Id": "1",
            "Account": {"attributes": {"type": "Account"}, "Name": "Acme"},
        }));

        let row = f.flatten_record(record, 1).unwrap();
        assert_eq!(row.fields(), vec!["1", "Acme"]);
    }

    #[test]
    fn test_columns_follow_projection_order() {
        let f = flattener("SELECT Account.Name, Name, Id FROM Contact");
        let row = f.flatten_record(contact("003A", Some("Acme")), 1).unwrap();
        assert_eq!(row.fields(), vec!["Acme", "Contact 003A", "003A"]);
    }

    #[test]
    fn test_null_join_gives_nulls() {
        let f = flattener("SELECT Id, Account.Name, Account.Industry FROM Contact");
        let row = f.flatten_record(contact("003B", None), 1).unwrap();
        assert_eq!(
            row.values,
            vec![Value::String("003B".into()), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_nested_join_is_flattened_recursively() {
        let f = flattener("SELECT Id, Account.Owner.Email, Account.Name FROM Contact");
        let record = record(json!({
            "attributes": {"type": "Contact"},
            "Id": "1",
            "Account": {
                "attributes": {"type": "Account"},
                "Name": "Acme",
                "Owner": {"attributes": {"type": "User"}, "Email": "owner@acme.test"},
            },
        }));

        let row = f.flatten_record(record, 1).unwrap();
        assert_eq!(row.fields(), vec!["1", "owner@acme.test", "Acme"]);
    }

    #[test]
    fn test_scalars_are_not_coerced() {
        let f = flattener("SELECT Id, Amount, IsWon, CloseDate FROM Opportunity");
        let record = record(json!({
            "attributes": {"type": "Opportunity"},
            "Id": "006A",
            "Amount": 1250.5,
            "IsWon": true,
            "CloseDate": "2019-04-30",
        }));

        let row = f.flatten_record(record, 1).unwrap();
        assert_eq!(
            row.values,
            vec![
                Value::String("006A".into()),
                Value::Float(1250.5),
                Value::Boolean(true),
                Value::String("2019-04-30".into()),
            ]
        );
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let f = flattener("SELECT Id, Email FROM Contact");
        let err = f.flatten_record(contact("003A", None), 4).unwrap_err();
        match err {
            EngineError::SchemaMismatch { page, missing } => {
                assert_eq!(page, 4);
                assert_eq!(missing, vec!["email"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_page_keeps_columns() {
        let f = flattener("SELECT Id, Account.Name FROM Contact");
        let page = Page {
            records: Vec::new(),
            done: true,
            next_records_url: None,
            total_size: Some(0),
        };

        let frame = f.flatten_page(page, 1).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.columns, vec!["id", "account_name"]);
    }

    #[test]
    fn test_metadata_stripped_from_unjoined_objects() {
        let f = flattener("SELECT Id, Address FROM Contact");
        let record = record(json!({
            "attributes": {"type": "Contact"},
            "Id": "1",
            "Address": {"attributes": {"type": "Address"}, "city": "Oslo"},
        }));

        let row = f.flatten_record(record, 1).unwrap();
        assert_eq!(row.fields(), vec!["1", r#"{"city":"Oslo"}"#]);
    }
}
