use crate::{error::SoqlError, projection};
use serde::Serialize;

/// Ordered `old -> new` text replacements applied to projected identifiers.
///
/// Pairs run in insertion order, so a later pair sees the output of earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.pairs.push((old.into(), new.into()));
        self
    }

    /// Parses one `OLD=NEW` pair as given on the command line.
    pub fn parse_pair(raw: &str) -> Result<(String, String), SoqlError> {
        match raw.split_once('=') {
            Some((old, new)) if !old.is_empty() => Ok((old.to_string(), new.to_string())),
            _ => Err(SoqlError::InvalidSubstitution(raw.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn apply(&self, identifier: &str) -> String {
        self.pairs
            .iter()
            .fold(identifier.to_string(), |acc, (old, new)| acc.replace(old, new))
    }
}

impl FromIterator<(String, String)> for Substitutions {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Substitutions {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Projected identifiers of `query` with `substitutions` applied, in declared order.
///
/// Duplicates are kept positionally.
pub fn extract_columns(
    query: &str,
    substitutions: &Substitutions,
) -> Result<Vec<String>, SoqlError> {
    let parsed = projection::parse(query)?;
    Ok(parsed
        .identifiers
        .iter()
        .map(|id| substitutions.apply(id))
        .collect())
}

/// Output column name: any residual `.` becomes `_`, then the name is lower-cased.
pub fn normalize_col_name(name: &str) -> String {
    name.replace('.', "_").to_lowercase()
}

/// Declared shape of one query execution's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSchema {
    pub table: String,
    /// Projected identifiers before any substitution (`Account.Name`).
    pub identifiers: Vec<String>,
    /// Normalized output column names, one per identifier, after substitution.
    pub columns: Vec<String>,
    /// Normalized identifiers without substitution (`account_name`); the names
    /// flattened record fields are looked up by.
    pub keys: Vec<String>,
}

impl OutputSchema {
    pub fn from_query(query: &str, substitutions: &Substitutions) -> Result<Self, SoqlError> {
        let parsed = projection::parse(query)?;
        Ok(Self::from_projection(parsed, substitutions))
    }

    pub fn from_projection(
        parsed: projection::ParsedProjection,
        substitutions: &Substitutions,
    ) -> Self {
        let columns = parsed
            .identifiers
            .iter()
            .map(|id| normalize_col_name(&substitutions.apply(id)))
            .collect();
        let keys = parsed
            .identifiers
            .iter()
            .map(|id| normalize_col_name(id))
            .collect();

        OutputSchema {
            table: parsed.table,
            identifiers: parsed.identifiers,
            columns,
            keys,
        }
    }

    /// Left-hand segments of every dotted identifier, first occurrence order.
    pub fn join_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for identifier in &self.identifiers {
            if let Some((group, _)) = identifier.split_once('.') {
                if !groups.iter().any(|g| g == group) {
                    groups.push(group.to_string());
                }
            }
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
