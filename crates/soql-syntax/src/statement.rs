use crate::error::SoqlError;
use serde::{Deserialize, Serialize};

/// Raw query text plus optional positional parameters.
///
/// Parameters replace `%s` placeholders in order. `%%` renders a literal `%`.
/// Without parameters the text is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStatement {
    text: String,
    params: Vec<String>,
}

impl QueryStatement {
    pub fn new(text: impl Into<String>) -> Self {
        QueryStatement {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Produces the executable query text.
    pub fn render(&self) -> Result<String, SoqlError> {
        if self.params.is_empty() {
            return Ok(self.text.clone());
        }

        let expected = count_placeholders(&self.text)?;
        if expected != self.params.len() {
            return Err(SoqlError::ParameterCount {
                expected,
                given: self.params.len(),
            });
        }

        let mut rendered = String::with_capacity(self.text.len());
        let mut params = self.params.iter();
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                rendered.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => rendered.push('%'),
                Some('s') => {
                    if let Some(param) = params.next() {
                        rendered.push_str(param);
                    }
                }
                Some(other) => return Err(SoqlError::InvalidPlaceholder(other)),
                None => return Err(SoqlError::InvalidPlaceholder('%')),
            }
        }

        Ok(rendered)
    }
}

fn count_placeholders(text: &str) -> Result<usize, SoqlError> {
    let mut count = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('%') => {}
            Some('s') => count += 1,
            Some(other) => return Err(SoqlError::InvalidPlaceholder(other)),
            None => return Err(SoqlError::InvalidPlaceholder('%')),
        }
    }
    Ok(count)
}

/// Splits a comma separated parameter string ("a, b") into trimmed values.
pub fn split_params(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_substitution() {
        let stmt = QueryStatement::new(
            "SELECT Id FROM Contact WHERE CreatedDate > %s AND CreatedDate < %s",
        )
        .with_params(["2019-04-01T00:00:00Z", "2019-05-01T00:00:00Z"]);

        assert_eq!(
            stmt.render().unwrap(),
            "SELECT Id FROM Contact WHERE CreatedDate > 2019-04-01T00:00:00Z AND CreatedDate < 2019-05-01T00:00:00Z"
        );
    }

    #[test]
    fn test_no_params_is_verbatim() {
        let stmt = QueryStatement::new("SELECT Id FROM Lead WHERE Name LIKE 'A%'");
        assert_eq!(stmt.render().unwrap(), stmt.text());
    }

    #[test]
    fn test_escaped_percent() {
        let stmt = QueryStatement::new("SELECT Id FROM Lead WHERE Name LIKE '%%%s%%'")
            .with_params(["acme"]);
        assert_eq!(
            stmt.render().unwrap(),
            "SELECT Id FROM Lead WHERE Name LIKE '%acme%'"
        );
    }

    #[test]
    fn test_too_few_params() {
        let stmt = QueryStatement::new("SELECT Id FROM Lead WHERE A = %s AND B = %s")
            .with_params(["1"]);
        assert!(matches!(
            stmt.render(),
            Err(SoqlError::ParameterCount {
                expected: 2,
                given: 1
            })
        ));
    }

    #[test]
    fn test_too_many_params() {
        let stmt = QueryStatement::new("SELECT Id FROM Lead").with_params(["1"]);
        assert!(matches!(
            stmt.render(),
            Err(SoqlError::ParameterCount {
                expected: 0,
                given: 1
            })
        ));
    }

    #[test]
    fn test_unsupported_placeholder() {
        let stmt = QueryStatement::new("SELECT Id FROM Lead WHERE A = %d").with_params(["1"]);
        assert!(matches!(stmt.render(), Err(SoqlError::InvalidPlaceholder('d'))));
    }

    #[test]
    fn test_split_params() {
        assert_eq!(split_params("a, b ,c"), vec!["a", "b", "c"]);
        assert!(split_params("").is_empty());
    }
}
