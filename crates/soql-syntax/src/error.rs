use crate::lexer::error::LexerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoqlError {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Malformed query: {0}")]
    Tokenize(#[from] LexerError),

    #[error("Query expects {expected} parameter(s) but {given} were supplied")]
    ParameterCount { expected: usize, given: usize },

    #[error("Unsupported placeholder '%{0}' in query text")]
    InvalidPlaceholder(char),

    #[error("Invalid column substitution '{0}', expected OLD=NEW")]
    InvalidSubstitution(String),
}
