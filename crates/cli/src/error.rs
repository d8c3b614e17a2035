use engine_core::error::EngineError;
use soql_syntax::error::SoqlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    Query(#[from] SoqlError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Failed to parse the connection profile: {0}")]
    ProfileParse(serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write rows: {0}")]
    Output(#[from] csv::Error),
}
