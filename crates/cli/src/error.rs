use connectors::error::{ConnectorError, StoreError};
use engine::error::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No password given and DB_PASSWORD is not set")]
    MissingPassword,

    #[error("Failed to connect to the source database: {0}")]
    Connect(#[from] ConnectorError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
