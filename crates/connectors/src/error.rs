use thiserror::Error;

/// Errors happening during connection setup. Malformed connection URLs
/// surface as the driver's `Url` error.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The driver failed to build the connection or pool.
    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),
}

/// All errors coming from the relational source layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// A fetched value could not be decoded into the runtime model.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The requested table is not known to the source.
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

/// Errors coming from the target document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing a batch failed at the application level.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

impl DbError {
    /// Transient failures are worth retrying; everything else is fatal.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Io(_) | DbError::MySql(mysql_async::Error::Io(_)))
    }
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Write(_))
    }
}
