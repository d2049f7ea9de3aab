use crate::error::DbError;
use async_trait::async_trait;
use model::{records::row::Row, schema::source::Table};

pub mod memory;
pub mod mysql;

/// Read-only view over a relational source.
///
/// `fetch_page` is offset-based (`LIMIT`/`OFFSET`); under concurrent writes
/// to the source, rows may be skipped or duplicated. That is an accepted
/// limitation of this design, not a bug.
#[async_trait]
pub trait RelationalSource: Send + Sync {
    /// Short label used in metric names, e.g. `mysql`.
    fn kind(&self) -> &'static str;

    async fn table_names(&self) -> Result<Vec<String>, DbError>;

    async fn table_metadata(&self, table: &str) -> Result<Table, DbError>;

    async fn fetch_page(&self, table: &str, limit: usize, offset: u64)
    -> Result<Vec<Row>, DbError>;

    async fn count(&self, table: &str) -> Result<u64, DbError>;

    /// Up to `limit` rows drawn for verification sampling. Row order is
    /// implementation-defined; the MySQL source randomizes, the in-memory
    /// source is deterministic.
    async fn sample(&self, table: &str, limit: usize) -> Result<Vec<Row>, DbError>;
}
