use crate::{error::DbError, source::RelationalSource};
use async_trait::async_trait;
use model::{records::row::Row, schema::source::Table};
use std::collections::HashMap;

/// Deterministic in-memory relational source.
///
/// Backs unit tests and dry runs: pagination slices the stored rows in
/// insertion order and `sample` returns the first `min(limit, n)` rows so
/// assertions stay reproducible.
#[derive(Default, Clone)]
pub struct MemorySource {
    tables: Vec<Table>,
    rows: HashMap<String, Vec<Row>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: Table, rows: Vec<Row>) -> Self {
        self.rows.insert(table.name.clone(), rows);
        self.tables.push(table);
        self
    }

    fn table_rows(&self, table: &str) -> Result<&Vec<Row>, DbError> {
        self.rows
            .get(table)
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))
    }
}

#[async_trait]
impl RelationalSource for MemorySource {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn table_names(&self) -> Result<Vec<String>, DbError> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn table_metadata(&self, table: &str) -> Result<Table, DbError> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .cloned()
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))
    }

    async fn fetch_page(
        &self,
        table: &str,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<Row>, DbError> {
        let rows = self.table_rows(table)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(rows.len());
        let end = start.saturating_add(limit).min(rows.len());
        Ok(rows[start..end].to_vec())
    }

    async fn count(&self, table: &str) -> Result<u64, DbError> {
        Ok(self.table_rows(table)?.len() as u64)
    }

    async fn sample(&self, table: &str, limit: usize) -> Result<Vec<Row>, DbError> {
        let rows = self.table_rows(table)?;
        Ok(rows[..limit.min(rows.len())].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::value::Value, records::row::Row, schema::source::Table};

    fn source_with_rows(n: usize) -> MemorySource {
        let table = Table {
            name: "items".into(),
            columns: vec![],
            foreign_keys: vec![],
        };
        let rows = (0..n)
            .map(|i| Row::from_pairs(vec![("id", Value::Int(i as i64))]))
            .collect();
        MemorySource::new().with_table(table, rows)
    }

    #[tokio::test]
    async fn pages_slice_in_order_without_overlap() {
        let source = source_with_rows(5);
        let first = source.fetch_page("items", 2, 0).await.unwrap();
        let second = source.fetch_page("items", 2, 2).await.unwrap();
        let third = source.fetch_page("items", 2, 4).await.unwrap();
        let empty = source.fetch_page("items", 2, 6).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        assert!(empty.is_empty());
        assert_eq!(third[0].value("id"), Value::Int(4));
    }

    #[tokio::test]
    async fn sample_is_bounded_and_deterministic() {
        let source = source_with_rows(3);
        assert_eq!(source.sample("items", 10).await.unwrap().len(), 3);
        assert_eq!(source.sample("items", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let source = source_with_rows(1);
        assert!(matches!(
            source.count("missing").await,
            Err(DbError::UnknownTable(_))
        ));
    }
}
