//! Shared fixtures for the engine tests.

use async_trait::async_trait;
use connectors::{
    error::StoreError,
    source::memory::MemorySource,
    target::{DocumentStore, memory::MemoryStore},
};
use model::{
    core::value::Value,
    records::{document::Document, row::Row},
    schema::{
        source::{Column, SourceSchema, Table},
        target::MappedCollection,
    },
};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn users_table() -> Table {
    Table {
        name: "users".to_string(),
        columns: vec![
            Column {
                name: "id".to_string(),
                source_type: "int".to_string(),
                is_primary_key: true,
                is_nullable: false,
                default_value: None,
            },
            Column {
                name: "name".to_string(),
                source_type: "varchar".to_string(),
                is_primary_key: false,
                is_nullable: false,
                default_value: None,
            },
            Column {
                name: "created_at".to_string(),
                source_type: "timestamp".to_string(),
                is_primary_key: false,
                is_nullable: true,
                default_value: None,
            },
        ],
        foreign_keys: vec![],
    }
}

pub fn users_schema() -> SourceSchema {
    SourceSchema {
        tables: vec![users_table()],
        relationships: vec![],
    }
}

pub fn users_rows(count: usize) -> Vec<Row> {
    (1..=count)
        .map(|i| {
            Row::from_pairs(vec![
                ("id", Value::Int(i as i64)),
                ("name", Value::String(format!("user_{i}"))),
                ("created_at", Value::String("2024-01-02 03:04:05".to_string())),
            ])
        })
        .collect()
}

pub fn users_source(count: usize) -> MemorySource {
    MemorySource::new().with_table(users_table(), users_rows(count))
}

enum FailureMode {
    /// Fails the first `n` writes with a transient error, then delegates.
    Transient(AtomicUsize),
    /// Every write fails with a non-transient error.
    Fatal,
}

/// Store wrapper that injects write failures in front of a [`MemoryStore`].
pub struct FlakyStore {
    inner: MemoryStore,
    mode: FailureMode,
}

impl FlakyStore {
    pub fn transient(failures: usize) -> Self {
        FlakyStore {
            inner: MemoryStore::new(),
            mode: FailureMode::Transient(AtomicUsize::new(failures)),
        }
    }

    pub fn fatal() -> Self {
        FlakyStore {
            inner: MemoryStore::new(),
            mode: FailureMode::Fatal,
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

/// Store wrapper that acknowledges every write but silently drops the
/// documents, leaving the target empty.
pub struct LossyStore {
    inner: MemoryStore,
}

impl LossyStore {
    pub fn new() -> Self {
        LossyStore {
            inner: MemoryStore::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for LossyStore {
    async fn prepare_collection(&self, collection: &MappedCollection) -> Result<(), StoreError> {
        self.inner.prepare_collection(collection).await
    }

    async fn upsert_many(
        &self,
        _collection: &str,
        _documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.inner.count(collection).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.find_by_field(collection, field, value).await
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn prepare_collection(&self, collection: &MappedCollection) -> Result<(), StoreError> {
        self.inner.prepare_collection(collection).await
    }

    async fn upsert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        match &self.mode {
            FailureMode::Transient(remaining) => {
                if remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
                {
                    return Err(StoreError::Write("injected transient failure".to_string()));
                }
                self.inner.upsert_many(collection, documents).await
            }
            FailureMode::Fatal => Err(StoreError::UnknownCollection(
                "injected fatal failure".to_string(),
            )),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        self.inner.count(collection).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.find_by_field(collection, field, value).await
    }
}
