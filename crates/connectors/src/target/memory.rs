use crate::{
    error::StoreError,
    target::{DocumentStore, upsert_into},
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::document::Document,
    schema::target::{MappedCollection, MappedIndex},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    indexes: HashMap<String, Vec<MappedIndex>>,
}

/// In-memory document store, used by tests and dry runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's documents, for assertions.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .read()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn index_specs(&self, collection: &str) -> Vec<MappedIndex> {
        self.inner
            .read()
            .await
            .indexes
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn prepare_collection(&self, collection: &MappedCollection) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.collections.insert(collection.name.clone(), Vec::new());
        inner
            .indexes
            .insert(collection.name.clone(), collection.indexes.clone());
        Ok(())
    }

    async fn upsert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let buffer = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        upsert_into(buffer, documents);
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        let buffer = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(buffer.len() as u64)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        let buffer = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(buffer.iter().find(|d| d.get(field) == Some(value)).cloned())
    }
}
