use crate::error::StoreError;
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::document::{Document, ID_FIELD},
    schema::target::MappedCollection,
};

pub mod jsonl;
pub mod memory;

/// Write side of the migration: a document store receiving mapped
/// collections.
///
/// `upsert_many` replaces an existing document with the same `_id` instead
/// of appending, so a retried batch cannot duplicate records. Documents
/// without `_id` are appended as-is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates (or resets) the collection and registers its index specs.
    async fn prepare_collection(&self, collection: &MappedCollection) -> Result<(), StoreError>;

    async fn upsert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError>;

    async fn count(&self, collection: &str) -> Result<u64, StoreError>;

    /// First document whose `field` equals `value`, if any.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError>;
}

/// Applies upsert-by-`_id` semantics to an in-memory collection buffer.
pub(crate) fn upsert_into(buffer: &mut Vec<Document>, documents: Vec<Document>) {
    for document in documents {
        match document.get(ID_FIELD) {
            Some(id) => {
                if let Some(existing) = buffer
                    .iter_mut()
                    .find(|d| d.get(ID_FIELD) == Some(id))
                {
                    *existing = document;
                } else {
                    buffer.push(document);
                }
            }
            None => buffer.push(document),
        }
    }
}
