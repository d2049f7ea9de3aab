use crate::{
    error::StoreError,
    target::{DocumentStore, upsert_into},
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    records::document::Document,
    schema::target::MappedCollection,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::RwLock,
};
use tracing::info;

/// File-backed document store: one JSON-Lines file per collection under a
/// data directory, plus a `<name>.indexes.json` sidecar with the index
/// specs.
///
/// Batches are appended; because upserts can rewrite a document, the file is
/// append-ordered with last-wins semantics per `_id`. Reads are served from
/// the in-memory mirror kept alongside the files; reopening a directory
/// rehydrates the mirror from the `.jsonl` files with the same last-wins
/// fold.
pub struct JsonlStore {
    root: PathBuf,
    mirror: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl JsonlStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        let mirror = rehydrate(&root).await?;
        info!(
            path = %root.display(),
            collections = mirror.len(),
            "opened JSONL document store"
        );
        Ok(JsonlStore {
            root,
            mirror: Arc::new(RwLock::new(mirror)),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }

    /// Documents currently mirrored for a collection, for assertions.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.mirror
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn indexes_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.indexes.json"))
    }
}

/// Rebuilds the in-memory mirror from the `.jsonl` files under `root`,
/// folding duplicate `_id`s last-wins the same way the write path does.
async fn rehydrate(root: &Path) -> Result<HashMap<String, Vec<Document>>, StoreError> {
    let mut mirror = HashMap::new();

    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "jsonl") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let raw = fs::read_to_string(&path).await?;
        let mut buffer = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            let document: Document = serde_json::from_str(line)?;
            upsert_into(&mut buffer, vec![document]);
        }
        mirror.insert(name.to_string(), buffer);
    }

    Ok(mirror)
}

#[async_trait]
impl DocumentStore for JsonlStore {
    async fn prepare_collection(&self, collection: &MappedCollection) -> Result<(), StoreError> {
        fs::write(self.collection_path(&collection.name), b"").await?;
        let specs = serde_json::to_vec_pretty(&collection.indexes)?;
        fs::write(self.indexes_path(&collection.name), specs).await?;

        self.mirror
            .write()
            .await
            .insert(collection.name.clone(), Vec::new());
        Ok(())
    }

    async fn upsert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        let mut mirror = self.mirror.write().await;
        let buffer = mirror
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let mut lines = Vec::new();
        for document in &documents {
            lines.extend_from_slice(&serde_json::to_vec(document)?);
            lines.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(self.collection_path(collection))
            .await?;
        file.write_all(&lines).await?;
        file.flush().await?;

        upsert_into(buffer, documents);
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let mirror = self.mirror.read().await;
        let buffer = mirror
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
        let mirror = self.mirror.read().await;
        let buffer = mirror
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(buffer.iter().find(|d| d.get(field) == Some(value)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::field_type::FieldType,
        records::document::ID_FIELD,
        schema::target::{MappedField, MappedIndex},
    };
    use tempfile::tempdir;

    fn users_collection() -> MappedCollection {
        MappedCollection {
            name: "users".into(),
            fields: vec![MappedField {
                name: "id".into(),
                field_type: FieldType::Number,
                required: true,
                default_value: None,
            }],
            indexes: vec![MappedIndex::ascending("id", true)],
        }
    }

    fn doc(id: i64) -> Document {
        let mut d = Document::new();
        d.insert(ID_FIELD.to_string(), Value::Int(id));
        d
    }

    #[tokio::test]
    async fn writes_land_on_disk_and_in_mirror() {
        let dir = tempdir().unwrap();
        let store = JsonlStore::open(dir.path()).await.unwrap();
        store.prepare_collection(&users_collection()).await.unwrap();

        store.upsert_many("users", vec![doc(1), doc(2)]).await.unwrap();

        assert_eq!(store.count("users").await.unwrap(), 2);
        let contents = std::fs::read_to_string(dir.path().join("users.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(dir.path().join("users.indexes.json").exists());
    }

    #[tokio::test]
    async fn reopening_rehydrates_collections_from_disk() {
        let dir = tempdir().unwrap();
        {
            let store = JsonlStore::open(dir.path()).await.unwrap();
            store.prepare_collection(&users_collection()).await.unwrap();
            store.upsert_many("users", vec![doc(1), doc(2)]).await.unwrap();
            // A rewrite appends another line for id 1.
            store.upsert_many("users", vec![doc(1)]).await.unwrap();
        }

        let reopened = JsonlStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.count("users").await.unwrap(), 2);
        assert_eq!(reopened.documents("users").await.len(), 2);
        let found = reopened
            .find_by_field("users", ID_FIELD, &Value::Int(2))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn retried_batch_does_not_inflate_count() {
        let dir = tempdir().unwrap();
        let store = JsonlStore::open(dir.path()).await.unwrap();
        store.prepare_collection(&users_collection()).await.unwrap();

        store.upsert_many("users", vec![doc(1)]).await.unwrap();
        store.upsert_many("users", vec![doc(1)]).await.unwrap();

        assert_eq!(store.count("users").await.unwrap(), 1);
        let found = store
            .find_by_field("users", ID_FIELD, &Value::Int(1))
            .await
            .unwrap();
        assert!(found.is_some());
    }
}
