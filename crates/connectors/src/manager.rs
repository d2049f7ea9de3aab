use crate::{
    error::ConnectorError,
    source::{RelationalSource, mysql::MySqlSource},
    target::DocumentStore,
};
use model::config::SourceConfig;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

enum SourceSlot {
    /// Injected connection, returned as-is (tests, embedded use).
    Fixed(Arc<dyn RelationalSource>),
    /// Lazily connected and cached, keyed by connection URL.
    Lazy(Mutex<Option<(String, Arc<dyn RelationalSource>)>>),
}

/// Owns the two long-lived store connections for the process.
///
/// Connection acquisition is idempotent: repeated calls with the same config
/// return the cached connection instead of opening duplicates. A different
/// config replaces the cached source. Lifecycle belongs to whoever
/// constructs the pipeline; there is no process-wide singleton.
pub struct ConnectionManager {
    source: SourceSlot,
    store: Arc<dyn DocumentStore>,
}

impl ConnectionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ConnectionManager {
            source: SourceSlot::Lazy(Mutex::new(None)),
            store,
        }
    }

    /// Builds a manager around already-open connections.
    pub fn preconnected(
        source: Arc<dyn RelationalSource>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        ConnectionManager {
            source: SourceSlot::Fixed(source),
            store,
        }
    }

    pub async fn source_for(
        &self,
        config: &SourceConfig,
    ) -> Result<Arc<dyn RelationalSource>, ConnectorError> {
        match &self.source {
            SourceSlot::Fixed(source) => Ok(Arc::clone(source)),
            SourceSlot::Lazy(slot) => {
                let url = config.url();
                let mut cached = slot.lock().await;

                if let Some((cached_url, source)) = cached.as_ref()
                    && *cached_url == url
                {
                    return Ok(Arc::clone(source));
                }

                if cached.is_some() {
                    info!(database = %config.database, "source config changed, reconnecting");
                }

                let source: Arc<dyn RelationalSource> =
                    Arc::new(MySqlSource::connect(config).await?);
                *cached = Some((url, Arc::clone(&source)));
                Ok(source)
            }
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{source::memory::MemorySource, target::memory::MemoryStore};

    #[tokio::test]
    async fn preconnected_manager_ignores_config() {
        let source: Arc<dyn RelationalSource> = Arc::new(MemorySource::new());
        let manager = ConnectionManager::preconnected(source, Arc::new(MemoryStore::new()));

        let config = SourceConfig {
            host: "nowhere".into(),
            port: 3306,
            username: "u".into(),
            password: "p".into(),
            database: "d".into(),
        };
        let resolved = manager.source_for(&config).await.unwrap();
        assert_eq!(resolved.kind(), "memory");
    }
}
