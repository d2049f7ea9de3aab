use crate::{
    error::EngineError,
    metrics::ACTIVE_TRANSFORMATIONS,
    run::{RunSnapshot, RunStatus},
    service::TransformationService,
};
use chrono::{DateTime, Utc};
use model::config::{SourceConfig, TransformationConfig};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub active_transformations: u64,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-poll front door for the engine.
///
/// `start` claims the run slot synchronously and drives the pipeline on a
/// background task; callers observe progress through `status` and `metrics`.
pub struct EngineHandle {
    service: Arc<TransformationService>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl EngineHandle {
    pub fn new(service: TransformationService) -> Self {
        EngineHandle {
            service: Arc::new(service),
            cancel: Mutex::new(None),
        }
    }

    /// Kicks off a transformation in the background.
    ///
    /// Validation and the conflict check happen before this returns, so a
    /// rejected start never spawns a task. The run's own outcome is reported
    /// through `status`, not through this call.
    pub fn start(
        &self,
        source_config: SourceConfig,
        transformation_config: TransformationConfig,
    ) -> Result<StartResponse, EngineError> {
        self.service
            .validate(&source_config, &transformation_config)?;
        let guard = self.service.begin()?;

        let token = CancellationToken::new();
        *self.cancel.lock().expect("cancel lock poisoned") = Some(token.clone());

        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            // Failures are recorded on the run slot and logged by the
            // service; nothing is waiting on this task.
            let _ = service
                .run_with_guard(guard, &source_config, &transformation_config, &token)
                .await;
        });

        info!("transformation started");
        Ok(StartResponse {
            success: true,
            message: "Transformation started".to_string(),
        })
    }

    /// Requests cancellation of the active run. Returns `false` when no run
    /// is active: a token left over from a settled run is discarded, not
    /// tripped.
    pub fn cancel(&self) -> bool {
        match self.cancel.lock().expect("cancel lock poisoned").take() {
            Some(token) if self.service.status().status == RunStatus::Running => {
                token.cancel();
                info!("cancellation requested");
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> RunSnapshot {
        self.service.status()
    }

    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.service.metrics().snapshot()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            active_transformations: self.service.metrics().get(ACTIVE_TRANSFORMATIONS) as u64,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{run::RunStatus, testkit};
    use connectors::{
        manager::ConnectionManager,
        source::RelationalSource,
        target::{DocumentStore, memory::MemoryStore},
    };
    use std::time::Duration;
    use tokio::time::sleep;

    fn handle_over(rows: usize) -> (EngineHandle, MemoryStore) {
        let source: Arc<dyn RelationalSource> = Arc::new(testkit::users_source(rows));
        let store = MemoryStore::new();
        let manager = ConnectionManager::preconnected(source, Arc::new(store.clone()));
        (EngineHandle::new(TransformationService::new(manager)), store)
    }

    fn source_config() -> SourceConfig {
        SourceConfig {
            host: "localhost".into(),
            port: 3306,
            username: "root".into(),
            password: "secret".into(),
            database: "app_db".into(),
        }
    }

    async fn wait_until_settled(handle: &EngineHandle) -> RunSnapshot {
        for _ in 0..500 {
            let snapshot = handle.status();
            if snapshot.status != RunStatus::Running {
                return snapshot;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("run did not settle");
    }

    #[tokio::test]
    async fn start_runs_in_the_background_and_completes() {
        let (handle, store) = handle_over(100);

        let response = handle
            .start(source_config(), TransformationConfig::default())
            .unwrap();
        assert!(response.success);

        let snapshot = wait_until_settled(&handle).await;
        assert_eq!(snapshot.status, RunStatus::Completed);
        assert_eq!(snapshot.processed_records, 100);
        assert_eq!(store.count("users").await.unwrap(), 100);

        let metrics = handle.metrics();
        assert_eq!(metrics.get("active_transformations"), Some(&0.0));
        assert!(metrics.contains_key("transformation_duration_memory"));
        assert_eq!(metrics.get("batch_progress_users"), Some(&1000.0));
    }

    #[tokio::test]
    async fn concurrent_start_is_rejected_synchronously() {
        let (handle, _) = handle_over(10_000);

        handle
            .start(source_config(), TransformationConfig::default())
            .unwrap();
        let second = handle.start(source_config(), TransformationConfig::default());
        assert!(matches!(second, Err(EngineError::Conflict)));

        wait_until_settled(&handle).await;
    }

    #[tokio::test]
    async fn invalid_config_never_spawns_a_run() {
        let (handle, _) = handle_over(10);
        let bad = SourceConfig {
            database: "not a db!".into(),
            ..source_config()
        };

        let err = handle
            .start(bad, TransformationConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(handle.status().status, RunStatus::Idle);
    }

    #[tokio::test]
    async fn health_reports_the_active_count() {
        let (handle, _) = handle_over(5);
        let report = handle.health();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.active_transformations, 0);
    }

    #[tokio::test]
    async fn cancel_after_completion_has_nothing_to_cancel() {
        let (handle, _) = handle_over(10);

        handle
            .start(source_config(), TransformationConfig::default())
            .unwrap();
        let snapshot = wait_until_settled(&handle).await;
        assert_eq!(snapshot.status, RunStatus::Completed);

        // The leftover token belongs to a settled run.
        assert!(!handle.cancel());
        assert_eq!(handle.status().status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_stops_an_active_run() {
        let (handle, _) = handle_over(50_000);

        handle
            .start(
                source_config(),
                TransformationConfig {
                    batch_size: 10,
                    validate_data: false,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(handle.cancel());

        let snapshot = wait_until_settled(&handle).await;
        assert_eq!(snapshot.status, RunStatus::Failed);

        // Nothing left to cancel.
        assert!(!handle.cancel());
    }
}
