use crate::{
    analyzer::SchemaAnalyzer,
    config,
    error::EngineError,
    integrity::DataIntegrityChecker,
    mapper,
    metrics::Metrics,
    processor::BatchProcessor,
    run::{RunGuard, RunSnapshot, RunTracker},
};
use connectors::manager::ConnectionManager;
use model::{
    config::{SourceConfig, TransformationConfig},
    schema::target::TargetSchema,
    verify::VerificationResult,
};
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Outcome of one full transformation run.
#[derive(Debug, Clone, Serialize)]
pub struct TransformationResult {
    /// `true` when the pipeline ran to completion. A failing integrity
    /// check does not clear this; it is reported through `verification`.
    pub success: bool,
    pub duration_ms: u64,
    pub tables_processed: usize,
    pub records_processed: u64,
    /// Present when integrity validation was enabled for the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
    pub target_schema: TargetSchema,
}

/// Orchestrates a run end to end: analyze, map, migrate, verify.
///
/// The service owns no global state; everything lives on the instance, and
/// one instance admits one run at a time.
pub struct TransformationService {
    connections: ConnectionManager,
    metrics: Metrics,
    runs: RunTracker,
    analyzer: SchemaAnalyzer,
    processor: BatchProcessor,
    checker: DataIntegrityChecker,
}

impl TransformationService {
    pub fn new(connections: ConnectionManager) -> Self {
        TransformationService {
            connections,
            metrics: Metrics::new(),
            runs: RunTracker::new(),
            analyzer: SchemaAnalyzer::new(),
            processor: BatchProcessor::new(),
            checker: DataIntegrityChecker::new(),
        }
    }

    pub fn with_processor(mut self, processor: BatchProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn status(&self) -> RunSnapshot {
        self.runs.snapshot()
    }

    /// Validates the caller-supplied configs without touching any connection.
    pub fn validate(
        &self,
        source_config: &SourceConfig,
        transformation_config: &TransformationConfig,
    ) -> Result<(), EngineError> {
        config::validate_source_config(source_config)?;
        config::validate_transformation_config(transformation_config)
    }

    /// Claims the run slot synchronously. Rejects with a conflict while
    /// another run is active.
    pub fn begin(&self) -> Result<RunGuard, EngineError> {
        self.runs.begin(&self.metrics)
    }

    /// Runs a complete transformation, claiming and releasing the run slot.
    pub async fn run(
        &self,
        source_config: &SourceConfig,
        transformation_config: &TransformationConfig,
        cancel: &CancellationToken,
    ) -> Result<TransformationResult, EngineError> {
        self.validate(source_config, transformation_config)?;
        let guard = self.begin()?;
        self.run_with_guard(guard, source_config, transformation_config, cancel)
            .await
    }

    /// Runs a transformation under an already-claimed slot. The guard is
    /// released on every exit path.
    pub async fn run_with_guard(
        &self,
        guard: RunGuard,
        source_config: &SourceConfig,
        transformation_config: &TransformationConfig,
        cancel: &CancellationToken,
    ) -> Result<TransformationResult, EngineError> {
        let started = Instant::now();

        match self
            .execute(source_config, transformation_config, cancel)
            .await
        {
            Ok((source_kind, mut result)) => {
                result.duration_ms = started.elapsed().as_millis() as u64;
                self.metrics
                    .record_transformation_duration(source_kind, result.duration_ms as f64);
                info!(
                    duration_ms = result.duration_ms,
                    records = result.records_processed,
                    success = result.success,
                    "transformation run finished"
                );
                guard.complete();
                Ok(result)
            }
            Err(err) => {
                error!(%err, "transformation run failed");
                guard.fail();
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        source_config: &SourceConfig,
        config: &TransformationConfig,
        cancel: &CancellationToken,
    ) -> Result<(&'static str, TransformationResult), EngineError> {
        let source = self.connections.source_for(source_config).await?;
        let store = self.connections.store();

        let schema = self.analyzer.analyze(source.as_ref()).await?;
        let target = mapper::map_schema(&schema);

        let stats = self
            .processor
            .migrate(
                source.as_ref(),
                store.as_ref(),
                &schema,
                &target,
                config,
                cancel,
                &self.runs,
                &self.metrics,
            )
            .await?;

        let verification = if config.validate_data {
            Some(
                self.checker
                    .verify(source.as_ref(), store.as_ref(), &schema, config.preserve_ids)
                    .await?,
            )
        } else {
            None
        };

        // Completion and validity are separate outcomes: verification never
        // aborts the run, so its findings ride along in the result while the
        // run itself counts as successful.
        let result = TransformationResult {
            success: true,
            duration_ms: 0,
            tables_processed: stats.table_counts.len(),
            records_processed: stats.total_records,
            verification,
            target_schema: target,
        };
        Ok((source.kind(), result))
    }
}
