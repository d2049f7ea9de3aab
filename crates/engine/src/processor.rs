use crate::{
    error::EngineError,
    metrics::Metrics,
    retry::{RetryDisposition, RetryError, RetryPolicy},
    run::RunTracker,
};
use connectors::{error::StoreError, source::RelationalSource, target::DocumentStore};
use model::{
    config::TransformationConfig,
    records::{
        document::{Document, ID_FIELD},
        row::Row,
    },
    schema::{
        source::{SourceSchema, Table},
        target::{MappedCollection, TargetSchema},
    },
};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MigrationStats {
    pub table_counts: BTreeMap<String, u64>,
    pub total_records: u64,
    pub batches: u64,
}

/// Moves every table of the source schema into the target store in
/// fixed-size windows.
///
/// Tables are processed sequentially, and within a table each batch runs
/// fetch → transform → write with no pipelining. Pagination is offset-based
/// and therefore not safe under concurrent writes to the source; see
/// [`RelationalSource::fetch_page`].
pub struct BatchProcessor {
    retry: RetryPolicy,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        BatchProcessor {
            retry: RetryPolicy::for_store_writes(),
        }
    }
}

impl BatchProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        BatchProcessor { retry }
    }

    pub async fn migrate(
        &self,
        source: &dyn RelationalSource,
        store: &dyn DocumentStore,
        schema: &SourceSchema,
        target: &TargetSchema,
        config: &TransformationConfig,
        cancel: &CancellationToken,
        run: &RunTracker,
        metrics: &Metrics,
    ) -> Result<MigrationStats, EngineError> {
        let mut stats = MigrationStats::default();

        for table in &schema.tables {
            let collection = target.collection(&table.name).ok_or_else(|| {
                EngineError::Schema(format!("no mapped collection for table `{}`", table.name))
            })?;

            run.add_total(source.count(&table.name).await?);
            let written = self
                .migrate_table(source, store, table, collection, config, cancel, run, metrics)
                .await?;

            stats.total_records += written.records;
            stats.batches += written.batches;
            stats.table_counts.insert(table.name.clone(), written.records);
        }

        info!(
            tables = stats.table_counts.len(),
            records = stats.total_records,
            batches = stats.batches,
            "batch migration completed"
        );
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    async fn migrate_table(
        &self,
        source: &dyn RelationalSource,
        store: &dyn DocumentStore,
        table: &Table,
        collection: &MappedCollection,
        config: &TransformationConfig,
        cancel: &CancellationToken,
        run: &RunTracker,
        metrics: &Metrics,
    ) -> Result<TableCounters, EngineError> {
        store.prepare_collection(collection).await?;

        let primary_key = table.single_primary_key().map(|c| c.name.clone());
        let mut counters = TableCounters::default();
        let mut offset: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let rows = source
                .fetch_page(&table.name, config.batch_size, offset)
                .await
                .map_err(|err| {
                    error!(table = %table.name, offset, %err, "batch fetch failed");
                    EngineError::Migration {
                        table: table.name.clone(),
                        offset,
                        reason: err.to_string(),
                    }
                })?;

            if rows.is_empty() {
                break;
            }

            let fetched = rows.len() as u64;
            let documents: Vec<Document> = rows
                .iter()
                .map(|row| {
                    transform_row(row, collection, primary_key.as_deref(), config.preserve_ids)
                })
                .collect();

            self.write_batch(store, &table.name, documents, offset).await?;

            counters.records += fetched;
            counters.batches += 1;
            offset += config.batch_size as u64;

            run.add_processed(fetched);
            metrics.set_batch_progress(&table.name, offset);
            debug!(
                table = %table.name,
                offset,
                records = counters.records,
                "processed batch"
            );
        }

        info!(
            table = %table.name,
            records = counters.records,
            batches = counters.batches,
            "completed table"
        );
        Ok(counters)
    }

    async fn write_batch(
        &self,
        store: &dyn DocumentStore,
        table: &str,
        documents: Vec<Document>,
        offset: u64,
    ) -> Result<(), EngineError> {
        let outcome = self
            .retry
            .run(
                || {
                    let batch = documents.clone();
                    async move { store.upsert_many(table, batch).await }
                },
                |err: &StoreError| {
                    if err.is_transient() {
                        RetryDisposition::Retry
                    } else {
                        RetryDisposition::Stop
                    }
                },
            )
            .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(RetryError::Fatal(err)) => {
                error!(table, offset, %err, "batch write failed");
                Err(EngineError::Migration {
                    table: table.to_string(),
                    offset,
                    reason: err.to_string(),
                })
            }
            Err(RetryError::AttemptsExceeded(err)) => {
                error!(table, offset, %err, "batch write retries exhausted");
                Err(EngineError::Migration {
                    table: table.to_string(),
                    offset,
                    reason: format!("retries exhausted: {err}"),
                })
            }
        }
    }
}

#[derive(Debug, Default)]
struct TableCounters {
    records: u64,
    batches: u64,
}

/// Builds the target document for one source row.
///
/// Only fields declared in the mapped collection survive; unmapped source
/// columns are dropped. When `preserve_ids` is set and the table has a
/// single-column primary key, the coerced key value is copied into `_id`.
pub fn transform_row(
    row: &Row,
    collection: &MappedCollection,
    primary_key: Option<&str>,
    preserve_ids: bool,
) -> Document {
    let mut document = Document::new();

    for field in &collection.fields {
        let value = row.value(&field.name).coerce_to(field.field_type);
        document.insert(field.name.clone(), value);
    }

    if preserve_ids
        && let Some(pk) = primary_key
        && let Some(id) = document.get(pk)
        && !id.is_null()
    {
        let id = id.clone();
        document.insert(ID_FIELD.to_string(), id);
    }

    document
}
