use crate::{error::EngineError, mapper, processor::transform_row};
use connectors::{source::RelationalSource, target::DocumentStore};
use model::{
    records::document::{Document, ID_FIELD},
    schema::source::SourceSchema,
    verify::{Anomaly, AnomalyKind, Severity, TableVerification, VerificationResult},
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct IntegrityConfig {
    /// Upper bound on the number of records sampled per table.
    pub max_samples: usize,
    /// Field similarity below this is reported as a data anomaly.
    pub similarity_threshold: f64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        IntegrityConfig {
            max_samples: 1_000,
            similarity_threshold: 0.9,
        }
    }
}

/// Post-migration verification: count comparison plus record sampling.
///
/// Findings are collected, never raised; a run that migrated everything
/// still completes even if verification flags anomalies.
#[derive(Debug, Clone, Default)]
pub struct DataIntegrityChecker {
    config: IntegrityConfig,
}

impl DataIntegrityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IntegrityConfig) -> Self {
        DataIntegrityChecker { config }
    }

    pub async fn verify(
        &self,
        source: &dyn RelationalSource,
        store: &dyn DocumentStore,
        schema: &SourceSchema,
        preserve_ids: bool,
    ) -> Result<VerificationResult, EngineError> {
        // The document schema is a pure function of the source schema, so
        // rebuilding it here always matches what the migration wrote.
        let target = mapper::map_schema(schema);
        let mut result = VerificationResult::new();

        for table in &schema.tables {
            let collection = target.collection(&table.name).ok_or_else(|| {
                EngineError::Schema(format!("no mapped collection for table `{}`", table.name))
            })?;

            let mut verification = TableVerification::new(&table.name);
            let source_count = source.count(&table.name).await?;
            let target_count = store.count(&collection.name).await?;
            verification.total_records = source_count;

            if source_count != target_count {
                warn!(
                    table = %table.name,
                    source_count,
                    target_count,
                    "record counts diverge"
                );
                verification.push_anomaly(Anomaly {
                    kind: AnomalyKind::CountMismatch,
                    description: format!(
                        "source has {source_count} records, target has {target_count}"
                    ),
                    severity: Severity::High,
                    record_id: None,
                    confidence: None,
                });
            }

            let Some(pk) = table.single_primary_key() else {
                debug!(table = %table.name, "no single-column primary key, skipping sampling");
                result.absorb(verification);
                continue;
            };
            let pk_name = pk.name.clone();

            let sample_size = self.config.max_samples.min(source_count as usize);
            let rows = source.sample(&table.name, sample_size).await?;
            let lookup_field = if preserve_ids { ID_FIELD } else { pk_name.as_str() };

            for row in &rows {
                let expected = transform_row(row, collection, Some(&pk_name), preserve_ids);
                let Some(id) = expected.get(&pk_name).filter(|v| !v.is_null()) else {
                    continue;
                };

                match store
                    .find_by_field(&collection.name, lookup_field, id)
                    .await?
                {
                    None => verification.push_anomaly(Anomaly {
                        kind: AnomalyKind::MissingRecord,
                        description: format!(
                            "record `{}` from `{}` was not found in the target",
                            id.as_string().unwrap_or_default(),
                            table.name
                        ),
                        severity: Severity::High,
                        record_id: Some(id.clone()),
                        confidence: None,
                    }),
                    Some(actual) => {
                        verification.verified_records += 1;
                        let similarity = field_similarity(&expected, &actual);
                        if similarity < self.config.similarity_threshold {
                            verification.push_anomaly(Anomaly {
                                kind: AnomalyKind::DataAnomaly,
                                description: format!(
                                    "record `{}` in `{}` has a diverging field set",
                                    id.as_string().unwrap_or_default(),
                                    table.name
                                ),
                                severity: Severity::Medium,
                                record_id: Some(id.clone()),
                                confidence: Some(similarity),
                            });
                        }
                    }
                }
            }

            result.absorb(verification);
        }

        info!(
            tables = result.tables.len(),
            verified = result.verified_records,
            anomalies = result.anomalies.len(),
            valid = result.is_valid,
            "integrity verification completed"
        );
        Ok(result)
    }
}

/// Jaccard index over the two documents' field-name sets, `_id` excluded.
/// Two empty documents compare as identical.
fn field_similarity(expected: &Document, actual: &Document) -> f64 {
    let expected_keys: BTreeSet<&str> = field_names(expected);
    let actual_keys: BTreeSet<&str> = field_names(actual);

    let union = expected_keys.union(&actual_keys).count();
    if union == 0 {
        return 1.0;
    }

    let intersection = expected_keys.intersection(&actual_keys).count();
    intersection as f64 / union as f64
}

fn field_names(document: &Document) -> BTreeSet<&str> {
    document
        .keys()
        .map(String::as_str)
        .filter(|k| *k != ID_FIELD)
        .collect()
}
