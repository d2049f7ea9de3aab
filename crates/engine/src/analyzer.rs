use crate::error::EngineError;
use connectors::source::RelationalSource;
use model::schema::source::{Relationship, RelationshipKind, SourceSchema};
use tracing::info;

/// Thresholds for the embed/reference decision. These started out as
/// arbitrary constants in the field; they are kept configurable rather than
/// guessing at deeper intent.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// A referencing table with fewer columns than this is a candidate for
    /// embedding.
    pub embed_max_columns: usize,
    /// Constraints spanning more columns than this always classify as
    /// references.
    pub embed_max_fk_columns: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            embed_max_columns: 5,
            embed_max_fk_columns: 1,
        }
    }
}

/// Classifies a relationship from the feature pair
/// `(referencing table column count, foreign key column count)`.
///
/// This is a fixed-threshold heuristic, deliberately explicit: narrow tables
/// joined over a simple key embed; everything else references. Given the
/// same table shapes, the result is always the same.
pub fn classify(
    config: &ClassifierConfig,
    source_columns: usize,
    fk_columns: usize,
) -> RelationshipKind {
    if source_columns < config.embed_max_columns && fk_columns <= config.embed_max_fk_columns {
        RelationshipKind::Embed
    } else {
        RelationshipKind::Reference
    }
}

/// Introspects the live source connection into an in-memory schema graph.
#[derive(Debug, Clone, Default)]
pub struct SchemaAnalyzer {
    classifier: ClassifierConfig,
}

impl SchemaAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: ClassifierConfig) -> Self {
        SchemaAnalyzer { classifier }
    }

    /// Read-only against the source. Fails with a source error when the
    /// introspection queries fail, and with a schema error when the graph is
    /// inconsistent (a foreign key referencing a table that does not exist).
    pub async fn analyze(
        &self,
        source: &dyn RelationalSource,
    ) -> Result<SourceSchema, EngineError> {
        let names = source.table_names().await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            tables.push(source.table_metadata(name).await?);
        }

        let mut relationships = Vec::new();
        for table in &tables {
            for fk in &table.foreign_keys {
                relationships.push(Relationship {
                    source_table: table.name.clone(),
                    target_table: fk.referenced_table.clone(),
                    source_column: fk.column().to_string(),
                    target_column: fk.referenced_column().to_string(),
                    kind: classify(&self.classifier, table.columns.len(), fk.columns.len()),
                });
            }
        }

        let schema = SourceSchema {
            tables,
            relationships,
        };

        for relationship in &schema.relationships {
            if !schema.contains_table(&relationship.target_table) {
                return Err(EngineError::Schema(format!(
                    "foreign key on `{}` references missing table `{}`",
                    relationship.source_table, relationship.target_table
                )));
            }
        }

        info!(
            tables = schema.tables.len(),
            relationships = schema.relationships.len(),
            "schema analysis completed"
        );
        Ok(schema)
    }
}
