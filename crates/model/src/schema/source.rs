use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One relational attribute, immutable once introspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    /// Source type name as reported by the catalog, e.g. `varchar`.
    pub source_type: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub default_value: Option<Value>,
}

/// One foreign-key constraint. Composite constraints carry all participating
/// columns so the analyzer can feature the column count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    /// Leading column of the constraint.
    pub fn column(&self) -> &str {
        self.columns.first().map(String::as_str).unwrap_or_default()
    }

    pub fn referenced_column(&self) -> &str {
        self.referenced_columns
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    /// The single primary-key column, when the table has exactly one.
    pub fn single_primary_key(&self) -> Option<&Column> {
        let pks = self.primary_key_columns();
        if pks.len() == 1 { Some(pks[0]) } else { None }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Embed,
    Reference,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipKind::Embed => f.write_str("embed"),
            RelationshipKind::Reference => f.write_str("reference"),
        }
    }
}

/// Derived from a foreign key on each analysis pass; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub source_table: String,
    pub target_table: String,
    pub source_column: String,
    pub target_column: String,
    pub kind: RelationshipKind,
}

/// Introspected relational schema graph.
///
/// Invariant: every relationship endpoint names a table present in `tables`.
/// The analyzer enforces this before handing the schema to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SourceSchema {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl SourceSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, pk: bool) -> Column {
        Column {
            name: name.to_string(),
            source_type: "integer".to_string(),
            is_primary_key: pk,
            is_nullable: !pk,
            default_value: None,
        }
    }

    #[test]
    fn single_primary_key_requires_exactly_one() {
        let mut table = Table {
            name: "users".into(),
            columns: vec![column("id", true), column("name", false)],
            foreign_keys: vec![],
        };
        assert_eq!(table.single_primary_key().unwrap().name, "id");

        table.columns.push(column("tenant_id", true));
        assert!(table.single_primary_key().is_none());
        assert_eq!(table.primary_key_columns().len(), 2);
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let schema = SourceSchema {
            tables: vec![Table {
                name: "Orders".into(),
                columns: vec![],
                foreign_keys: vec![],
            }],
            relationships: vec![],
        };
        assert!(schema.contains_table("orders"));
        assert!(!schema.contains_table("payments"));
    }
}
