use model::{
    core::field_type::FieldType,
    schema::{
        source::{SourceSchema, Table},
        target::{IndexDirection, MappedCollection, MappedField, MappedIndex, TargetSchema},
    },
};
use tracing::{info, warn};

/// Fixed relational-type table. Lookup is case-insensitive; anything not
/// listed degrades to `Mixed` instead of failing.
fn field_type_for(source_type: &str) -> FieldType {
    match source_type.to_ascii_lowercase().as_str() {
        "varchar" | "char" | "text" | "tinytext" | "mediumtext" | "longtext" => FieldType::String,
        "integer" | "int" | "smallint" | "mediumint" | "tinyint" => FieldType::Number,
        "float" | "double" => FieldType::Number,
        "bigint" => FieldType::Long,
        "decimal" | "numeric" => FieldType::Decimal,
        "boolean" | "bool" => FieldType::Boolean,
        "date" | "datetime" | "timestamp" => FieldType::Date,
        "json" | "jsonb" => FieldType::Object,
        _ => FieldType::Mixed,
    }
}

/// Derives the target document schema from an introspected source schema.
/// Pure, total, deterministic: same input, same output, no I/O.
pub fn map_schema(schema: &SourceSchema) -> TargetSchema {
    let collections = schema
        .tables
        .iter()
        .map(|table| MappedCollection {
            name: table.name.clone(),
            fields: table.columns.iter().map(map_column).collect(),
            indexes: generate_indexes(table),
        })
        .collect::<Vec<_>>();

    info!(collections = collections.len(), "schema mapping completed");
    TargetSchema { collections }
}

pub fn map_column(column: &model::schema::source::Column) -> MappedField {
    MappedField {
        name: column.name.clone(),
        field_type: field_type_for(&column.source_type),
        required: !column.is_nullable,
        default_value: column.default_value.clone(),
    }
}

/// One unique index on the primary key (compound when the key is composite,
/// which is flagged rather than silently dropped), plus one non-unique index
/// per foreign key on the constraint's leading column.
pub fn generate_indexes(table: &Table) -> Vec<MappedIndex> {
    let mut indexes = Vec::new();

    let pk_columns = table.primary_key_columns();
    match pk_columns.len() {
        0 => {}
        1 => indexes.push(MappedIndex::ascending(&pk_columns[0].name, true)),
        _ => {
            warn!(
                table = %table.name,
                columns = pk_columns.len(),
                "composite primary key; generating a compound unique index"
            );
            indexes.push(MappedIndex {
                keys: pk_columns
                    .iter()
                    .map(|c| (c.name.clone(), IndexDirection::Ascending))
                    .collect(),
                unique: true,
            });
        }
    }

    for fk in &table.foreign_keys {
        indexes.push(MappedIndex::ascending(fk.column(), false));
    }

    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::schema::source::{Column, ForeignKey};

    fn column(name: &str, source_type: &str, pk: bool, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            source_type: source_type.to_string(),
            is_primary_key: pk,
            is_nullable: nullable,
            default_value: None,
        }
    }

    fn fk(column: &str, table: &str) -> ForeignKey {
        ForeignKey {
            columns: vec![column.to_string()],
            referenced_table: table.to_string(),
            referenced_columns: vec!["id".to_string()],
        }
    }

    #[test]
    fn known_types_map_to_documented_targets() {
        let cases = [
            ("varchar", FieldType::String),
            ("TEXT", FieldType::String),
            ("integer", FieldType::Number),
            ("bigint", FieldType::Long),
            ("decimal", FieldType::Decimal),
            ("boolean", FieldType::Boolean),
            ("date", FieldType::Date),
            ("timestamp", FieldType::Date),
            ("json", FieldType::Object),
            ("jsonb", FieldType::Object),
        ];
        for (source, expected) in cases {
            assert_eq!(field_type_for(source), expected, "type {source}");
        }
    }

    #[test]
    fn unknown_types_degrade_to_mixed() {
        assert_eq!(field_type_for("geometry"), FieldType::Mixed);
        assert_eq!(field_type_for(""), FieldType::Mixed);
        assert_eq!(field_type_for("enum"), FieldType::Mixed);
    }

    #[test]
    fn required_mirrors_nullability() {
        for nullable in [true, false] {
            let mapped = map_column(&column("c", "varchar", false, nullable));
            assert_eq!(mapped.required, !nullable);
        }
    }

    #[test]
    fn one_pk_and_two_fks_yield_three_indexes() {
        let table = Table {
            name: "orders".into(),
            columns: vec![
                column("id", "integer", true, false),
                column("user_id", "integer", false, false),
                column("product_id", "integer", false, false),
            ],
            foreign_keys: vec![fk("user_id", "users"), fk("product_id", "products")],
        };

        let indexes = generate_indexes(&table);
        assert_eq!(indexes.len(), 3);
        assert!(indexes[0].unique);
        assert_eq!(indexes[0].keys, vec![("id".into(), IndexDirection::Ascending)]);
        assert!(!indexes[1].unique);
        assert!(!indexes[2].unique);
        assert_eq!(indexes[1].keys[0].0, "user_id");
        assert_eq!(indexes[2].keys[0].0, "product_id");
    }

    #[test]
    fn composite_primary_key_becomes_one_compound_unique_index() {
        let table = Table {
            name: "memberships".into(),
            columns: vec![
                column("user_id", "integer", true, false),
                column("group_id", "integer", true, false),
            ],
            foreign_keys: vec![],
        };

        let indexes = generate_indexes(&table);
        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].unique);
        assert_eq!(indexes[0].keys.len(), 2);
    }

    #[test]
    fn mapping_is_deterministic_end_to_end() {
        let schema = SourceSchema {
            tables: vec![Table {
                name: "users".into(),
                columns: vec![
                    column("id", "int", true, false),
                    column("name", "varchar", false, false),
                    column("created_at", "timestamp", false, true),
                ],
                foreign_keys: vec![],
            }],
            relationships: vec![],
        };

        let first = map_schema(&schema);
        let second = map_schema(&schema);
        assert_eq!(first, second);

        let users = first.collection("users").unwrap();
        assert_eq!(users.fields[0].field_type, FieldType::Number);
        assert!(users.fields[0].required);
        assert_eq!(users.fields[2].field_type, FieldType::Date);
        assert!(!users.fields[2].required);
        assert_eq!(users.indexes.len(), 1);
    }
}
