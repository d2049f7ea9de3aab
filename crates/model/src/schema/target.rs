use crate::core::{field_type::FieldType, value::Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedField {
    pub name: String,
    pub field_type: FieldType,
    /// `true` exactly when the source column is not nullable.
    pub required: bool,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IndexDirection {
    Ascending,
    Descending,
}

impl IndexDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            IndexDirection::Ascending => 1,
            IndexDirection::Descending => -1,
        }
    }
}

/// Index specification for a target collection. Key order matters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedIndex {
    pub keys: Vec<(String, IndexDirection)>,
    pub unique: bool,
}

impl MappedIndex {
    pub fn ascending(field: &str, unique: bool) -> Self {
        MappedIndex {
            keys: vec![(field.to_string(), IndexDirection::Ascending)],
            unique,
        }
    }
}

/// Target collection derived from one source table; keeps the table name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedCollection {
    pub name: String,
    pub fields: Vec<MappedField>,
    pub indexes: Vec<MappedIndex>,
}

impl MappedCollection {
    pub fn field(&self, name: &str) -> Option<&MappedField> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// Document schema derived deterministically from a [`SourceSchema`]; it has
/// no independent lifecycle and is regenerated on every analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TargetSchema {
    pub collections: Vec<MappedCollection>,
}

impl TargetSchema {
    pub fn collection(&self, name: &str) -> Option<&MappedCollection> {
        self.collections
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
