use serde::{Deserialize, Serialize};
use std::fmt;

/// Field type in the target document store.
///
/// `Mixed` is the degradation target for source types without an explicit
/// mapping; mapping never fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Long,
    Decimal,
    Boolean,
    Date,
    Object,
    Mixed,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Long => "Long",
            FieldType::Decimal => "Decimal",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Object => "Object",
            FieldType::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
