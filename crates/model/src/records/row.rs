use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// One row fetched from the relational source, field order preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Row { fields }
    }

    pub fn from_pairs(pairs: Vec<(&str, Value)>) -> Self {
        Row {
            fields: pairs
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Value for `name`, `Null` when the column is absent.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).map(|f| f.value.clone()).unwrap_or(Value::Null)
    }
}
