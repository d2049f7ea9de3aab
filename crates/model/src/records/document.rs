use crate::core::value::Value;
use std::collections::BTreeMap;

/// Reserved identity field in the target store. When `preserve_ids` is set
/// the migrated primary-key value lands here and writes upsert on it.
pub const ID_FIELD: &str = "_id";

/// One document written to the target store; key order is deterministic.
pub type Document = BTreeMap<String, Value>;
