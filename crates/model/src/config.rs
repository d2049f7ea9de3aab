use serde::{Deserialize, Serialize};

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Connection parameters for the relational source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl SourceConfig {
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// Caller-supplied knobs for one migration run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransformationConfig {
    pub batch_size: usize,
    pub validate_data: bool,
    pub preserve_ids: bool,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        TransformationConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            validate_data: true,
            preserve_ids: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TransformationConfig::default();
        assert_eq!(config.batch_size, 1_000);
        assert!(config.validate_data);
        assert!(config.preserve_ids);
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let config: TransformationConfig =
            serde_json::from_str(r#"{"batch_size": 50}"#).unwrap();
        assert_eq!(config.batch_size, 50);
        assert!(config.validate_data);
    }
}
