use crate::error::{EngineError, FieldError};
use model::config::{MAX_BATCH_SIZE, MIN_BATCH_SIZE, SourceConfig, TransformationConfig};

const MAX_HOST_LEN: usize = 255;
const MAX_USERNAME_LEN: usize = 255;
const MAX_DATABASE_LEN: usize = 64;

/// Field-level validation of the caller-supplied source connection config.
pub fn validate_source_config(config: &SourceConfig) -> Result<(), EngineError> {
    let mut errors = Vec::new();

    if config.host.is_empty() {
        errors.push(FieldError::new("host", "Host is required"));
    } else if config.host.len() > MAX_HOST_LEN {
        errors.push(FieldError::new(
            "host",
            format!("Host must be at most {MAX_HOST_LEN} characters"),
        ));
    }

    if config.port == 0 {
        errors.push(FieldError::new("port", "Port must be a positive number"));
    }

    if config.username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    } else if config.username.len() > MAX_USERNAME_LEN {
        errors.push(FieldError::new(
            "username",
            format!("Username must be at most {MAX_USERNAME_LEN} characters"),
        ));
    }

    if config.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    if config.database.is_empty() {
        errors.push(FieldError::new("database", "Database name is required"));
    } else if config.database.len() > MAX_DATABASE_LEN {
        errors.push(FieldError::new(
            "database",
            format!("Database name must be at most {MAX_DATABASE_LEN} characters"),
        ));
    } else if !config
        .database
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push(FieldError::new(
            "database",
            "Database name can only contain letters, numbers, and underscores",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation(errors))
    }
}

pub fn validate_transformation_config(config: &TransformationConfig) -> Result<(), EngineError> {
    if config.batch_size < MIN_BATCH_SIZE || config.batch_size > MAX_BATCH_SIZE {
        return Err(EngineError::Validation(vec![FieldError::new(
            "batch_size",
            format!("Batch size must be between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE}"),
        )]));
    }
    Ok(())
}
