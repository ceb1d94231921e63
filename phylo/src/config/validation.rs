//! Configuration validation utilities.

use super::ConfigError;
use super::models::*;

/// Validate the entire configuration.
pub fn validate_config(config: &PhyloConfig) -> Result<(), ConfigError> {
    validate_graph_config(&config.graph)?;
    validate_logging_config(&config.logging)?;

    config
        .defaults
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("Default tree settings: {}", e)))?;

    Ok(())
}

fn validate_graph_config(config: &GraphConfig) -> Result<(), ConfigError> {
    if config.index_cache_size == 0 {
        return Err(ConfigError::ValidationError(
            "Index cache size must be greater than zero".to_string(),
        ));
    }
    if config.lock_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Lock timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if let Some(file) = &config.file {
        if file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "Log file path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}
