//! Configuration builder.

use super::{Result, models::*, validation};
use crate::models::TreeSettings;
use std::path::Path;

/// Builder for creating PhyloConfig instances.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: PhyloConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: PhyloConfig::default(),
        }
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Also write logs to a file
    pub fn with_log_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.logging.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_stdout_logging(mut self, enabled: bool) -> Self {
        self.config.logging.stdout = enabled;
        self
    }

    pub fn with_index_cache_size(mut self, size: usize) -> Self {
        self.config.graph.index_cache_size = size;
        self
    }

    pub fn with_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.graph.lock_timeout_ms = timeout_ms;
        self
    }

    /// Settings given to newly created trees
    pub fn with_default_settings(mut self, settings: TreeSettings) -> Self {
        self.config.defaults = settings;
        self
    }

    /// Configuration for tests: quiet logging and a short lock timeout
    pub fn testing() -> Self {
        Self::new()
            .with_log_level(LogLevel::Warn)
            .with_log_format(LogFormat::Compact)
            .with_lock_timeout_ms(500)
    }

    /// Build the configuration, validating it in the process.
    pub fn build(self) -> Result<PhyloConfig> {
        validation::validate_config(&self.config)?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
