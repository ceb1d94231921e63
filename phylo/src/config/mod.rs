//! Configuration system for Phylo.
//!
//! Configuration is layered from defaults, config files, the XDG config
//! directory and `PHYLO_` environment variables, then validated.

mod builder;
mod loader;
mod models;
#[cfg(test)]
mod tests;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;
pub use validation::validate_config;

/// Default configuration file names that the system will look for
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "phylo.toml",
    "phylo.yaml",
    "phylo.yml",
    "phylo.json",
    ".phylo/config.toml",
    ".phylo/config.yaml",
    ".phylo/config.yml",
    ".phylo/config.json",
];

/// Environment variable prefix for Phylo configuration
pub const ENV_PREFIX: &str = "PHYLO_";

/// Separator for nested keys in environment variables, e.g.
/// `PHYLO_GRAPH__INDEX_CACHE_SIZE`
pub const ENV_SEPARATOR: &str = "__";

/// Failure to assemble a [`PhyloConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot load config file: {0}")]
    FileLoadError(String),

    /// The merged configuration is inconsistent
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// A source could not be deserialized into [`PhyloConfig`]
    #[error("malformed configuration: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for crate::PhyloError {
    fn from(err: ConfigError) -> Self {
        crate::PhyloError::Configuration(err.to_string())
    }
}
