//! Configuration structures, deserialized by figment

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::TreeSettings;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PhyloConfig {
    pub logging: LoggingConfig,

    /// Kinship graph configuration
    pub graph: GraphConfig,

    /// Settings given to newly created trees
    pub defaults: TreeSettings,
}

/// Kinship graph configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of kinship indexes kept in the LRU cache
    pub index_cache_size: usize,

    /// How long a mutation waits for its tree's lock, in milliseconds
    pub lock_timeout_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            index_cache_size: 64,
            lock_timeout_ms: 5000,
        }
    }
}

/// Where and how events are logged
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,

    /// Optional log file, written through a non-blocking appender
    pub file: Option<PathBuf>,

    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Default,
            file: None,
            stdout: true,
        }
    }
}

/// Minimum level of emitted events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Case-insensitive; `warning` is accepted for `warn`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        [LogLevel::Trace, LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error]
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .or((normalized == "warning").then_some(LogLevel::Warn))
            .ok_or_else(|| format!("unknown log level '{}'", s))
    }
}

/// Layout of emitted log lines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full single-line format
    Default,

    /// JSON, one object per event
    Json,

    /// Abbreviated single-line format
    Compact,

    /// Multi-line human-oriented format
    Pretty,
}
