//! Configuration model definitions.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::EntityKind;

/// Main configuration structure for threatkb.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThreatKbConfig {
    /// Bundle sources, keyed by source name.
    pub sources: HashMap<String, SourceConfig>,

    /// Fetch boundary settings.
    pub fetch: FetchConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Extraction behavior toggles.
    pub extraction: ExtractionConfig,
}

/// One bundle source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Bundle URL.
    pub url: String,

    /// Declared bundle format; only `"stix"` is supported by the loader.
    pub format: String,

    /// Entity kinds the extractor materializes for this source.
    pub entity_types: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            format: "stix".to_string(),
            entity_types: EntityKind::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
        }
    }
}

impl SourceConfig {
    /// Parsed entity kinds. Unknown names are skipped here; validation
    /// rejects them before a config is accepted.
    pub fn entity_kinds(&self) -> HashSet<EntityKind> {
        self.entity_types
            .iter()
            .filter_map(|name| EntityKind::from_name(name))
            .collect()
    }
}

/// Fetch boundary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Bundle request timeout in seconds. The single bounded I/O point of a
    /// load; there is no retry.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Extraction behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Keep records flagged revoked or deprecated.
    pub include_revoked: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to emit.
    pub level: LogLevel,

    /// Output format.
    pub format: LogFormat,

    /// Whether to log to stdout.
    pub stdout: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            stdout: true,
            file: None,
        }
    }
}

/// Log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}
