//! Configuration builder.
//!
//! Programmatic API for creating configurations; the file/env path lives in
//! [`super::ConfigLoader`].

use super::{Result, models::*, validation};
use std::path::PathBuf;

/// Builder for creating `ThreatKbConfig` instances.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: ThreatKbConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: ThreatKbConfig::default(),
        }
    }

    /// Alias for [`ConfigBuilder::new`]; reads as intent at call sites.
    pub fn defaults() -> Self {
        Self::new()
    }

    /// Add a bundle source.
    pub fn with_source(mut self, name: impl Into<String>, source: SourceConfig) -> Self {
        self.config.sources.insert(name.into(), source);
        self
    }

    /// Add an ATT&CK-style source with all four entity kinds requested.
    pub fn with_attack_source(self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.with_source(
            name,
            SourceConfig {
                url: url.into(),
                ..SourceConfig::default()
            },
        )
    }

    /// Set the bundle fetch timeout in seconds.
    pub fn with_fetch_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.fetch.timeout_secs = timeout_secs;
        self
    }

    /// Keep records flagged revoked or deprecated.
    pub fn with_include_revoked(mut self, include: bool) -> Self {
        self.config.extraction.include_revoked = include;
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Log to a file instead of stdout.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.logging.file = Some(path.into());
        self.config.logging.stdout = false;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ThreatKbConfig> {
        validation::validate_config(&self.config)?;
        Ok(self.config)
    }
}
