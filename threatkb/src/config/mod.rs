//! Configuration system for threatkb.
//!
//! Supports loading configuration from multiple sources (files, environment
//! variables, programmatic builder) with validation and defaults.

mod builder;
mod loader;
mod models;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;

/// Default configuration file names the system will look for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "threatkb.toml",
    "threatkb.yaml",
    "threatkb.yml",
    "threatkb.json",
    ".threatkb/config.toml",
    ".threatkb/config.yaml",
    ".threatkb/config.yml",
    ".threatkb/config.json",
];

/// Environment variable prefix for threatkb configuration.
pub const ENV_PREFIX: &str = "THREATKB_";

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during file loading
    #[error("Failed to load configuration file: {0}")]
    FileLoadError(String),

    /// Error occurred during environment loading
    #[error("Failed to load environment variables: {0}")]
    EnvLoadError(String),

    /// Error occurred during validation
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("Configuration parsing error: {0}")]
    ParseError(String),

    /// General error
    #[error("{0}")]
    Other(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
