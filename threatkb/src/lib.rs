//! # threatkb
//!
//! Normalized in-memory model of ATT&CK-style threat-intelligence bundles.
//!
//! A bundle arrives as a JSON graph of loosely-structured typed records;
//! threatkb ingests it into typed entities (tactics, techniques, groups,
//! mitigations) linked by resolved relationships: a group *uses* a
//! technique, a mitigation *mitigates* a technique. The result is cached
//! per source for the lifetime of the process.
//!
//! ## Quick Start
//!
//! ```no_run
//! use threatkb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> threatkb::Result<()> {
//!     let config = ConfigBuilder::new()
//!         .with_attack_source(
//!             "enterprise",
//!             "https://raw.githubusercontent.com/mitre/cti/master/enterprise-attack/enterprise-attack.json",
//!         )
//!         .build()?;
//!
//!     let loader = threatkb::init(config)?;
//!     let dataset = loader.load("enterprise").await?;
//!
//!     if let Some(entity) = dataset.find_entity("T1055") {
//!         println!("{}: {}", entity.id(), entity.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Extraction** ([`entity_extraction`]): each raw record is parsed
//!   against a strict typed shape, with a permissive field-by-field fallback;
//!   records without a valid canonical id are dropped.
//! - **Resolution** ([`relationships`]): a bundle-wide internal-ref →
//!   canonical-id index is built first, then "uses" and "mitigates" edges are
//!   mirrored onto the extracted entities. Edges whose endpoints were never
//!   extracted are skipped, so foreign-kind ids cannot leak into entity
//!   lists.
//! - **Loading** ([`dataset`]): fetch → extract → resolve → cache, keyed by
//!   source name. A load either fully succeeds or fails with one fatal error
//!   and caches nothing.

pub mod config;
pub mod dataset;
pub mod entity_extraction;
pub mod logging;
pub mod models;
pub mod relationships;
pub mod stix;

/// The prelude re-exports commonly used types for convenience.
pub mod prelude {
    pub use crate::config::{
        ConfigBuilder, ConfigLoader, LogFormat, LogLevel, SourceConfig, ThreatKbConfig,
    };
    pub use crate::dataset::{BundleFetcher, DatasetLoader, HttpBundleFetcher};
    pub use crate::models::{
        Entity, EntityKind, Group, LoadStats, Mitigation, ParsedDataset, RelationshipRecord,
        Tactic, Technique,
    };
    pub use crate::stix::{Bundle, RawObject};
    pub use crate::{Result, ThreatKbError, init, init_with_defaults};
}

/// Current library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for threatkb operations.
#[derive(Debug, thiserror::Error)]
pub enum ThreatKbError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// Logging error
    #[error("Logging error: {0}")]
    Logging(#[from] logging::LogError),

    /// Dataset loading error
    #[error("Dataset error: {0}")]
    Dataset(#[from] dataset::DatasetError),
}

/// Result type for threatkb operations.
pub type Result<T> = std::result::Result<T, ThreatKbError>;

/// Initialize threatkb with default configuration.
///
/// Loads configuration from default file locations and the environment,
/// then behaves like [`init`].
pub fn init_with_defaults() -> Result<dataset::DatasetLoader> {
    let config = config::ConfigLoader::new()
        .load_default_files()
        .load_env()
        .extract()?;
    init(config)
}

/// Initialize threatkb with the provided configuration.
///
/// Sets up logging (ignoring an already-installed subscriber) and returns a
/// [`dataset::DatasetLoader`] backed by the HTTP fetcher.
pub fn init(config: config::ThreatKbConfig) -> Result<dataset::DatasetLoader> {
    let _ = logging::init(&config.logging);
    Ok(dataset::DatasetLoader::with_http(&config))
}
