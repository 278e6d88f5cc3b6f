//! Configuration validation utilities.

use super::ConfigError;
use super::models::*;
use crate::models::EntityKind;

/// Validate the entire configuration.
pub fn validate_config(config: &ThreatKbConfig) -> Result<(), ConfigError> {
    for (name, source) in &config.sources {
        validate_source(name, source)?;
    }
    validate_fetch(&config.fetch)?;
    Ok(())
}

/// Validate one source entry.
///
/// An unsupported `format` value is deliberately not rejected here: the
/// loader reports it as a fatal load error for that source, which keeps a
/// single misconfigured source from invalidating the whole config.
fn validate_source(name: &str, source: &SourceConfig) -> Result<(), ConfigError> {
    if source.url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "source {name:?}: url cannot be empty"
        )));
    }
    if source.format.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "source {name:?}: format cannot be empty"
        )));
    }
    if source.entity_types.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "source {name:?}: entity_types cannot be empty"
        )));
    }
    for entity_type in &source.entity_types {
        if EntityKind::from_name(entity_type).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "source {name:?}: unknown entity type {entity_type:?}"
            )));
        }
    }
    Ok(())
}

fn validate_fetch(fetch: &FetchConfig) -> Result<(), ConfigError> {
    if fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.timeout_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
