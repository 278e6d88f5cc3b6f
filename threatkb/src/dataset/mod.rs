//! Dataset loading and caching.
//!
//! A load is one batch transform: fetch the source's bundle, extract every
//! requested entity kind, resolve relationships, cache the result under the
//! source name. Fatal problems (unknown source, unsupported format, fetch
//! failure) abort the load and cache nothing; per-record problems are
//! absorbed into [`LoadStats`].

mod cache;
mod fetch;

pub use cache::{DatasetCache, RELATIONSHIPS_SUFFIX};
pub use fetch::{BundleFetcher, FetchError, HttpBundleFetcher};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{FetchConfig, SourceConfig, ThreatKbConfig};
use crate::entity_extraction::{
    EntityExtractor, ExtractionTables, Extraction, ExtractorOptions,
};
use crate::models::{Entity, EntityKind, LoadStats, ParsedDataset};
use crate::relationships::RelationshipResolver;
use crate::stix::RawObject;

/// The only bundle format the loader accepts.
pub const SUPPORTED_FORMAT: &str = "stix";

/// Fatal load failures. Per-record problems never surface here.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported bundle format {format:?} for source {source_name:?}")]
    UnsupportedFormat { source_name: String, format: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Orchestrates fetch → extract → resolve → cache for configured sources.
pub struct DatasetLoader {
    sources: HashMap<String, SourceConfig>,
    fetch: FetchConfig,
    extractor: EntityExtractor,
    resolver: RelationshipResolver,
    fetcher: Arc<dyn BundleFetcher>,
    cache: DatasetCache,
    load_locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl fmt::Debug for DatasetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetLoader")
            .field("sources", &self.sources.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl DatasetLoader {
    pub fn new(config: &ThreatKbConfig, fetcher: Arc<dyn BundleFetcher>) -> Self {
        let tables = ExtractionTables::attack();
        let options = ExtractorOptions {
            include_revoked: config.extraction.include_revoked,
        };
        Self {
            sources: config.sources.clone(),
            fetch: config.fetch.clone(),
            extractor: EntityExtractor::with_options(tables.clone(), options),
            resolver: RelationshipResolver::new(tables),
            fetcher,
            cache: DatasetCache::new(),
            load_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Loader with the production HTTP fetcher.
    pub fn with_http(config: &ThreatKbConfig) -> Self {
        Self::new(config, Arc::new(HttpBundleFetcher::new()))
    }

    /// Names of the configured sources.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Fetch, parse, and cache one source's bundle.
    ///
    /// Either the whole load succeeds (with possible internal error counts
    /// in the dataset's stats) or one fatal error is returned and the cache
    /// is untouched. Concurrent loads of the same source are serialized;
    /// loads of different sources are independent.
    pub async fn load(&self, source_name: &str) -> Result<Arc<ParsedDataset>, DatasetError> {
        let source = self
            .sources
            .get(source_name)
            .ok_or_else(|| {
                DatasetError::Configuration(format!("unknown source {source_name:?}"))
            })?
            .clone();
        if source.format != SUPPORTED_FORMAT {
            return Err(DatasetError::UnsupportedFormat {
                source_name: source_name.to_string(),
                format: source.format,
            });
        }

        let lock = self.lock_for(source_name);
        let _guard = lock.lock().await;

        debug!(source = source_name, url = %source.url, "fetching bundle");
        let bundle = self.fetcher.fetch(&source.url, self.fetch.timeout()).await?;

        let requested = source.entity_kinds();
        let mut stats = LoadStats::default();
        let mut entities: BTreeMap<EntityKind, Vec<Entity>> = BTreeMap::new();
        for kind in &requested {
            entities.entry(*kind).or_default();
        }

        for object in &bundle.objects {
            stats.objects_processed += 1;
            match self.extractor.extract(object, &requested) {
                Extraction::Entity(entity) => {
                    stats.entities_extracted += 1;
                    entities.entry(entity.kind()).or_default().push(entity);
                }
                Extraction::Dropped => stats.parse_errors += 1,
                Extraction::Skipped => {}
            }
        }

        let (relationships, resolution) = self.resolver.resolve(&bundle.objects, &mut entities);
        stats.relationships_processed = resolution.processed;
        stats.relationships_skipped = resolution.skipped;
        stats.parse_errors += resolution.parse_errors;

        let raw_relationships: Vec<RawObject> =
            bundle.relationship_objects().cloned().collect();

        let dataset = Arc::new(ParsedDataset {
            entities,
            relationships,
            stats,
        });
        self.cache
            .put(source_name, Arc::clone(&dataset), raw_relationships);

        info!(
            source = source_name,
            objects = stats.objects_processed,
            entities = stats.entities_extracted,
            parse_errors = stats.parse_errors,
            relationships = stats.relationships_processed,
            relationships_skipped = stats.relationships_skipped,
            "bundle load complete"
        );
        Ok(dataset)
    }

    /// A previously loaded dataset, if any.
    pub fn get_cached(&self, source_name: &str) -> Option<Arc<ParsedDataset>> {
        self.cache.get(source_name)
    }

    /// The raw relationship records cached alongside a source's dataset.
    pub fn raw_relationships(&self, source_name: &str) -> Option<Arc<Vec<RawObject>>> {
        self.cache.raw_relationships(source_name)
    }

    /// Drop one source's cache entries, or all of them.
    pub fn clear(&self, source_name: Option<&str>) {
        self.cache.clear(source_name);
    }

    fn lock_for(&self, source_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.load_locks.lock();
        locks
            .entry(source_name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
