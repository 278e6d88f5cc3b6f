//! In-memory dataset cache keyed by source name.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::ParsedDataset;
use crate::stix::RawObject;

/// Key suffix for the secondary entry holding a source's raw
/// relationship-typed records.
pub const RELATIONSHIPS_SUFFIX: &str = "_relationships";

/// Process-lifetime cache of parsed datasets, mutated only at the end of a
/// successful load. Entries live until explicitly cleared.
#[derive(Debug, Default)]
pub struct DatasetCache {
    datasets: RwLock<HashMap<String, Arc<ParsedDataset>>>,
    raw_relationships: RwLock<HashMap<String, Arc<Vec<RawObject>>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_name: &str) -> Option<Arc<ParsedDataset>> {
        self.datasets.read().get(source_name).cloned()
    }

    /// The raw relationship records retained for advanced downstream
    /// analysis, stored under `<source_name>_relationships`.
    pub fn raw_relationships(&self, source_name: &str) -> Option<Arc<Vec<RawObject>>> {
        self.raw_relationships
            .read()
            .get(&relationships_key(source_name))
            .cloned()
    }

    /// Store a completed load: the dataset under `source_name`, the raw
    /// relationship records under the suffixed key.
    pub fn put(
        &self,
        source_name: &str,
        dataset: Arc<ParsedDataset>,
        raw_relationships: Vec<RawObject>,
    ) {
        self.datasets
            .write()
            .insert(source_name.to_string(), dataset);
        self.raw_relationships
            .write()
            .insert(relationships_key(source_name), Arc::new(raw_relationships));
    }

    /// Remove one source's entries, or everything.
    pub fn clear(&self, source_name: Option<&str>) {
        match source_name {
            Some(name) => {
                self.datasets.write().remove(name);
                self.raw_relationships.write().remove(&relationships_key(name));
            }
            None => {
                self.datasets.write().clear();
                self.raw_relationships.write().clear();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.datasets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.read().is_empty()
    }
}

fn relationships_key(source_name: &str) -> String {
    format!("{source_name}{RELATIONSHIPS_SUFFIX}")
}
