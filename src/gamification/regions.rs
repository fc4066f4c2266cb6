use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, instrument};

use crate::storage::StoreError;

/// Maps a country identifier to the region it belongs to
pub trait RegionLookup: Send + Sync {
    fn region_of(&self, country_id: &str) -> Option<String>;
}

/// Region lookup backed by a fixed country -> region map
#[derive(Debug, Clone, Default)]
pub struct StaticRegionLookup {
    regions: HashMap<String, String>,
}

impl StaticRegionLookup {
    pub fn new(regions: HashMap<String, String>) -> Self {
        Self { regions }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            regions: pairs
                .into_iter()
                .map(|(country, region)| (country.into(), region.into()))
                .collect(),
        }
    }

    /// Loads a JSON object of `{ "<countryId>": "<region>" }`
    #[instrument]
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::Cache(e.to_string()))?;
        let regions: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;

        debug!(countries = regions.len(), "Loaded region map");
        Ok(Self { regions })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl RegionLookup for StaticRegionLookup {
    fn region_of(&self, country_id: &str) -> Option<String> {
        self.regions.get(country_id).cloned()
    }
}
