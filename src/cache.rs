use crate::error::{Result, VocReportError};
use crate::metrics::MetricsCollector;
use crate::models::NormalizedDataset;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::debug;

/// Identity of a source file: its path and last modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl CacheKey {
    /// Read the current identity of `path` from the filesystem.
    pub fn for_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VocReportError::FileNotFound(path.to_path_buf()));
        }
        let modified = std::fs::metadata(path)?.modified().ok();
        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }
}

struct CacheEntry {
    modified: Option<SystemTime>,
    target_year: i32,
    dataset: Arc<NormalizedDataset>,
}

/// Normalized datasets keyed by file identity.
///
/// An entry is only served while the file's modification time and the
/// requested target year match what was loaded. `invalidate` and `clear`
/// drop entries explicitly.
#[derive(Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl DatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached dataset for `key`, if the entry is still current.
    pub fn get(&self, key: &CacheKey, target_year: i32) -> Result<Option<Arc<NormalizedDataset>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| VocReportError::Cache(e.to_string()))?;

        let hit = entries
            .get(&key.path)
            .filter(|entry| entry.modified == key.modified && entry.target_year == target_year)
            .map(|entry| Arc::clone(&entry.dataset));

        MetricsCollector::new().record_cache_lookup(hit.is_some());
        debug!(path = %key.path.display(), hit = hit.is_some(), "Dataset cache lookup");
        Ok(hit)
    }

    /// Store a dataset under `key`, replacing any older entry for the same path.
    pub fn insert(
        &self,
        key: &CacheKey,
        target_year: i32,
        dataset: NormalizedDataset,
    ) -> Result<Arc<NormalizedDataset>> {
        let dataset = Arc::new(dataset);
        self.entries
            .write()
            .map_err(|e| VocReportError::Cache(e.to_string()))?
            .insert(
                key.path.clone(),
                CacheEntry {
                    modified: key.modified,
                    target_year,
                    dataset: Arc::clone(&dataset),
                },
            );
        Ok(dataset)
    }

    /// Return the cached dataset for `path`, or load it with `load` and cache it.
    pub fn get_or_load<F>(&self, path: &Path, target_year: i32, load: F) -> Result<Arc<NormalizedDataset>>
    where
        F: FnOnce(&Path, i32) -> Result<NormalizedDataset>,
    {
        let key = CacheKey::for_path(path)?;
        if let Some(dataset) = self.get(&key, target_year)? {
            return Ok(dataset);
        }
        let dataset = load(path, target_year)?;
        self.insert(&key, target_year, dataset)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> Result<bool> {
        let removed = self
            .entries
            .write()
            .map_err(|e| VocReportError::Cache(e.to_string()))?
            .remove(path)
            .is_some();
        debug!(path = %path.display(), removed, "Dataset cache invalidated");
        Ok(removed)
    }

    /// Drop every entry.
    pub fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .map_err(|e| VocReportError::Cache(e.to_string()))?
            .clear();
        Ok(())
    }

    /// Number of cached datasets.
    pub fn len(&self) -> Result<usize> {
        Ok(self
            .entries
            .read()
            .map_err(|e| VocReportError::Cache(e.to_string()))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
