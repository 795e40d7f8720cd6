use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{CacheKey, DatasetCache};
use crate::error::{Result, VocReportError};
use crate::models::NormalizedDataset;
use crate::normalizer::load_dataset;

/// Source of the normalized dataset a report is built from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Current normalized dataset, loading it if needed.
    async fn load(&self) -> Result<Arc<NormalizedDataset>>;
    /// Drop any cached copy so the next `load` reads the source again.
    fn invalidate(&self) -> Result<bool>;
    /// Identity of the source, used to notice changes.
    fn source_identity(&self) -> Result<CacheKey>;
}

/// CSV-file repository backed by a [`DatasetCache`].
///
/// Parsing runs on the blocking pool and is bounded by `timeout`.
pub struct CsvDatasetRepository {
    path: PathBuf,
    target_year: i32,
    timeout: Duration,
    cache: Arc<DatasetCache>,
}

impl CsvDatasetRepository {
    pub fn new(path: impl Into<PathBuf>, target_year: i32, timeout: Duration, cache: Arc<DatasetCache>) -> Self {
        Self {
            path: path.into(),
            target_year,
            timeout,
            cache,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetRepository for CsvDatasetRepository {
    async fn load(&self) -> Result<Arc<NormalizedDataset>> {
        let path = self.path.clone();
        let year = self.target_year;
        let cache = Arc::clone(&self.cache);

        let task = tokio::task::spawn_blocking(move || cache.get_or_load(&path, year, load_dataset));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(VocReportError::Other(format!(
                "dataset load task failed: {join_error}"
            ))),
            Err(_) => {
                warn!(path = %self.path.display(), timeout_secs = self.timeout.as_secs(), "Dataset load timed out");
                Err(VocReportError::LoadTimeout {
                    path: self.path.clone(),
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    fn invalidate(&self) -> Result<bool> {
        let removed = self.cache.invalidate(&self.path)?;
        info!(path = %self.path.display(), removed, "Dataset cache cleared");
        Ok(removed)
    }

    fn source_identity(&self) -> Result<CacheKey> {
        CacheKey::for_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_through_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voc.csv");
        std::fs::write(&path, "date,감정\n2025-04-01,부정\n").unwrap();

        let cache = Arc::new(DatasetCache::new());
        let repo = CsvDatasetRepository::new(&path, 2025, Duration::from_secs(5), Arc::clone(&cache));

        let first = repo.load().await.unwrap();
        let second = repo.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(repo.path(), path.as_path());

        assert!(repo.invalidate().unwrap());
        let third = repo.load().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn missing_file_surfaces_load_error() {
        let repo = CsvDatasetRepository::new(
            "/nonexistent/voc.csv",
            2025,
            Duration::from_secs(5),
            Arc::new(DatasetCache::new()),
        );
        let err = repo.load().await.unwrap_err();
        assert!(err.is_load_failure());
        assert_eq!(err.stage(), "read");
    }
}
