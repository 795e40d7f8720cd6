use crate::error::Result;
use crate::file_writer::write_export_file;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{FilterState, NormalizedDataset, Period, ProvenanceSummary};
use crate::period::resolve_period;
use crate::report::{self, VocReport};
use crate::repository::DatasetRepository;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Outcome of one auto-refresh reload.
pub type RefreshEvent = Result<Arc<NormalizedDataset>>;

pub struct ReportService {
    repository: Arc<dyn DatasetRepository>,
    metrics: MetricsCollector,
}

impl ReportService {
    pub fn new(repository: Arc<dyn DatasetRepository>) -> Self {
        Self {
            repository,
            metrics: MetricsCollector::new(),
        }
    }

    /// Current dataset, served from the repository's cache when possible.
    pub async fn dataset(&self) -> Result<Arc<NormalizedDataset>> {
        self.repository
            .load()
            .await
            .inspect_err(|e| self.metrics.record_error(e.stage()))
    }

    pub async fn summary(&self) -> Result<ProvenanceSummary> {
        Ok(self.dataset().await?.provenance.clone())
    }

    pub async fn build_report(&self, period: Period, filter: &FilterState) -> Result<VocReport> {
        let dataset = self.dataset().await?;
        let timer = OperationTimer::new("build_report");
        let report = report::build_report(&dataset, period, filter);
        self.metrics.record_report_built(period.as_str(), timer.finish());
        Ok(report)
    }

    /// Write the period's records to `output_path`. Returns the row count.
    pub async fn export(&self, period: Period, output_path: &Path) -> Result<usize> {
        let dataset = self.dataset().await?;
        let scope = resolve_period(&dataset, period);
        let rows = write_export_file(scope.records(), dataset.columns, output_path)
            .inspect_err(|e| self.metrics.record_error(e.stage()))?;
        self.metrics.record_export(rows);
        info!(period = period.as_str(), rows, path = %output_path.display(), "Exported period records");
        Ok(rows)
    }

    /// Drop the cached dataset and load it again.
    pub async fn refresh(&self) -> Result<Arc<NormalizedDataset>> {
        self.repository.invalidate()?;
        self.dataset().await
    }

    /// Poll the source every `every` and emit a reload whenever its identity
    /// changes. The first tick always loads.
    ///
    /// The task ends once the receiver is dropped.
    pub fn spawn_auto_refresh(
        self: &Arc<Self>,
        every: Duration,
    ) -> (JoinHandle<()>, mpsc::Receiver<RefreshEvent>) {
        let (tx, rx) = mpsc::channel(4);
        let service = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_seen = None;

            loop {
                ticker.tick().await;

                let identity = match service.repository.source_identity() {
                    Ok(identity) => identity,
                    Err(e) => {
                        warn!(error = %e, "Source check failed");
                        service.metrics.record_error(e.stage());
                        if tx.send(Err(e)).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                if last_seen.as_ref() == Some(&identity) {
                    debug!("Source unchanged");
                    continue;
                }

                let event = service.dataset().await;
                if event.is_ok() {
                    info!(path = %identity.path.display(), "Source changed, dataset reloaded");
                    last_seen = Some(identity);
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        (handle, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::error::VocReportError;
    use crate::models::FileInfo;
    use crate::normalizer::normalize_reader;
    use crate::repository::MockDatasetRepository;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn sample() -> NormalizedDataset {
        let csv = "voc_id,date,감정,대분류,중분류\n\
                   1,2025-03-02,부정,결제,환불\n\
                   2,2025-03-05,긍정,배송,지연\n";
        let info = FileInfo {
            path: PathBuf::from("mock.csv"),
            size_kb: 0.1,
            modified: None,
        };
        normalize_reader(csv.as_bytes(), info, 2025).unwrap()
    }

    fn fixed_identity() -> CacheKey {
        CacheKey {
            path: PathBuf::from("mock.csv"),
            modified: Some(SystemTime::UNIX_EPOCH),
        }
    }

    #[tokio::test]
    async fn builds_report_from_repository() {
        let mut repo = MockDatasetRepository::new();
        repo.expect_load().times(1).returning(|| Ok(Arc::new(sample())));

        let service = ReportService::new(Arc::new(repo));
        let report = service
            .build_report(Period::CurrentMonth, &FilterState::default())
            .await
            .unwrap();
        assert_eq!(report.period_label, "2025-03");
        assert_eq!(report.overview.record_count, 2);
    }

    #[tokio::test]
    async fn load_errors_propagate() {
        let mut repo = MockDatasetRepository::new();
        repo.expect_load()
            .returning(|| Err(VocReportError::FileNotFound(PathBuf::from("gone.csv"))));

        let service = ReportService::new(Arc::new(repo));
        let err = service.summary().await.unwrap_err();
        assert!(matches!(err, VocReportError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn refresh_invalidates_before_loading() {
        let mut repo = MockDatasetRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_invalidate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(true));
        repo.expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Arc::new(sample())));

        let service = ReportService::new(Arc::new(repo));
        let dataset = service.refresh().await.unwrap();
        assert_eq!(dataset.records.len(), 2);
    }

    #[tokio::test]
    async fn auto_refresh_skips_unchanged_source() {
        let mut repo = MockDatasetRepository::new();
        repo.expect_source_identity().returning(|| Ok(fixed_identity()));
        repo.expect_load().times(1).returning(|| Ok(Arc::new(sample())));

        let service = Arc::new(ReportService::new(Arc::new(repo)));
        let (handle, mut rx) = service.spawn_auto_refresh(Duration::from_millis(5));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.records.len(), 2);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rx.try_recv().is_err());

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn auto_refresh_reloads_when_source_changes() {
        let mut repo = MockDatasetRepository::new();
        let mut checks = 0;
        repo.expect_source_identity().returning(move || {
            checks += 1;
            let modified = if checks == 1 {
                SystemTime::UNIX_EPOCH
            } else {
                SystemTime::UNIX_EPOCH + Duration::from_secs(60)
            };
            Ok(CacheKey {
                path: PathBuf::from("mock.csv"),
                modified: Some(modified),
            })
        });
        repo.expect_load().times(2).returning(|| Ok(Arc::new(sample())));

        let service = Arc::new(ReportService::new(Arc::new(repo)));
        let (handle, mut rx) = service.spawn_auto_refresh(Duration::from_millis(5));

        assert!(rx.recv().await.unwrap().is_ok());
        assert!(rx.recv().await.unwrap().is_ok());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rx.try_recv().is_err());

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn auto_refresh_retries_after_failed_load() {
        let mut repo = MockDatasetRepository::new();
        repo.expect_source_identity().returning(|| Ok(fixed_identity()));
        let mut seq = mockall::Sequence::new();
        repo.expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(VocReportError::FileNotFound(PathBuf::from("mock.csv"))));
        repo.expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Arc::new(sample())));

        let service = Arc::new(ReportService::new(Arc::new(repo)));
        let (handle, mut rx) = service.spawn_auto_refresh(Duration::from_millis(5));

        let failed = rx.recv().await.unwrap();
        assert!(matches!(failed, Err(VocReportError::FileNotFound(_))));
        let recovered = rx.recv().await.unwrap().unwrap();
        assert_eq!(recovered.records.len(), 2);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rx.try_recv().is_err());

        handle.abort();
        let _ = handle.await;
    }
}
