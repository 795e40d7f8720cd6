use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names emitted by the report pipeline.
///
/// Nothing is recorded unless the embedding application installs a
/// `metrics` recorder; without one every call is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Loading
    pub datasets_loaded_total: &'static str,
    pub dataset_load_duration: &'static str,
    pub rows_dropped_total: &'static str,
    pub dataset_rows: &'static str,

    // Cache
    pub cache_lookups_total: &'static str,

    // Reports and exports
    pub reports_built_total: &'static str,
    pub report_build_duration: &'static str,
    pub export_rows_total: &'static str,

    // Errors
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            datasets_loaded_total: "voc_report_datasets_loaded_total",
            dataset_load_duration: "voc_report_dataset_load_duration_seconds",
            rows_dropped_total: "voc_report_rows_dropped_total",
            dataset_rows: "voc_report_dataset_rows",

            cache_lookups_total: "voc_report_cache_lookups_total",

            reports_built_total: "voc_report_reports_built_total",
            report_build_duration: "voc_report_report_build_duration_seconds",
            export_rows_total: "voc_report_export_rows_total",

            errors_total: "voc_report_errors_total",
        }
    }

    /// Record a completed dataset load.
    pub fn record_dataset_load(&self, rows: usize, dropped: usize, duration: Duration) {
        counter!(self.datasets_loaded_total).increment(1);
        counter!(self.rows_dropped_total).increment(dropped as u64);
        gauge!(self.dataset_rows).set(rows as f64);
        histogram!(self.dataset_load_duration).record(duration.as_secs_f64());
    }

    /// Record a cache lookup.
    pub fn record_cache_lookup(&self, hit: bool) {
        counter!(self.cache_lookups_total, "result" => if hit { "hit" } else { "miss" }).increment(1);
    }

    /// Record a built report.
    pub fn record_report_built(&self, period: &'static str, duration: Duration) {
        counter!(self.reports_built_total, "period" => period).increment(1);
        histogram!(self.report_build_duration).record(duration.as_secs_f64());
    }

    /// Record exported rows.
    pub fn record_export(&self, rows: usize) {
        counter!(self.export_rows_total).increment(rows as u64);
    }

    /// Record an error by pipeline stage.
    pub fn record_error(&self, stage: &'static str) {
        counter!(self.errors_total, "stage" => stage).increment(1);
    }
}
