//! VOC Report - customer feedback aggregation
//!
//! A Rust library that normalizes classified VOC (voice of customer) CSV
//! exports and derives the views a reporting dashboard needs.
//!
//! # Features
//!
//! - Date column detection and sentiment/category normalization
//! - Period-aware trend, overview, distribution and detail views
//! - Threshold-driven summary comments
//! - Text/JSON reports and BOM-prefixed CSV export
//! - File-identity cache with non-blocking auto-refresh

/// In-memory dataset cache
pub mod cache;
/// Configuration management
pub mod config;
/// Detail table filtering and grouping
pub mod detail;
/// Sentiment and category distributions
pub mod distribution;
/// Error types
pub mod error;
/// Report and CSV file output
pub mod file_writer;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Summary comments
pub mod narrative;
/// CSV loading and normalization
pub mod normalizer;
/// Headline metrics
pub mod overview;
/// Period resolution
pub mod period;
/// Report assembly and rendering
pub mod report;
/// Repository pattern for data access
pub mod repository;
/// Column names and value mappings
pub mod schema;
/// Report orchestration and auto-refresh
pub mod service;
/// Monthly trend series
pub mod trend;
/// Counting and formatting helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{Result, VocReportError};
pub use models::{FilterState, NormalizedDataset, OutputFormat, Period, Record, Sentiment};
pub use report::{build_report, VocReport};
pub use service::ReportService;
