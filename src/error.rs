//! Error types for the voc-report library.
//!
//! Load failures carry the stage that failed so the caller can tell the user
//! whether the file, the date column, the date values or the year slice was
//! the problem. An empty filter result is not an error; see
//! [`crate::models::DetailTable::NoMatches`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a dataset or producing a report.
#[derive(Error, Debug)]
pub enum VocReportError {
    /// The input file does not exist
    #[error("read: input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input file exists but could not be read or parsed as CSV
    #[error("read: cannot read {}: {reason}", path.display())]
    FileUnreadable {
        /// Path of the file
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// None of the candidate date columns is present
    #[error("date-column: no date column found (looked for: {candidates})")]
    MissingDateColumn {
        /// Comma separated list of the names that were tried
        candidates: String,
    },

    /// The date column exists but no row holds a parsable date
    #[error("date-parse: no parsable dates in column '{column}' ({dropped} rows dropped)")]
    NoParsableDates {
        /// Column used as the date source
        column: String,
        /// Rows dropped because their date failed to parse
        dropped: usize,
    },

    /// No rows remain after restricting to the target year
    #[error("year-filter: no rows for {year} ({parsed} rows with valid dates)")]
    EmptyAfterFilter {
        /// Target year
        year: i32,
        /// Rows that had a valid date before the restriction
        parsed: usize,
    },

    /// Loading took longer than the configured timeout
    #[error("read: loading {} timed out after {secs}s", path.display())]
    LoadTimeout {
        /// Path of the file
        path: PathBuf,
        /// Timeout in seconds
        secs: u64,
    },

    /// A filter value could not be interpreted
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl VocReportError {
    /// Short name of the pipeline stage that failed.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) | Self::FileUnreadable { .. } | Self::LoadTimeout { .. } => "read",
            Self::MissingDateColumn { .. } => "date-column",
            Self::NoParsableDates { .. } => "date-parse",
            Self::EmptyAfterFilter { .. } => "year-filter",
            Self::InvalidFilter(_) => "filter",
            Self::InvalidConfig(_) => "config",
            Self::Cache(_) => "cache",
            Self::Io(_) | Self::Csv(_) | Self::Serialization(_) => "output",
            Self::Other(_) => "other",
        }
    }

    /// True for failures that prevent a dataset from being loaded at all.
    #[must_use]
    pub const fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::FileUnreadable { .. }
                | Self::LoadTimeout { .. }
                | Self::MissingDateColumn { .. }
                | Self::NoParsableDates { .. }
                | Self::EmptyAfterFilter { .. }
        )
    }
}

/// Convenience type alias for Result with `VocReportError`
pub type Result<T> = std::result::Result<T, VocReportError>;

impl From<anyhow::Error> for VocReportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
