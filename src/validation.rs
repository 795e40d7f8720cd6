use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Duration;

/// Validation utilities for command-line input
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a path given on the command line or in config
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        if path_str.contains('\0') {
            return Err(anyhow!("File path contains invalid characters"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate the classified VOC input file
    pub fn validate_input_file(path: &Path) -> Result<()> {
        Self::validate_file_path(path)?;

        if !path.exists() {
            return Err(anyhow!("Input file does not exist: {path:?}"));
        }

        if !path.is_file() {
            return Err(anyhow!("Input path is not a file: {path:?}"));
        }

        let metadata =
            std::fs::metadata(path).map_err(|e| anyhow!("Cannot access input file: {e}"))?;
        if metadata.len() == 0 {
            return Err(anyhow!("Input file is empty: {path:?}"));
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {}
            _ => tracing::warn!(path = %path.display(), "Input file has no .csv extension"),
        }

        Ok(())
    }

    /// Validate an output file location
    pub fn validate_output_path(path: &Path) -> Result<()> {
        Self::validate_file_path(path)?;

        if path.is_dir() {
            return Err(anyhow!("Output path is a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the year records are filtered to
    pub fn validate_target_year(year: i32) -> Result<()> {
        if !(1900..=2100).contains(&year) {
            return Err(anyhow!("Target year must be between 1900 and 2100, got {year}"));
        }
        Ok(())
    }

    /// Validate the auto-refresh interval
    pub fn validate_refresh_interval(interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(anyhow!("Refresh interval must be greater than 0"));
        }

        if interval < Duration::from_secs(5) {
            tracing::warn!(
                secs = interval.as_secs_f64(),
                "Very short refresh interval will poll the file frequently"
            );
        }

        if interval > Duration::from_secs(24 * 60 * 60) {
            return Err(anyhow!("Refresh interval too large (max 24 hours)"));
        }

        Ok(())
    }

    /// Sanitize a free-text filter selection
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .trim()
            .to_string()
    }
}
