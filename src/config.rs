use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub input_path: String,
    pub target_year: i32,
    pub load_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_directory: String,
    pub default_format: String,
    pub auto_refresh_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                input_path: "voc_raw_classified_fixed.csv".to_string(),
                target_year: 2025,
                load_timeout_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            report: ReportConfig {
                output_directory: "./output".to_string(),
                default_format: "txt".to_string(),
                auto_refresh_secs: 300,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    ///
    /// Later sources win: built-in defaults, `config/default`, `config/local`,
    /// `voc-report`, an explicit file, then `VOC_REPORT_<SECTION>__<KEY>`
    /// environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in Self::default().flatten() {
            builder = builder.set_default(key, value)?;
        }

        builder = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("voc-report").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("VOC_REPORT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.data.input_path.trim().is_empty() {
            return Err(anyhow::anyhow!("input_path must not be empty"));
        }
        if !(1900..=2100).contains(&self.data.target_year) {
            return Err(anyhow::anyhow!(
                "target_year must be between 1900 and 2100, got {}",
                self.data.target_year
            ));
        }
        if self.data.load_timeout_secs == 0 {
            return Err(anyhow::anyhow!("load_timeout_secs must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        let valid_formats = ["txt", "json"];
        if !valid_formats.contains(&self.report.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid report format: {}. Must be one of: {:?}",
                self.report.default_format,
                valid_formats
            ));
        }

        if self.report.auto_refresh_secs == 0 {
            return Err(anyhow::anyhow!("auto_refresh_secs must be greater than 0"));
        }

        Ok(())
    }

    #[must_use]
    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.data.input_path)
    }

    #[must_use]
    pub fn output_directory(&self) -> PathBuf {
        PathBuf::from(&self.report.output_directory)
    }

    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.data.load_timeout_secs)
    }

    #[must_use]
    pub const fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.report.auto_refresh_secs)
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Flatten into dotted keys for use as configuration defaults.
    fn flatten(self) -> Vec<(&'static str, config::Value)> {
        let mut pairs = vec![
            ("data.input_path", config::Value::from(self.data.input_path)),
            ("data.target_year", config::Value::from(i64::from(self.data.target_year))),
            ("data.load_timeout_secs", config::Value::from(self.data.load_timeout_secs)),
            ("logging.level", config::Value::from(self.logging.level)),
            ("logging.format", config::Value::from(self.logging.format)),
            ("report.output_directory", config::Value::from(self.report.output_directory)),
            ("report.default_format", config::Value::from(self.report.default_format)),
            ("report.auto_refresh_secs", config::Value::from(self.report.auto_refresh_secs)),
        ];
        if let Some(file_path) = self.logging.file_path {
            pairs.push(("logging.file_path", config::Value::from(file_path)));
        }
        pairs
    }
}
