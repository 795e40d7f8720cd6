use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use voc_report::cache::DatasetCache;
use voc_report::config::AppConfig;
use voc_report::file_writer::{default_export_path, default_report_path, write_report};
use voc_report::logging::{init_logging, OperationTimer};
use voc_report::models::{FilterState, OutputFormat, Period, ProvenanceSummary, SortOrder};
use voc_report::report::render_text;
use voc_report::repository::CsvDatasetRepository;
use voc_report::service::ReportService;
use voc_report::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about = "Aggregate classified VOC feedback into reports", long_about = None)]
struct Cli {
    /// Classified VOC CSV file (overrides config)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Extra configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Year records are filtered to (overrides config)
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print file info and normalization provenance
    Summary,
    /// Build a full report for a period
    Report {
        /// current-month or year-to-date
        #[arg(short, long, default_value = "year-to-date")]
        period: Period,

        /// Sentiment filter for the detail table (ALL for none)
        #[arg(long)]
        sentiment: Option<String>,

        /// Major category filter for the detail table (ALL for none)
        #[arg(long)]
        major: Option<String>,

        /// "major > minor" filter for the detail table (ALL for none)
        #[arg(long)]
        combo: Option<String>,

        /// Detail table sort order by record count
        #[arg(long, default_value = "desc")]
        sort: SortOrder,

        /// Output format (txt or json)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export the period's records as CSV
    Export {
        #[arg(short, long, default_value = "year-to-date")]
        period: Period,

        /// Output file; defaults to a timestamped name in the output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rewrite the report whenever the input file changes
    Watch {
        #[arg(short, long, default_value = "year-to-date")]
        period: Period,

        /// Poll interval in seconds (overrides config)
        #[arg(long)]
        interval_secs: Option<u64>,

        #[arg(short, long)]
        format: Option<OutputFormat>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(input) = &cli.input {
        config.data.input_path = input.to_string_lossy().into_owned();
    }
    if let Some(year) = cli.year {
        InputValidator::validate_target_year(year)?;
        config.data.target_year = year;
    }

    let log_level = config.log_level();
    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _guard = init_logging(Some(log_level.as_str()), log_file.as_deref(), &config.logging.format)?;

    info!("Starting voc-report");

    let input_path = config.input_path();
    InputValidator::validate_input_file(&input_path)?;

    let repository = CsvDatasetRepository::new(
        &input_path,
        config.data.target_year,
        config.load_timeout(),
        Arc::new(DatasetCache::new()),
    );
    let service = Arc::new(ReportService::new(Arc::new(repository)));

    let result = match cli.command {
        Commands::Summary => print_summary(&service).await,
        Commands::Report {
            period,
            sentiment,
            major,
            combo,
            sort,
            format,
            out,
        } => {
            let filter = FilterState::from_selections(
                sentiment.as_deref().map(InputValidator::sanitize_text).as_deref(),
                major.as_deref().map(InputValidator::sanitize_text).as_deref(),
                combo.as_deref().map(InputValidator::sanitize_text).as_deref(),
                sort,
            )?;
            let format = resolve_format(format, &config)?;
            build_report(&service, period, &filter, format, out.as_deref()).await
        }
        Commands::Export { period, out } => {
            let out = out.unwrap_or_else(|| default_export_path(&config.output_directory(), period, Local::now()));
            InputValidator::validate_output_path(&out)?;
            let rows = service.export(period, &out).await?;
            println!("Exported {rows} rows to {}", out.display());
            Ok(())
        }
        Commands::Watch {
            period,
            interval_secs,
            format,
            out,
        } => {
            let interval = interval_secs.map_or_else(|| config.auto_refresh_interval(), Duration::from_secs);
            InputValidator::validate_refresh_interval(interval)?;
            let format = resolve_format(format, &config)?;
            let out = out.unwrap_or_else(|| default_report_path(&config.output_directory(), period, format));
            InputValidator::validate_output_path(&out)?;
            watch(&service, period, format, &out, interval).await
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

fn resolve_format(format: Option<OutputFormat>, config: &AppConfig) -> Result<OutputFormat> {
    match format {
        Some(format) => Ok(format),
        None => config
            .report
            .default_format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e)),
    }
}

fn format_summary(p: &ProvenanceSummary) -> String {
    let modified = p
        .file
        .modified
        .map_or_else(|| "unknown".to_string(), |m| m.format("%Y-%m-%d %H:%M:%S").to_string());
    format!(
        "File: {}\nSize: {:.1} KB\nModified: {}\nDate column: {}\nRows: {} total, {} dropped\n{} rows: {} ({} ~ {})\nMonths: {} ~ {}\nSentiment values: {}\nMajor categories: {}",
        p.file.path.display(),
        p.file.size_kb,
        modified,
        p.date_column,
        p.total_rows,
        p.dropped_rows,
        p.target_year,
        p.target_rows,
        p.first_date,
        p.last_date,
        p.first_month,
        p.last_month,
        p.sentiment_kinds,
        p.major_categories,
    )
}

async fn print_summary(service: &ReportService) -> Result<()> {
    let summary = service.summary().await?;
    println!("{}", format_summary(&summary));
    Ok(())
}

async fn build_report(
    service: &ReportService,
    period: Period,
    filter: &FilterState,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let timer = OperationTimer::new("report_command");
    let report = service.build_report(period, filter).await?;

    match out {
        Some(path) => {
            InputValidator::validate_output_path(path)?;
            write_report(&report, format, path, Local::now())
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => match format {
            OutputFormat::Txt => print!("{}", render_text(&report, Local::now())),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        },
    }

    timer.finish();
    Ok(())
}

async fn watch(
    service: &Arc<ReportService>,
    period: Period,
    format: OutputFormat,
    out: &Path,
    interval: Duration,
) -> Result<()> {
    info!(
        path = %out.display(),
        interval_secs = interval.as_secs(),
        "Watching input file, press Ctrl-C to stop"
    );
    let (handle, mut events) = service.spawn_auto_refresh(interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    Ok(dataset) => {
                        let report = voc_report::report::build_report(&dataset, period, &FilterState::default());
                        match write_report(&report, format, out, Local::now()) {
                            Ok(()) => println!("{} Report refreshed: {}", Local::now().format("%H:%M:%S"), out.display()),
                            Err(e) => error!(error = %e, path = %out.display(), "Failed to write refreshed report"),
                        }
                    }
                    Err(e) => warn!(error = %e, "Refresh failed, keeping previous report"),
                }
            }
        }
    }

    handle.abort();
    Ok(())
}
