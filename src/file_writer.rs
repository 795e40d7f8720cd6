//! File writing utilities for reports and data exports.
//!
//! Reports are written as text or JSON. The period-scoped data export is a
//! CSV with a UTF-8 byte-order mark so spreadsheet tools pick the right
//! encoding for Hangul content.

use crate::error::Result;
use crate::models::{ColumnSet, OutputFormat, Period, Record};
use crate::report::{render_text, VocReport};
use crate::schema;
use chrono::{DateTime, Local};
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// UTF-8 byte-order mark written at the start of CSV exports.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write a report to `file_path` in the given format.
pub fn write_report(
    report: &VocReport,
    format: OutputFormat,
    file_path: &Path,
    generated_at: DateTime<Local>,
) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(file_path)?);
    match format {
        OutputFormat::Txt => writer.write_all(render_text(report, generated_at).as_bytes())?,
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, report)?,
    }
    writer.flush()?;
    Ok(())
}

/// Header of the export, limited to columns the source provided.
#[must_use]
pub fn export_header(columns: ColumnSet) -> Vec<&'static str> {
    let mut header = Vec::new();
    if columns.id {
        header.push(schema::ID_COLUMN);
    }
    header.push(schema::MONTH_COLUMN);
    if columns.major {
        header.push(schema::MAJOR_COLUMN);
    }
    if columns.minor {
        header.push(schema::MINOR_COLUMN);
    }
    if columns.sentiment {
        header.push(schema::SENTIMENT_COLUMN);
    }
    if columns.answer {
        header.push(schema::ANSWER_COLUMN);
    }
    header
}

/// Write period-scoped records as BOM-prefixed CSV. Returns the row count.
pub fn export_records<W: Write>(records: &[&Record], columns: ColumnSet, mut out: W) -> Result<usize> {
    out.write_all(UTF8_BOM)?;
    let mut writer = Writer::from_writer(out);
    writer.write_record(export_header(columns))?;

    for record in records {
        let mut row: Vec<String> = Vec::with_capacity(6);
        if columns.id {
            row.push(record.id.clone().unwrap_or_default());
        }
        row.push(record.month.to_string());
        if columns.major {
            row.push(record.major.clone().unwrap_or_default());
        }
        if columns.minor {
            row.push(record.minor.clone().unwrap_or_default());
        }
        if columns.sentiment {
            row.push(record.sentiment.as_ref().map(ToString::to_string).unwrap_or_default());
        }
        if columns.answer {
            row.push(record.answer().unwrap_or_default().to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(records.len())
}

/// Write period-scoped records to a CSV file, creating parent directories.
pub fn write_export_file(records: &[&Record], columns: ColumnSet, file_path: &Path) -> Result<usize> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(file_path)?);
    export_records(records, columns, file)
}

/// Default export file name: `voc_analysis_<period>_<YYYYMMDD_HHMMSS>.csv`.
#[must_use]
pub fn default_export_path(output_dir: &Path, period: Period, now: DateTime<Local>) -> PathBuf {
    output_dir.join(format!(
        "voc_analysis_{}_{}.csv",
        period.as_str(),
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Default report file name: `voc_report_<period>.<ext>`.
#[must_use]
pub fn default_report_path(output_dir: &Path, period: Period, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("voc_report_{}.{}", period.as_str(), format.extension()))
}
