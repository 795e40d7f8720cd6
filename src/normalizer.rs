//! Dataset normalizer.
//!
//! Reads a classified VOC export, resolves the date, sentiment and category
//! columns through the tables in [`crate::schema`], canonicalizes values and
//! restricts the rows to one target year. Rows whose date does not parse are
//! dropped and counted; the load only fails when nothing usable remains.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, VocReportError};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{
    ColumnSet, FileInfo, MonthKey, NormalizedDataset, ProvenanceSummary, Record, Sentiment,
};
use crate::schema;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y"];

/// Parse a date cell. Returns `None` for empty or unrecognized values.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Load and normalize a CSV file, keeping only rows of `target_year`.
pub fn load_dataset(path: &Path, target_year: i32) -> Result<NormalizedDataset> {
    let timer = OperationTimer::new("load_dataset");
    if !path.exists() {
        return Err(VocReportError::FileNotFound(path.to_path_buf()));
    }

    let unreadable = |e: std::io::Error| VocReportError::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let metadata = std::fs::metadata(path).map_err(unreadable)?;
    let file = File::open(path).map_err(unreadable)?;

    let info = FileInfo {
        path: path.to_path_buf(),
        size_kb: metadata.len() as f64 / 1024.0,
        modified: metadata.modified().ok().map(DateTime::<Local>::from),
    };

    let dataset = normalize_reader(BufReader::new(file), info, target_year)?;
    MetricsCollector::new().record_dataset_load(
        dataset.records.len(),
        dataset.provenance.dropped_rows,
        timer.finish(),
    );
    Ok(dataset)
}

/// Column positions resolved from the header row.
struct ColumnPlan {
    date: usize,
    id: Option<usize>,
    sentiment: Option<usize>,
    major: Option<usize>,
    minor: Option<usize>,
    passthrough: Vec<usize>,
}

impl ColumnPlan {
    fn resolve(headers: &[String]) -> Result<(Self, String)> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let date_name = schema::first_present(headers, schema::DATE_COLUMN_CANDIDATES)
            .ok_or_else(|| VocReportError::MissingDateColumn {
                candidates: schema::DATE_COLUMN_CANDIDATES.join(", "),
            })?
            .to_string();

        let sentiment_name = schema::first_present(headers, schema::SENTIMENT_SOURCE_COLUMNS);
        let major_name = schema::resolve_category_source(headers, schema::MAJOR_COLUMN);
        let minor_name = schema::resolve_category_source(headers, schema::MINOR_COLUMN);

        let date = position(date_name.as_str()).unwrap_or_default();
        let id = position(schema::ID_COLUMN);
        let sentiment = sentiment_name.and_then(position);
        let major = major_name.and_then(position);
        let minor = minor_name.and_then(position);

        let consumed = [Some(date), id, sentiment, major, minor];
        let passthrough = (0..headers.len())
            .filter(|i| !consumed.contains(&Some(*i)))
            .collect();

        debug!(
            date = %date_name,
            sentiment = ?sentiment_name,
            major = ?major_name,
            minor = ?minor_name,
            "Resolved columns"
        );

        Ok((
            Self {
                date,
                id,
                sentiment,
                major,
                minor,
                passthrough,
            },
            date_name,
        ))
    }

    const fn columns(&self, headers_have_answer: bool) -> ColumnSet {
        ColumnSet {
            id: self.id.is_some(),
            sentiment: self.sentiment.is_some(),
            major: self.major.is_some(),
            minor: self.minor.is_some(),
            answer: headers_have_answer,
        }
    }
}

fn clean(value: &str) -> String {
    value.nfc().collect::<String>().trim().to_string()
}

fn cell(row: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| row.get(i))
        .map(clean)
        .filter(|v| !v.is_empty())
}

/// Normalize CSV data from any reader. `file` is carried into the provenance.
pub fn normalize_reader<R: Read>(
    reader: R,
    file: FileInfo,
    target_year: i32,
) -> Result<NormalizedDataset> {
    let unreadable = |e: csv::Error| VocReportError::FileUnreadable {
        path: file.path.clone(),
        reason: e.to_string(),
    };

    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(|h| clean(h.trim_start_matches('\u{feff}')))
        .collect();

    let (plan, date_column) = ColumnPlan::resolve(&headers)?;
    let columns = plan.columns(headers.iter().any(|h| h == schema::ANSWER_COLUMN));

    let mut parsed = Vec::new();
    let mut total_rows = 0usize;
    let mut dropped_rows = 0usize;

    for row in csv_reader.records() {
        let row = row.map_err(unreadable)?;
        total_rows += 1;

        let Some(timestamp) = row.get(plan.date).and_then(parse_timestamp) else {
            dropped_rows += 1;
            continue;
        };

        let fields: BTreeMap<String, String> = plan
            .passthrough
            .iter()
            .filter_map(|&i| Some((headers[i].clone(), clean(row.get(i)?))))
            .collect();

        parsed.push(Record {
            id: cell(&row, plan.id),
            timestamp,
            month: MonthKey::of(&timestamp),
            sentiment: cell(&row, plan.sentiment).map(|raw| Sentiment::from_raw(&raw)),
            major: cell(&row, plan.major),
            minor: cell(&row, plan.minor),
            fields,
        });
    }

    if dropped_rows > 0 {
        warn!(
            column = %date_column,
            dropped = dropped_rows,
            total = total_rows,
            "Dropped rows with unparsable dates"
        );
    }

    if parsed.is_empty() {
        return Err(VocReportError::NoParsableDates {
            column: date_column,
            dropped: dropped_rows,
        });
    }

    let parsed_rows = parsed.len();
    let records: Vec<Record> = parsed
        .into_iter()
        .filter(|r| r.month.year == target_year)
        .collect();

    let provenance = summarize(
        &records,
        file,
        date_column,
        total_rows,
        dropped_rows,
        target_year,
    )
    .ok_or(VocReportError::EmptyAfterFilter {
        year: target_year,
        parsed: parsed_rows,
    })?;

    info!(
        file = %provenance.file.path.display(),
        date_column = %provenance.date_column,
        total_rows = provenance.total_rows,
        dropped_rows = provenance.dropped_rows,
        target_year = provenance.target_year,
        target_rows = provenance.target_rows,
        first_date = %provenance.first_date,
        last_date = %provenance.last_date,
        first_month = %provenance.first_month,
        last_month = %provenance.last_month,
        sentiment_kinds = provenance.sentiment_kinds,
        major_categories = provenance.major_categories,
        "Dataset normalized"
    );

    Ok(NormalizedDataset {
        records,
        columns,
        provenance,
    })
}

/// Provenance for the year slice; `None` when the slice is empty.
fn summarize(
    records: &[Record],
    file: FileInfo,
    date_column: String,
    total_rows: usize,
    dropped_rows: usize,
    target_year: i32,
) -> Option<ProvenanceSummary> {
    let first = records.iter().map(|r| r.timestamp).min()?;
    let last = records.iter().map(|r| r.timestamp).max()?;

    Some(ProvenanceSummary {
        file,
        date_column,
        total_rows,
        dropped_rows,
        target_year,
        target_rows: records.len(),
        first_date: first.date(),
        last_date: last.date(),
        first_month: MonthKey::of(&first),
        last_month: MonthKey::of(&last),
        sentiment_kinds: records
            .iter()
            .filter_map(|r| r.sentiment.as_ref())
            .collect::<HashSet<_>>()
            .len(),
        major_categories: records
            .iter()
            .filter_map(|r| r.major.as_deref())
            .collect::<HashSet<_>>()
            .len(),
    })
}
