//! Data models for classified VOC records and the views derived from them
//!
//! Everything crossing the presentation boundary here is plain data: strings,
//! numbers and sequences, serializable with serde.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schema;

/// Canonical sentiment of a VOC record.
///
/// Raw values outside the known encodings are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Sentiment {
    /// 긍정
    Positive,
    /// 중립
    Neutral,
    /// 부정
    Negative,
    /// Unmapped raw value
    Other(String),
}

impl Sentiment {
    /// Normalize a raw cell value. Known encodings map to the canonical
    /// variants; anything else passes through unchanged.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        schema::lookup_sentiment(raw).unwrap_or_else(|| Self::Other(raw.trim().to_string()))
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Positive => "긍정",
            Self::Neutral => "중립",
            Self::Negative => "부정",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        sentiment.label().to_string()
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

/// Year and month used to group and order monthly aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
}

impl MonthKey {
    /// Month key of a timestamp.
    #[must_use]
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One classified feedback row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier, when the file has one
    pub id: Option<String>,
    /// Parsed value of the date column
    pub timestamp: NaiveDateTime,
    /// Month the record falls in
    pub month: MonthKey,
    /// Normalized sentiment; `None` for an empty cell or a file without sentiment
    pub sentiment: Option<Sentiment>,
    /// Major category
    pub major: Option<String>,
    /// Minor category
    pub minor: Option<String>,
    /// Remaining columns, passed through untouched
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Free-text answer, when the file carries one.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.fields.get(schema::ANSWER_COLUMN).map(String::as_str)
    }

    /// `major > minor` label when both categories are set.
    #[must_use]
    pub fn combination(&self) -> Option<(&str, &str)> {
        match (&self.major, &self.minor) {
            (Some(major), Some(minor)) => Some((major.as_str(), minor.as_str())),
            _ => None,
        }
    }
}

/// Which optional columns the source file provided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    /// `voc_id` present
    pub id: bool,
    /// A sentiment column present
    pub sentiment: bool,
    /// Major category (canonical or aliased) present
    pub major: bool,
    /// Minor category (canonical or aliased) present
    pub minor: bool,
    /// Free-text answer column present
    pub answer: bool,
}

/// Size and modification time of the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path that was read
    pub path: PathBuf,
    /// Size in kilobytes
    pub size_kb: f64,
    /// Last modification time
    pub modified: Option<DateTime<Local>>,
}

/// What the normalizer saw and kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSummary {
    /// Source file details
    pub file: FileInfo,
    /// Column used as the date source
    pub date_column: String,
    /// Data rows in the file
    pub total_rows: usize,
    /// Rows dropped because the date failed to parse
    pub dropped_rows: usize,
    /// Year the dataset was restricted to
    pub target_year: i32,
    /// Rows in the target year
    pub target_rows: usize,
    /// First date in the target year slice
    pub first_date: NaiveDate,
    /// Last date in the target year slice
    pub last_date: NaiveDate,
    /// First month in the slice
    pub first_month: MonthKey,
    /// Last month in the slice
    pub last_month: MonthKey,
    /// Distinct sentiment values in the slice
    pub sentiment_kinds: usize,
    /// Distinct major categories in the slice
    pub major_categories: usize,
}

/// Normalized, year-restricted dataset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    /// Records of the target year, in file order
    pub records: Vec<Record>,
    /// Optional columns the file provided
    pub columns: ColumnSet,
    /// Load provenance
    pub provenance: ProvenanceSummary,
}

impl NormalizedDataset {
    /// Name of the column the dates came from.
    #[must_use]
    pub fn date_column(&self) -> &str {
        &self.provenance.date_column
    }

    /// Year the dataset covers.
    #[must_use]
    pub const fn target_year(&self) -> i32 {
        self.provenance.target_year
    }
}

/// Temporal scope of a report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    /// Latest month present in the dataset
    CurrentMonth,
    /// Whole target year
    YearToDate,
}

impl Period {
    /// Stable identifier, also used in export file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentMonth => "current-month",
            Self::YearToDate => "year-to-date",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current-month" | "current" | "month" | "현월" => Ok(Self::CurrentMonth),
            "year-to-date" | "ytd" | "year" | "누적" => Ok(Self::YearToDate),
            other => Err(format!(
                "unknown period '{other}', expected current-month or year-to-date"
            )),
        }
    }
}

/// Aggregates for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Month
    pub month: MonthKey,
    /// Records (classifications) in the month
    pub record_count: usize,
    /// Distinct ids, or the record count when the file has no id column
    pub distinct_ids: usize,
    /// Share of positive among records with a sentiment, in percent
    pub positive_ratio: f64,
    /// Share of neutral, in percent
    pub neutral_ratio: f64,
    /// Share of negative, in percent
    pub negative_ratio: f64,
    /// Counts for the overall top categories, aligned with `TrendReport::top_categories`
    pub category_counts: Vec<usize>,
}

/// Monthly series over the whole normalized dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// One entry per month, ascending
    pub months: Vec<MonthlySummary>,
    /// Up to three majors with the highest overall volume
    pub top_categories: Vec<String>,
}

/// Year-to-date comparison point for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyComparison {
    /// Month
    pub month: MonthKey,
    /// Distinct ids, or the record count without an id column
    pub distinct_ids: usize,
    /// Negative records over all records of the month, in percent
    pub negative_share: f64,
}

/// Count of one (major, minor) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Major category
    pub major: String,
    /// Minor category
    pub minor: String,
    /// Records with this pair
    pub count: usize,
    /// Share of the scoped records, in percent
    pub ratio: f64,
}

impl Combination {
    /// `major > minor` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} > {}", self.major, self.minor)
    }
}

/// Headline metrics for the selected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetrics {
    /// Records in scope
    pub record_count: usize,
    /// Distinct ids in scope
    pub distinct_ids: usize,
    /// Negative share among records with a sentiment, in percent
    pub negative_ratio: f64,
    /// Most frequent (major, minor) pair
    pub top_combination: Option<Combination>,
}

/// Share of one minor category inside its major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinorShare {
    /// Minor category
    pub minor: String,
    /// Records
    pub count: usize,
    /// Share within the major, in percent
    pub ratio: f64,
}

/// Minors beyond the top three, collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherBucket {
    /// Number of collapsed minors
    pub minors: usize,
    /// Their combined records
    pub count: usize,
    /// Their combined share within the major, in percent
    pub ratio: f64,
}

/// One major category and its leading minors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorBreakdown {
    /// Major category
    pub major: String,
    /// Records in the major
    pub count: usize,
    /// Top three minors by count
    pub minors: Vec<MinorShare>,
    /// Everything after the top three
    pub other: Option<OtherBucket>,
}

/// Sentiment, category and two-level breakdowns for the selected period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionBreakdown {
    /// Records per sentiment, descending
    pub sentiments: Vec<(Sentiment, usize)>,
    /// Records per major, descending
    pub majors: Vec<(String, usize)>,
    /// Every (major, minor) pair under the top ten majors
    pub branches: Vec<Combination>,
    /// Top ten majors with top three minors and an "other" bucket
    pub hierarchy: Vec<MajorBreakdown>,
}

/// Sort direction of the detail table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Largest groups first
    #[default]
    Desc,
    /// Smallest groups first
    Asc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desc" | "descending" => Ok(Self::Desc),
            "asc" | "ascending" => Ok(Self::Asc),
            other => Err(format!("unknown sort order '{other}', expected desc or asc")),
        }
    }
}

/// User-chosen filters for the detail table. `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Restrict to one sentiment
    pub sentiment: Option<Sentiment>,
    /// Restrict to one major category
    pub major: Option<String>,
    /// Restrict to one (major, minor) pair
    pub combination: Option<(String, String)>,
    /// Sort direction of the result
    pub sort: SortOrder,
}

/// Values offered for each filter over a scoped record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct sentiments, first-encountered order
    pub sentiments: Vec<Sentiment>,
    /// Distinct majors, first-encountered order
    pub majors: Vec<String>,
    /// Distinct `major > minor` labels, first-encountered order
    pub combinations: Vec<String>,
}

/// One group of the detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Sentiment key, when sentiment is a grouping column
    pub sentiment: Option<Sentiment>,
    /// Major key, when major is a grouping column
    pub major: Option<String>,
    /// Minor key, when minor is a grouping column
    pub minor: Option<String>,
    /// Distinct ids in the group
    pub distinct_ids: usize,
    /// Records in the group
    pub record_count: usize,
    /// Share of all grouped records, in percent, one decimal
    pub ratio: f64,
}

/// Result of a detail-table query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailTable {
    /// At least one group matched
    Rows {
        /// Groups in the requested order
        rows: Vec<DetailRow>,
        /// Records across all groups
        total: usize,
    },
    /// The filters matched no record
    NoMatches,
    /// The file has none of the grouping columns
    NoGroupingColumns,
}

impl DetailTable {
    /// Groups, empty for the non-row states.
    #[must_use]
    pub fn rows(&self) -> &[DetailRow] {
        match self {
            Self::Rows { rows, .. } => rows,
            Self::NoMatches | Self::NoGroupingColumns => &[],
        }
    }

    /// True when the filters matched nothing.
    #[must_use]
    pub const fn is_no_matches(&self) -> bool {
        matches!(self, Self::NoMatches)
    }
}

/// Volume tier of the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTier {
    /// More than 1000 records
    High,
    /// More than 500 records
    Normal,
    /// 500 or fewer
    Low,
    /// Year-to-date total, no tiering
    YearTotal,
}

/// Negative-ratio tier of the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeTier {
    /// Above 60%
    Critical,
    /// Above 40%
    Caution,
    /// 40% or below (양호)
    Good,
}

/// Kind of a narrative comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentKind {
    /// Volume observation
    Volume {
        /// Tier
        tier: VolumeTier,
    },
    /// Negative-ratio observation
    Negative {
        /// Tier
        tier: NegativeTier,
    },
    /// Dominant major category
    DominantCategory {
        /// Major
        major: String,
    },
    /// Major with most negative feedback
    Action {
        /// Major
        major: String,
    },
}

/// One generated observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// What the comment is about
    pub kind: CommentKind,
    /// Rendered text
    pub text: String,
}

/// Top combinations and comments for the selected period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Up to ten most frequent (major, minor) pairs
    pub top_combinations: Vec<Combination>,
    /// Ordered observations
    pub comments: Vec<Comment>,
}

/// Output format for written reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text / markdown format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" | "md" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}', expected txt or json")),
        }
    }
}
