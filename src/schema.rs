//! Column-name and value-encoding tables for classified VOC exports.
//!
//! The normalizer consults these tables instead of hard-coding names, so the
//! accepted input layouts can be read (and tested) in one place.

use crate::models::Sentiment;

/// Canonical sentiment column.
pub const SENTIMENT_COLUMN: &str = "감정";
/// Canonical major category column.
pub const MAJOR_COLUMN: &str = "대분류";
/// Canonical minor category column.
pub const MINOR_COLUMN: &str = "중분류";
/// Record identifier column, used for distinct-VOC counts.
pub const ID_COLUMN: &str = "voc_id";
/// Free-text answer column carried into exports when present.
pub const ANSWER_COLUMN: &str = "voc_answer_re";
/// Month key column name used in exports.
pub const MONTH_COLUMN: &str = "year_month";

/// Date columns in priority order. The first one present is authoritative.
pub const DATE_COLUMN_CANDIDATES: &[&str] = &[
    "voc_start_dt",
    "created_at",
    "date",
    "timestamp",
    "created_date",
    "voc_date",
    "analysis_date",
    "processed_date",
];

/// Columns that may hold the sentiment, in priority order.
pub const SENTIMENT_SOURCE_COLUMNS: &[&str] = &[SENTIMENT_COLUMN, "emotion", "sentiment"];

/// English category names copied into the canonical columns when the
/// canonical column is absent. Earlier entries win.
pub const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("major_category", MAJOR_COLUMN),
    ("minor_category", MINOR_COLUMN),
    ("category_major", MAJOR_COLUMN),
    ("category_minor", MINOR_COLUMN),
    ("main_category", MAJOR_COLUMN),
    ("sub_category", MINOR_COLUMN),
];

/// Raw sentiment encodings and the canonical value they map to.
/// Matching is done on the trimmed, lower-cased raw value.
pub const SENTIMENT_ENCODINGS: &[(&str, Sentiment)] = &[
    ("positive", Sentiment::Positive),
    ("negative", Sentiment::Negative),
    ("neutral", Sentiment::Neutral),
    ("pos", Sentiment::Positive),
    ("neg", Sentiment::Negative),
    ("neu", Sentiment::Neutral),
    ("1", Sentiment::Positive),
    ("0", Sentiment::Neutral),
    ("-1", Sentiment::Negative),
    ("긍정", Sentiment::Positive),
    ("중립", Sentiment::Neutral),
    ("부정", Sentiment::Negative),
];

/// Look up the canonical sentiment for a raw encoding.
#[must_use]
pub fn lookup_sentiment(raw: &str) -> Option<Sentiment> {
    let key = raw.trim().to_lowercase();
    SENTIMENT_ENCODINGS
        .iter()
        .find(|(encoding, _)| *encoding == key)
        .map(|(_, sentiment)| sentiment.clone())
}

/// Resolve which source column feeds each canonical category column.
///
/// A canonical column present in the header always feeds itself; otherwise
/// the first alias present in the header is used.
#[must_use]
pub fn resolve_category_source<'a>(headers: &'a [String], canonical: &str) -> Option<&'a str> {
    if let Some(name) = headers.iter().find(|h| h.as_str() == canonical) {
        return Some(name.as_str());
    }
    CATEGORY_ALIASES
        .iter()
        .filter(|(_, target)| *target == canonical)
        .find_map(|(alias, _)| headers.iter().find(|h| h.as_str() == *alias))
        .map(String::as_str)
}

/// First column of `candidates` present in `headers`.
#[must_use]
pub fn first_present<'a>(headers: &'a [String], candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().find(|h| h.as_str() == *candidate))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn numeric_and_english_encodings_agree() {
        assert_eq!(lookup_sentiment("1"), Some(Sentiment::Positive));
        assert_eq!(lookup_sentiment("positive"), Some(Sentiment::Positive));
        assert_eq!(lookup_sentiment(" NEG "), Some(Sentiment::Negative));
        assert_eq!(lookup_sentiment("-1"), Some(Sentiment::Negative));
        assert_eq!(lookup_sentiment("중립"), Some(Sentiment::Neutral));
        assert_eq!(lookup_sentiment("mixed"), None);
    }

    #[test]
    fn canonical_category_column_wins_over_alias() {
        let h = headers(&["대분류", "major_category", "sub_category"]);
        assert_eq!(resolve_category_source(&h, MAJOR_COLUMN), Some("대분류"));
        assert_eq!(resolve_category_source(&h, MINOR_COLUMN), Some("sub_category"));
    }

    #[test]
    fn alias_priority_follows_table_order() {
        let h = headers(&["main_category", "category_major"]);
        assert_eq!(resolve_category_source(&h, MAJOR_COLUMN), Some("category_major"));
        assert_eq!(resolve_category_source(&h, MINOR_COLUMN), None);
    }

    #[test]
    fn date_candidates_respect_priority() {
        let h = headers(&["timestamp", "created_at", "text"]);
        assert_eq!(first_present(&h, DATE_COLUMN_CANDIDATES), Some("created_at"));
        assert_eq!(first_present(&headers(&["text"]), DATE_COLUMN_CANDIDATES), None);
    }
}
