//! Headline metrics for a period scope.

use crate::models::{ColumnSet, Combination, OverviewMetrics, Record, Sentiment};
use crate::utils::{distinct_ids, percent, value_counts};

/// Negative records over records with a sentiment, in percent. 0 without sentiment data.
#[must_use]
pub fn negative_ratio(records: &[&Record]) -> f64 {
    let with_sentiment = records.iter().filter(|r| r.sentiment.is_some()).count();
    let negative = records
        .iter()
        .filter(|r| r.sentiment == Some(Sentiment::Negative))
        .count();
    percent(negative, with_sentiment)
}

/// (major, minor) pairs by descending count, ties in first-encountered order.
///
/// The ratio is taken against every record in `records`.
#[must_use]
pub fn combination_counts(records: &[&Record]) -> Vec<Combination> {
    value_counts(records.iter().map(|r| {
        r.combination()
            .map(|(major, minor)| (major.to_string(), minor.to_string()))
    }))
    .into_iter()
    .map(|((major, minor), count)| Combination {
        major,
        minor,
        count,
        ratio: percent(count, records.len()),
    })
    .collect()
}

/// Headline metrics for a period scope.
#[must_use]
pub fn overview(records: &[&Record], columns: ColumnSet) -> OverviewMetrics {
    let top_combination = if columns.major && columns.minor {
        combination_counts(records).into_iter().next()
    } else {
        None
    };

    OverviewMetrics {
        record_count: records.len(),
        distinct_ids: distinct_ids(records, columns.id),
        negative_ratio: if columns.sentiment {
            negative_ratio(records)
        } else {
            0.0
        },
        top_combination,
    }
}
