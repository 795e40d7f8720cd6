//! Monthly series over the full normalized dataset.

use std::collections::BTreeMap;

use crate::models::{
    ColumnSet, MonthKey, MonthlyComparison, MonthlySummary, Record, Sentiment, TrendReport,
};
use crate::utils::{distinct_ids, percent, value_counts};

/// Number of majors tracked in the category trend.
pub const TREND_CATEGORIES: usize = 3;

fn by_month<'a>(records: &[&'a Record]) -> BTreeMap<MonthKey, Vec<&'a Record>> {
    let mut months: BTreeMap<MonthKey, Vec<&Record>> = BTreeMap::new();
    for &record in records {
        months.entry(record.month).or_default().push(record);
    }
    months
}

/// Majors with the highest volume, at most `n`.
#[must_use]
pub fn top_majors(records: &[&Record], n: usize) -> Vec<String> {
    value_counts(records.iter().map(|r| r.major.clone()))
        .into_iter()
        .take(n)
        .map(|(major, _)| major)
        .collect()
}

/// Sentiment shares among records that carry a sentiment.
///
/// Unmapped values count towards the denominator, so the three shares only
/// reach 100 when every sentiment is recognized.
#[must_use]
pub fn sentiment_ratios(records: &[&Record]) -> (f64, f64, f64) {
    let mut positive = 0;
    let mut neutral = 0;
    let mut negative = 0;
    let mut total = 0;
    for sentiment in records.iter().filter_map(|r| r.sentiment.as_ref()) {
        total += 1;
        match sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Neutral => neutral += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Other(_) => {}
        }
    }
    (
        percent(positive, total),
        percent(neutral, total),
        percent(negative, total),
    )
}

/// Per-month counts, sentiment shares and top-category series.
#[must_use]
pub fn monthly_trend(records: &[&Record], columns: ColumnSet) -> TrendReport {
    let top_categories = if columns.major {
        top_majors(records, TREND_CATEGORIES)
    } else {
        Vec::new()
    };

    let months = by_month(records)
        .into_iter()
        .map(|(month, rows)| {
            let (positive_ratio, neutral_ratio, negative_ratio) = sentiment_ratios(&rows);
            MonthlySummary {
                month,
                record_count: rows.len(),
                distinct_ids: distinct_ids(&rows, columns.id),
                positive_ratio,
                neutral_ratio,
                negative_ratio,
                category_counts: top_categories
                    .iter()
                    .map(|major| {
                        rows.iter()
                            .filter(|r| r.major.as_deref() == Some(major.as_str()))
                            .count()
                    })
                    .collect(),
            }
        })
        .collect();

    TrendReport {
        months,
        top_categories,
    }
}

/// Month-by-month volume and negative share for the year-to-date view.
///
/// The negative share here is taken over every record of the month, not only
/// those with a sentiment.
#[must_use]
pub fn monthly_comparison(records: &[&Record], columns: ColumnSet) -> Vec<MonthlyComparison> {
    by_month(records)
        .into_iter()
        .map(|(month, rows)| MonthlyComparison {
            month,
            distinct_ids: distinct_ids(&rows, columns.id),
            negative_share: if columns.sentiment {
                percent(
                    rows.iter()
                        .filter(|r| r.sentiment == Some(Sentiment::Negative))
                        .count(),
                    rows.len(),
                )
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap as Fields;

    fn record(month: u32, sentiment: Option<Sentiment>, major: &str) -> Record {
        let timestamp = NaiveDate::from_ymd_opt(2025, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        Record {
            id: None,
            timestamp,
            month: MonthKey::of(&timestamp),
            sentiment,
            major: Some(major.to_string()),
            minor: None,
            fields: Fields::new(),
        }
    }

    fn columns() -> ColumnSet {
        ColumnSet {
            sentiment: true,
            major: true,
            ..ColumnSet::default()
        }
    }

    #[test]
    fn months_are_ascending_with_zero_filled_categories() {
        let rows = vec![
            record(3, Some(Sentiment::Positive), "A"),
            record(1, Some(Sentiment::Negative), "B"),
            record(1, Some(Sentiment::Negative), "A"),
            record(3, None, "C"),
        ];
        let refs: Vec<&Record> = rows.iter().collect();
        let trend = monthly_trend(&refs, columns());

        assert_eq!(trend.top_categories, vec!["A", "B", "C"]);
        assert_eq!(trend.months.len(), 2);
        assert_eq!(trend.months[0].month.month, 1);
        assert_eq!(trend.months[0].category_counts, vec![1, 1, 0]);
        assert_eq!(trend.months[1].category_counts, vec![1, 0, 1]);
        assert_eq!(trend.months[0].distinct_ids, 2);
        assert!((trend.months[0].negative_ratio - 100.0).abs() < 1e-9);
        assert!((trend.months[1].positive_ratio - 100.0).abs() < 1e-9);
    }

    #[test]
    fn unmapped_sentiment_keeps_sum_below_hundred() {
        let rows = vec![
            record(1, Some(Sentiment::Positive), "A"),
            record(1, Some(Sentiment::Other("mixed".into())), "A"),
        ];
        let refs: Vec<&Record> = rows.iter().collect();
        let (p, n, g) = sentiment_ratios(&refs);
        assert!((p - 50.0).abs() < 1e-9);
        assert!((p + n + g - 50.0).abs() < 1e-9);
    }

    #[test]
    fn no_sentiment_gives_zero_ratios() {
        let rows = vec![record(1, None, "A")];
        let refs: Vec<&Record> = rows.iter().collect();
        assert_eq!(sentiment_ratios(&refs), (0.0, 0.0, 0.0));
    }

    #[test]
    fn top_majors_of_empty_dataset_is_empty() {
        assert!(top_majors(&[], 3).is_empty());
        assert!(monthly_trend(&[], columns()).months.is_empty());
    }

    #[test]
    fn comparison_uses_all_records_as_denominator() {
        let rows = vec![
            record(2, Some(Sentiment::Negative), "A"),
            record(2, None, "A"),
        ];
        let refs: Vec<&Record> = rows.iter().collect();
        let comparison = monthly_comparison(&refs, columns());
        assert_eq!(comparison.len(), 1);
        assert!((comparison[0].negative_share - 50.0).abs() < 1e-9);
    }
}
