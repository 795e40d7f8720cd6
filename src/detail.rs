//! Filterable detail table.
//!
//! A query is a pure function of the scoped records and a [`FilterState`].
//! A filter combination that matches nothing yields
//! [`DetailTable::NoMatches`] rather than an error.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, VocReportError};
use crate::models::{
    ColumnSet, DetailRow, DetailTable, FilterOptions, FilterState, Record, Sentiment, SortOrder,
};
use crate::utils::{apportion_percent, distinct_in_order};

/// Filter value meaning "no restriction".
pub const ALL: &str = "ALL";
/// Localized form of [`ALL`].
pub const ALL_LOCALIZED: &str = "전체";
/// Separator between major and minor in a combination label.
pub const COMBINATION_SEPARATOR: &str = " > ";

fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL) || value == ALL_LOCALIZED
}

impl FilterState {
    /// Build a filter state from raw selections; `ALL`, `전체` or empty mean no restriction.
    pub fn from_selections(
        sentiment: Option<&str>,
        major: Option<&str>,
        combination: Option<&str>,
        sort: SortOrder,
    ) -> Result<Self> {
        let combination = match combination.filter(|c| !is_all(c)) {
            Some(label) => Some(parse_combination(label)?),
            None => None,
        };
        Ok(Self {
            sentiment: sentiment
                .filter(|s| !is_all(s))
                .map(Sentiment::from_raw),
            major: major.filter(|m| !is_all(m)).map(|m| m.trim().to_string()),
            combination,
            sort,
        })
    }
}

/// Split a `major > minor` label.
pub fn parse_combination(label: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = label.split(COMBINATION_SEPARATOR).collect();
    match parts.as_slice() {
        [major, minor] if !major.trim().is_empty() && !minor.trim().is_empty() => {
            Ok((major.trim().to_string(), minor.trim().to_string()))
        }
        _ => Err(VocReportError::InvalidFilter(format!(
            "expected 'major{COMBINATION_SEPARATOR}minor', got '{label}'"
        ))),
    }
}

/// Values a user can pick for each filter over a scope.
#[must_use]
pub fn filter_options(records: &[&Record], columns: ColumnSet) -> FilterOptions {
    FilterOptions {
        sentiments: if columns.sentiment {
            distinct_in_order(records.iter().map(|r| r.sentiment.clone()))
        } else {
            Vec::new()
        },
        majors: if columns.major {
            distinct_in_order(records.iter().map(|r| r.major.clone()))
        } else {
            Vec::new()
        },
        combinations: if columns.major && columns.minor {
            distinct_in_order(records.iter().map(|r| {
                r.combination()
                    .map(|(major, minor)| format!("{major}{COMBINATION_SEPARATOR}{minor}"))
            }))
        } else {
            Vec::new()
        },
    }
}

/// Records passing every active filter.
///
/// Sentiment and major filters on a file without that column do not restrict.
#[must_use]
pub fn apply_filters<'a>(
    records: &[&'a Record],
    columns: ColumnSet,
    filter: &FilterState,
) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| match &filter.sentiment {
            Some(wanted) if columns.sentiment => r.sentiment.as_ref() == Some(wanted),
            _ => true,
        })
        .filter(|r| match &filter.major {
            Some(wanted) if columns.major => r.major.as_ref() == Some(wanted),
            _ => true,
        })
        .filter(|r| match &filter.combination {
            Some((major, minor)) => {
                r.combination() == Some((major.as_str(), minor.as_str()))
            }
            None => true,
        })
        .collect()
}

type GroupKey = (Option<Sentiment>, Option<String>, Option<String>);

/// Filter, group by the present category columns, count and sort.
#[must_use]
pub fn detail_table(records: &[&Record], columns: ColumnSet, filter: &FilterState) -> DetailTable {
    if !(columns.sentiment || columns.major || columns.minor) {
        return DetailTable::NoGroupingColumns;
    }

    let filtered = apply_filters(records, columns, filter);

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<&Record>)> = Vec::new();

    for record in filtered {
        // rows missing a grouped value fall out of the table
        let key = (
            if columns.sentiment {
                match &record.sentiment {
                    Some(s) => Some(s.clone()),
                    None => continue,
                }
            } else {
                None
            },
            if columns.major {
                match &record.major {
                    Some(m) => Some(m.clone()),
                    None => continue,
                }
            } else {
                None
            },
            if columns.minor {
                match &record.minor {
                    Some(m) => Some(m.clone()),
                    None => continue,
                }
            } else {
                None
            },
        );

        if let Some(&slot) = index.get(&key) {
            groups[slot].1.push(record);
        } else {
            index.insert(key.clone(), groups.len());
            groups.push((key, vec![record]));
        }
    }

    if groups.is_empty() {
        return DetailTable::NoMatches;
    }

    let total: usize = groups.iter().map(|(_, rows)| rows.len()).sum();
    let shares = apportion_percent(&groups.iter().map(|(_, rows)| rows.len()).collect::<Vec<_>>());
    let mut rows: Vec<DetailRow> = groups
        .into_iter()
        .zip(shares)
        .map(|(((sentiment, major, minor), members), ratio)| DetailRow {
            sentiment,
            major,
            minor,
            distinct_ids: if columns.id {
                members
                    .iter()
                    .filter_map(|r| r.id.as_deref())
                    .collect::<HashSet<_>>()
                    .len()
            } else {
                members.len()
            },
            record_count: members.len(),
            ratio,
        })
        .collect();

    match filter.sort {
        SortOrder::Desc => rows.sort_by(|a, b| b.record_count.cmp(&a.record_count)),
        SortOrder::Asc => rows.sort_by(|a, b| a.record_count.cmp(&b.record_count)),
    }

    DetailTable::Rows { rows, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthKey;
    use chrono::NaiveDate;

    fn record(id: &str, sentiment: Sentiment, major: &str, minor: &str) -> Record {
        let timestamp = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        Record {
            id: Some(id.to_string()),
            timestamp,
            month: MonthKey::of(&timestamp),
            sentiment: Some(sentiment),
            major: Some(major.to_string()),
            minor: Some(minor.to_string()),
            fields: Default::default(),
        }
    }

    fn columns() -> ColumnSet {
        ColumnSet {
            id: true,
            sentiment: true,
            major: true,
            minor: true,
            answer: false,
        }
    }

    fn rows() -> Vec<Record> {
        vec![
            record("1", Sentiment::Negative, "결제", "환불"),
            record("1", Sentiment::Negative, "결제", "환불"),
            record("2", Sentiment::Positive, "배송", "지연"),
            record("3", Sentiment::Negative, "결제", "오류"),
            record("4", Sentiment::Negative, "결제", "환불"),
        ]
    }

    #[test]
    fn selections_treat_all_as_unrestricted() {
        let filter =
            FilterState::from_selections(Some("전체"), Some("ALL"), None, SortOrder::Asc).unwrap();
        assert_eq!(filter.sentiment, None);
        assert_eq!(filter.major, None);
        assert_eq!(filter.sort, SortOrder::Asc);

        let filter =
            FilterState::from_selections(Some("neg"), None, Some("결제 > 환불"), SortOrder::Desc)
                .unwrap();
        assert_eq!(filter.sentiment, Some(Sentiment::Negative));
        assert_eq!(
            filter.combination,
            Some(("결제".to_string(), "환불".to_string()))
        );
    }

    #[test]
    fn malformed_combination_is_rejected() {
        assert!(parse_combination("결제").is_err());
        assert!(parse_combination("a > b > c").is_err());
    }

    #[test]
    fn groups_count_and_sort() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let table = detail_table(&refs, columns(), &FilterState::default());

        let DetailTable::Rows { rows, total } = table else {
            panic!("expected rows");
        };
        assert_eq!(total, 5);
        assert_eq!(rows[0].major.as_deref(), Some("결제"));
        assert_eq!(rows[0].minor.as_deref(), Some("환불"));
        assert_eq!(rows[0].record_count, 3);
        assert_eq!(rows[0].distinct_ids, 2);
        assert!((rows[0].ratio - 60.0).abs() < 1e-9);
        // equal counts keep first-encountered order
        assert_eq!(rows[1].minor.as_deref(), Some("지연"));
        assert_eq!(rows[2].minor.as_deref(), Some("오류"));
    }

    #[test]
    fn ascending_sort_puts_small_groups_first() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let filter = FilterState {
            sort: SortOrder::Asc,
            ..FilterState::default()
        };
        let table = detail_table(&refs, columns(), &filter);
        assert_eq!(table.rows().last().map(|r| r.record_count), Some(3));
    }

    #[test]
    fn unknown_combination_yields_no_matches() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let filter = FilterState {
            combination: Some(("없음".to_string(), "없음".to_string())),
            ..FilterState::default()
        };
        assert_eq!(detail_table(&refs, columns(), &filter), DetailTable::NoMatches);
    }

    #[test]
    fn filters_combine() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let filter = FilterState {
            sentiment: Some(Sentiment::Negative),
            major: Some("결제".to_string()),
            ..FilterState::default()
        };
        let table = detail_table(&refs, columns(), &filter);
        let total_ratio: f64 = table.rows().iter().map(|r| r.ratio).sum();
        assert_eq!(table.rows().len(), 2);
        assert!((total_ratio - 100.0).abs() <= 0.1);
    }

    #[test]
    fn six_equal_groups_sum_to_100() {
        let data: Vec<Record> = [Sentiment::Positive, Sentiment::Negative]
            .into_iter()
            .flat_map(|s| {
                ["배송", "결제", "상품"]
                    .into_iter()
                    .map(move |major| record("x", s.clone(), major, "기타"))
            })
            .collect();
        let refs: Vec<&Record> = data.iter().collect();
        let table = detail_table(&refs, columns(), &FilterState::default());

        let ratios: Vec<f64> = table.rows().iter().map(|r| r.ratio).collect();
        assert_eq!(ratios, vec![16.7, 16.7, 16.7, 16.7, 16.6, 16.6]);
        let sum: f64 = ratios.iter().sum();
        assert!((sum - 100.0).abs() <= 0.1, "sum {sum}");
    }

    #[test]
    fn no_grouping_columns_is_its_own_state() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let only_id = ColumnSet {
            id: true,
            ..ColumnSet::default()
        };
        assert_eq!(
            detail_table(&refs, only_id, &FilterState::default()),
            DetailTable::NoGroupingColumns
        );
    }

    #[test]
    fn options_list_values_in_first_seen_order() {
        let data = rows();
        let refs: Vec<&Record> = data.iter().collect();
        let options = filter_options(&refs, columns());
        assert_eq!(options.sentiments, vec![Sentiment::Negative, Sentiment::Positive]);
        assert_eq!(options.majors, vec!["결제", "배송"]);
        assert_eq!(options.combinations, vec!["결제 > 환불", "배송 > 지연", "결제 > 오류"]);
    }
}
