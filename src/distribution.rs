//! Sentiment, category and two-level category breakdowns for a period scope.

use crate::models::{
    ColumnSet, Combination, DistributionBreakdown, MajorBreakdown, MinorShare, OtherBucket, Record,
};
use crate::utils::{percent, value_counts};

/// Majors kept in the two-level breakdown.
pub const HIERARCHY_MAJORS: usize = 10;
/// Minors shown per major before the rest is collapsed.
pub const MINORS_PER_MAJOR: usize = 3;

/// Top majors with their leading minors and an "other" bucket.
///
/// Ratios are shares within the major, over records that have a minor.
#[must_use]
pub fn category_hierarchy(records: &[&Record], majors: &[(String, usize)]) -> Vec<MajorBreakdown> {
    majors
        .iter()
        .take(HIERARCHY_MAJORS)
        .map(|(major, count)| {
            let minors = value_counts(
                records
                    .iter()
                    .filter(|r| r.major.as_ref() == Some(major))
                    .map(|r| r.minor.clone()),
            );
            let total: usize = minors.iter().map(|(_, c)| c).sum();

            let other = (minors.len() > MINORS_PER_MAJOR).then(|| {
                let rest = &minors[MINORS_PER_MAJOR..];
                let rest_count = rest.iter().map(|(_, c)| c).sum();
                OtherBucket {
                    minors: rest.len(),
                    count: rest_count,
                    ratio: percent(rest_count, total),
                }
            });

            MajorBreakdown {
                major: major.clone(),
                count: *count,
                minors: minors
                    .iter()
                    .take(MINORS_PER_MAJOR)
                    .map(|(minor, c)| MinorShare {
                        minor: minor.clone(),
                        count: *c,
                        ratio: percent(*c, total),
                    })
                    .collect(),
                other,
            }
        })
        .collect()
}

/// Every (major, minor) pair whose major is among the top ten.
fn branches(records: &[&Record], majors: &[(String, usize)]) -> Vec<Combination> {
    let top: Vec<&str> = majors
        .iter()
        .take(HIERARCHY_MAJORS)
        .map(|(m, _)| m.as_str())
        .collect();
    let in_top: Vec<&Record> = records
        .iter()
        .copied()
        .filter(|r| r.major.as_deref().is_some_and(|m| top.contains(&m)))
        .collect();

    value_counts(in_top.iter().map(|r| {
        r.combination()
            .map(|(major, minor)| (major.to_string(), minor.to_string()))
    }))
    .into_iter()
    .map(|((major, minor), count)| Combination {
        major,
        minor,
        count,
        ratio: percent(count, in_top.len()),
    })
    .collect()
}

/// Build the distribution breakdown for a scope.
#[must_use]
pub fn distribution(records: &[&Record], columns: ColumnSet) -> DistributionBreakdown {
    let sentiments = if columns.sentiment {
        value_counts(records.iter().map(|r| r.sentiment.clone()))
    } else {
        Vec::new()
    };
    let majors = if columns.major {
        value_counts(records.iter().map(|r| r.major.clone()))
    } else {
        Vec::new()
    };
    let (branches, hierarchy) = if columns.major && columns.minor {
        (branches(records, &majors), category_hierarchy(records, &majors))
    } else {
        (Vec::new(), Vec::new())
    };

    DistributionBreakdown {
        sentiments,
        majors,
        branches,
        hierarchy,
    }
}
