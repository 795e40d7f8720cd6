//! Shared counting helpers for the aggregation modules.
//!
//! Every "top N" in the report is ranked by [`value_counts`]: descending by
//! count, ties kept in first-encountered order.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::models::Record;

/// Count occurrences of each key, ordered by descending count.
///
/// Ties keep the order in which keys were first seen. `None` keys are
/// skipped, matching how missing cells are left out of every breakdown.
pub fn value_counts<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<K>>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for key in keys.into_iter().flatten() {
        if let Some(&slot) = index.get(&key) {
            counts[slot].1 += 1;
        } else {
            index.insert(key.clone(), counts.len());
            counts.push((key, 1));
        }
    }

    // sort_by is stable, so first-encountered order survives among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Distinct keys in first-encountered order.
pub fn distinct_in_order<K, I>(keys: I) -> Vec<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<K>>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .flatten()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// `part / whole * 100`, or 0 when `whole` is 0.
#[must_use]
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Percent shares of `counts` at one decimal that sum to exactly 100.0.
///
/// Every share is floored to a tenth, then the leftover tenths go to the
/// largest remainders, ties in input order. All zeros when the total is 0.
#[must_use]
pub fn apportion_percent(counts: &[usize]) -> Vec<f64> {
    const TENTHS: usize = 1000;
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    let mut tenths: Vec<usize> = counts.iter().map(|c| c * TENTHS / total).collect();
    let leftover = TENTHS - tenths.iter().sum::<usize>();

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| (counts[b] * TENTHS % total).cmp(&(counts[a] * TENTHS % total)));
    for &i in by_remainder.iter().take(leftover) {
        tenths[i] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}

/// Format a count with thousands separators, e.g. `12,345`.
#[must_use]
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Distinct non-empty ids, or the record count when the file has no id column.
#[must_use]
pub fn distinct_ids(records: &[&Record], has_id: bool) -> usize {
    if !has_id {
        return records.len();
    }
    records
        .iter()
        .filter_map(|r| r.id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}
