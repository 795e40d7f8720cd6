//! Period resolution: which records a report view covers.

use serde::Serialize;

use crate::models::{MonthKey, NormalizedDataset, Period, Record};

/// Records selected by a [`Period`], with the label narrative text uses.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodScope<'a> {
    /// Requested period
    pub period: Period,
    /// Month key for the current month, the year-total label otherwise
    pub label: String,
    /// Month selected by `current-month`
    pub month: Option<MonthKey>,
    #[serde(skip)]
    records: Vec<&'a Record>,
}

impl<'a> PeriodScope<'a> {
    /// Records in scope, in file order.
    #[must_use]
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    /// True when the scope is the whole year.
    #[must_use]
    pub fn is_year_total(&self) -> bool {
        self.period == Period::YearToDate
    }
}

/// Label used for the year-to-date scope.
#[must_use]
pub fn year_total_label(year: i32) -> String {
    format!("{year}년 누적")
}

/// Restrict a dataset to a period.
///
/// `current-month` keeps the latest month present; `year-to-date` keeps
/// everything, since the dataset is already limited to the target year.
#[must_use]
pub fn resolve_period(dataset: &NormalizedDataset, period: Period) -> PeriodScope<'_> {
    match period {
        Period::YearToDate => PeriodScope {
            period,
            label: year_total_label(dataset.target_year()),
            month: None,
            records: dataset.records.iter().collect(),
        },
        Period::CurrentMonth => {
            let latest = dataset.records.iter().map(|r| r.month).max();
            PeriodScope {
                period,
                label: latest.map_or_else(|| "N/A".to_string(), |m| m.to_string()),
                month: latest,
                records: dataset
                    .records
                    .iter()
                    .filter(|r| Some(r.month) == latest)
                    .collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_reader;
    use crate::models::FileInfo;

    fn dataset() -> NormalizedDataset {
        let csv = "date,감정\n2025-01-03,긍정\n2025-02-10,부정\n2025-02-11,중립\n2025-01-30,긍정\n";
        let info = FileInfo {
            path: "memory.csv".into(),
            size_kb: 0.0,
            modified: None,
        };
        normalize_reader(csv.as_bytes(), info, 2025).unwrap()
    }

    #[test]
    fn current_month_picks_latest_month() {
        let data = dataset();
        let scope = resolve_period(&data, Period::CurrentMonth);
        assert_eq!(scope.label, "2025-02");
        assert_eq!(scope.records().len(), 2);
        assert!(!scope.is_year_total());
    }

    #[test]
    fn year_to_date_keeps_everything() {
        let data = dataset();
        let scope = resolve_period(&data, Period::YearToDate);
        assert_eq!(scope.label, "2025년 누적");
        assert_eq!(scope.records().len(), 4);
        assert!(scope.month.is_none());
    }
}
