//! Report assembly and text rendering.
//!
//! [`build_report`] runs every view for one (dataset, period, filter) triple
//! and returns plain data. Rendering is separate so the same report can be
//! written as text or JSON.

use std::fmt::Write;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::detail::{detail_table, filter_options};
use crate::distribution::distribution;
use crate::models::{
    DetailTable, DistributionBreakdown, FilterOptions, FilterState, MonthlyComparison,
    NormalizedDataset, OverviewMetrics, Period, ProvenanceSummary, SortOrder, SummaryStatistics,
    TrendReport,
};
use crate::narrative::summary_statistics;
use crate::overview::overview;
use crate::period::resolve_period;
use crate::trend::{monthly_comparison, monthly_trend};
use crate::utils::format_count;

/// Everything the presentation layer needs for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocReport {
    /// Requested period
    pub period: Period,
    /// Month key or year-total label
    pub period_label: String,
    /// Where the data came from
    pub provenance: ProvenanceSummary,
    /// Monthly series over the whole dataset
    pub trend: TrendReport,
    /// Headline metrics for the period
    pub overview: OverviewMetrics,
    /// Breakdowns for the period
    pub distribution: DistributionBreakdown,
    /// Filters applied to the detail table
    pub filter: FilterState,
    /// Values available for each filter
    pub filter_options: FilterOptions,
    /// Detail table
    pub detail: DetailTable,
    /// Top combinations and comments
    pub summary: SummaryStatistics,
    /// Month-by-month comparison, only for the year-to-date period
    pub monthly_comparison: Vec<MonthlyComparison>,
    /// Closing line
    pub footer: String,
}

/// Build a report for a period and detail-table filter.
#[must_use]
pub fn build_report(dataset: &NormalizedDataset, period: Period, filter: &FilterState) -> VocReport {
    let columns = dataset.columns;
    let year = dataset.target_year();
    let all: Vec<_> = dataset.records.iter().collect();
    let scope = resolve_period(dataset, period);
    let records = scope.records();

    let footer = if scope.is_year_total() {
        format!(
            "총 {}건의 VOC 데이터를 분석했습니다. ({} ~ {})",
            format_count(all.len()),
            dataset.provenance.first_month,
            dataset.provenance.last_month
        )
    } else {
        format!(
            "{} 총 {}건의 VOC 데이터를 분석했습니다.",
            scope.label,
            format_count(records.len())
        )
    };

    VocReport {
        period,
        period_label: scope.label.clone(),
        provenance: dataset.provenance.clone(),
        trend: monthly_trend(&all, columns),
        overview: overview(records, columns),
        distribution: distribution(records, columns),
        filter: filter.clone(),
        filter_options: filter_options(records, columns),
        detail: detail_table(records, columns, filter),
        summary: summary_statistics(records, columns, period, year),
        monthly_comparison: if scope.is_year_total() {
            monthly_comparison(&all, columns)
        } else {
            Vec::new()
        },
        footer,
    }
}

fn filter_line(filter: &FilterState) -> String {
    let sentiment = filter
        .sentiment
        .as_ref()
        .map_or_else(|| "전체".to_string(), ToString::to_string);
    let major = filter.major.clone().unwrap_or_else(|| "전체".to_string());
    let combination = filter
        .combination
        .as_ref()
        .map_or_else(|| "전체".to_string(), |(a, b)| format!("{a} > {b}"));
    let sort = match filter.sort {
        SortOrder::Desc => "분류건수 내림차순",
        SortOrder::Asc => "분류건수 오름차순",
    };
    format!("감정: {sentiment} | 대분류: {major} | 대-중분류: {combination} | 정렬: {sort}")
}

/// Render a report as markdown text.
#[must_use]
pub fn render_text(report: &VocReport, generated_at: DateTime<Local>) -> String {
    let mut output = String::new();
    let p = &report.provenance;

    let _ = writeln!(output, "# VOC 분석 리포트 ({})", report.period_label);
    let _ = writeln!(
        output,
        "Source: {} ({:.1} KB), date column '{}'",
        p.file.path.display(),
        p.file.size_kb,
        p.date_column
    );
    let _ = writeln!(
        output,
        "Rows: {} total, {} dropped, {} in {} ({} ~ {})",
        format_count(p.total_rows),
        format_count(p.dropped_rows),
        format_count(p.target_rows),
        p.target_year,
        p.first_date,
        p.last_date
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## 트렌드 (월별)");
    if report.trend.months.is_empty() {
        let _ = writeln!(output, "No monthly data.");
    }
    for month in &report.trend.months {
        let _ = write!(
            output,
            "- {}: VOC {} / 분류 {} | 긍정 {:.1}% 중립 {:.1}% 부정 {:.1}%",
            month.month,
            format_count(month.distinct_ids),
            format_count(month.record_count),
            month.positive_ratio,
            month.neutral_ratio,
            month.negative_ratio
        );
        for (major, count) in report.trend.top_categories.iter().zip(&month.category_counts) {
            let _ = write!(output, " | {major} {count}");
        }
        let _ = writeln!(output);
    }
    let _ = writeln!(output);

    let o = &report.overview;
    let _ = writeln!(output, "## 개요");
    let _ = writeln!(output, "- VOC 수: {}", format_count(o.distinct_ids));
    let _ = writeln!(output, "- 분류 수: {}", format_count(o.record_count));
    let _ = writeln!(output, "- 부정 비중: {:.1}%", o.negative_ratio);
    let top = o.top_combination.as_ref().map(|c| c.label()).unwrap_or_default();
    let _ = writeln!(output, "- TOP 분류: {top}");
    let _ = writeln!(output);

    let d = &report.distribution;
    let _ = writeln!(output, "## 분포");
    for (sentiment, count) in &d.sentiments {
        let _ = writeln!(output, "- 감정 {sentiment}: {}", format_count(*count));
    }
    for (major, count) in &d.majors {
        let _ = writeln!(output, "- 대분류 {major}: {}", format_count(*count));
    }
    for branch in &d.hierarchy {
        let _ = writeln!(output, "### {} ({})", branch.major, format_count(branch.count));
        for minor in &branch.minors {
            let _ = writeln!(
                output,
                "• {}: {:.1}% ({}건)",
                minor.minor,
                minor.ratio,
                format_count(minor.count)
            );
        }
        if let Some(other) = &branch.other {
            let _ = writeln!(output, "• 기타 {}개: {:.1}%", other.minors, other.ratio);
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## 상세분석");
    let _ = writeln!(output, "{}", filter_line(&report.filter));
    match &report.detail {
        DetailTable::Rows { rows, total } => {
            let _ = writeln!(output, "| 감정 | 대분류 | 중분류 | VOC수 | 분류건수 | 비율(%) |");
            let _ = writeln!(output, "|---|---|---|---|---|---|");
            for row in rows {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} | {:.1} |",
                    row.sentiment.as_ref().map(ToString::to_string).unwrap_or_default(),
                    row.major.as_deref().unwrap_or_default(),
                    row.minor.as_deref().unwrap_or_default(),
                    format_count(row.distinct_ids),
                    format_count(row.record_count),
                    row.ratio
                );
            }
            let _ = writeln!(
                output,
                "필터 결과: {}개 조합, 총 {}건",
                rows.len(),
                format_count(*total)
            );
        }
        DetailTable::NoMatches => {
            let _ = writeln!(output, "필터 조건에 맞는 데이터가 없습니다.");
        }
        DetailTable::NoGroupingColumns => {
            let _ = writeln!(output, "분류할 수 있는 컬럼이 없습니다.");
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## TOP {} 대-중분류", crate::narrative::TOP_COMBINATIONS);
    if report.summary.top_combinations.is_empty() {
        let _ = writeln!(output, "대분류 또는 중분류 데이터가 없습니다.");
    }
    for (i, combination) in report.summary.top_combinations.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {}: {}건 ({:.1}%)",
            i + 1,
            combination.label(),
            format_count(combination.count),
            combination.ratio
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## {} 종합 코멘트", report.period_label);
    for comment in &report.summary.comments {
        let _ = writeln!(output, "- {}", comment.text);
    }

    if !report.monthly_comparison.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## 월별 비교");
        for point in &report.monthly_comparison {
            let _ = writeln!(
                output,
                "- {}: VOC {} | 부정 {:.1}%",
                point.month,
                format_count(point.distinct_ids),
                point.negative_share
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "---");
    let _ = writeln!(output, "{}", report.footer);
    let _ = writeln!(
        output,
        "분석 완료 시간: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    output
}
