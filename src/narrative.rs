//! Threshold-driven summary comments.
//!
//! The generator is deterministic: the same records, columns and period
//! always produce the same ordered comments, so the text can be tested by
//! exact match.

use crate::models::{
    ColumnSet, Comment, CommentKind, NegativeTier, Period, Record, Sentiment, SummaryStatistics,
    VolumeTier,
};
use crate::overview::{combination_counts, negative_ratio};
use crate::utils::{distinct_ids, format_count, percent, value_counts};

/// Number of (major, minor) pairs listed in the summary.
pub const TOP_COMBINATIONS: usize = 10;

/// Volume tier for a monthly record count.
#[must_use]
pub const fn volume_tier(count: usize) -> VolumeTier {
    if count > 1000 {
        VolumeTier::High
    } else if count > 500 {
        VolumeTier::Normal
    } else {
        VolumeTier::Low
    }
}

/// Tier for a negative ratio in percent.
#[must_use]
pub fn negative_tier(ratio: f64) -> NegativeTier {
    if ratio > 60.0 {
        NegativeTier::Critical
    } else if ratio > 40.0 {
        NegativeTier::Caution
    } else {
        NegativeTier::Good
    }
}

fn volume_comment(records: &[&Record], columns: ColumnSet, period: Period, year: i32) -> Comment {
    let total = records.len();
    let count = format_count(total);
    if period == Period::YearToDate {
        let vocs = format_count(distinct_ids(records, columns.id));
        return Comment {
            kind: CommentKind::Volume {
                tier: VolumeTier::YearTotal,
            },
            text: format!("📈 {year}년 총 {vocs}건의 VOC가 {count}건의 분류로 처리되었습니다."),
        };
    }

    let tier = volume_tier(total);
    let text = match tier {
        VolumeTier::High => format!("📈 이번 달 VOC가 {count}건으로 상당히 많은 편입니다."),
        VolumeTier::Normal => format!("📊 이번 달 VOC가 {count}건으로 보통 수준입니다."),
        VolumeTier::Low | VolumeTier::YearTotal => {
            format!("📉 이번 달 VOC가 {count}건으로 비교적 적은 편입니다.")
        }
    };
    Comment {
        kind: CommentKind::Volume { tier },
        text,
    }
}

fn negative_comment(records: &[&Record]) -> Comment {
    let ratio = negative_ratio(records);
    let tier = negative_tier(ratio);
    let text = match tier {
        NegativeTier::Critical => format!("⚠️ 부정 감정 비율이 {ratio:.1}%로 높아 개선이 시급합니다."),
        NegativeTier::Caution => format!("📍 부정 감정 비율이 {ratio:.1}%로 주의가 필요합니다."),
        NegativeTier::Good => format!("✅ 부정 감정 비율이 {ratio:.1}%로 양호한 편입니다."),
    };
    Comment {
        kind: CommentKind::Negative { tier },
        text,
    }
}

fn dominant_comment(records: &[&Record]) -> Option<Comment> {
    let (major, count) = value_counts(records.iter().map(|r| r.major.clone()))
        .into_iter()
        .next()?;
    let ratio = percent(count, records.len());
    Some(Comment {
        text: format!("🎯 '{major}' 분야가 {ratio:.1}%로 가장 높은 비중을 차지합니다."),
        kind: CommentKind::DominantCategory { major },
    })
}

fn action_comment(records: &[&Record]) -> Option<Comment> {
    let (major, _) = value_counts(
        records
            .iter()
            .filter(|r| r.sentiment == Some(Sentiment::Negative))
            .map(|r| r.major.clone()),
    )
    .into_iter()
    .next()?;
    Some(Comment {
        text: format!("💡 '{major}' 분야의 부정 피드백 개선을 우선 검토하시기 바랍니다."),
        kind: CommentKind::Action { major },
    })
}

/// Ordered comments: volume, negative tier, dominant major, action item.
///
/// The negative comment needs a sentiment column, the dominant comment a
/// major column, and the action comment both plus at least one negative
/// record with a major.
#[must_use]
pub fn comments(records: &[&Record], columns: ColumnSet, period: Period, year: i32) -> Vec<Comment> {
    let mut out = vec![volume_comment(records, columns, period, year)];
    if columns.sentiment {
        out.push(negative_comment(records));
    }
    if columns.major {
        out.extend(dominant_comment(records));
    }
    if columns.sentiment && columns.major {
        out.extend(action_comment(records));
    }
    out
}

/// Top combinations and comments for a scope.
#[must_use]
pub fn summary_statistics(
    records: &[&Record],
    columns: ColumnSet,
    period: Period,
    year: i32,
) -> SummaryStatistics {
    let top_combinations = if columns.major && columns.minor {
        combination_counts(records)
            .into_iter()
            .take(TOP_COMBINATIONS)
            .collect()
    } else {
        Vec::new()
    };
    SummaryStatistics {
        top_combinations,
        comments: comments(records, columns, period, year),
    }
}
