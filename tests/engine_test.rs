//! End-to-end tests for the aggregation engine over a small dataset

use proptest::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use voc_report::detail::detail_table;
use voc_report::models::{
    ColumnSet, DetailTable, FileInfo, MonthKey, NegativeTier, SortOrder, VolumeTier,
};
use voc_report::models::{CommentKind, FilterState, NormalizedDataset, Period, Record, Sentiment};
use voc_report::normalizer::{load_dataset, normalize_reader};
use voc_report::period::resolve_period;
use voc_report::report::build_report;
use voc_report::trend::sentiment_ratios;

const SAMPLE: &str = "voc_id,voc_start_dt,감정,대분류,중분류,voc_answer_re\n\
1,2025-05-01 09:00:00,긍정,배송,지연,감사합니다\n\
2,2025-05-02 10:00:00,긍정,배송,지연,\n\
3,2025-05-03,긍정,결제,환불,\n\
4,2025-05-04,긍정,상품,품질,\n\
5,2025-05-05,긍정,상품,품질,\n\
6,2025-05-06,부정,결제,환불,\n\
7,2025-05-07,부정,결제,오류,\n\
8,2025-05-08,부정,배송,파손,\n\
9,2025-05-09,중립,상품,문의,\n\
10,2025-05-10,중립,배송,지연,\n\
11,2025-06-01,positive,배송,지연,\n\
12,2025-06-15,1,배송,지연,\n\
13,2024-12-31,부정,결제,오류,\n\
14,not a date,부정,결제,오류,\n";

fn sample_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voc.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    (dir, path)
}

fn sample_dataset() -> NormalizedDataset {
    let (_dir, path) = sample_file();
    load_dataset(&path, 2025).unwrap()
}

#[test]
fn test_provenance_counts_dropped_and_excluded_rows() {
    let dataset = sample_dataset();
    let p = &dataset.provenance;
    assert_eq!(p.total_rows, 14);
    assert_eq!(p.dropped_rows, 1);
    assert_eq!(p.target_rows, 12);
    assert_eq!(p.date_column, "voc_start_dt");
    assert_eq!(p.first_month, MonthKey { year: 2025, month: 5 });
    assert_eq!(p.last_month, MonthKey { year: 2025, month: 6 });
    assert!(dataset.columns.answer);
}

#[test]
fn test_current_month_resolves_to_latest_month() {
    let dataset = sample_dataset();
    let scope = resolve_period(&dataset, Period::CurrentMonth);
    assert_eq!(scope.label, "2025-06");
    assert_eq!(scope.records().len(), 2);
    assert!(scope
        .records()
        .iter()
        .all(|r| r.sentiment == Some(Sentiment::Positive)));
}

#[test]
fn test_current_month_report() {
    let report = build_report(&sample_dataset(), Period::CurrentMonth, &FilterState::default());

    assert_eq!(report.overview.record_count, 2);
    assert!(report.overview.negative_ratio.abs() < f64::EPSILON);

    let comments = &report.summary.comments;
    assert_eq!(comments.len(), 3);
    assert_eq!(
        comments[0].kind,
        CommentKind::Volume {
            tier: VolumeTier::Low
        }
    );
    assert_eq!(comments[0].text, "📉 이번 달 VOC가 2건으로 비교적 적은 편입니다.");
    assert_eq!(
        comments[1].kind,
        CommentKind::Negative {
            tier: NegativeTier::Good
        }
    );
    assert!(comments[1].text.contains("양호"));
    assert_eq!(
        comments[2].text,
        "🎯 '배송' 분야가 100.0%로 가장 높은 비중을 차지합니다."
    );
    assert!(report.monthly_comparison.is_empty());
}

#[test]
fn test_year_to_date_report() {
    let report = build_report(&sample_dataset(), Period::YearToDate, &FilterState::default());

    assert_eq!(report.period_label, "2025년 누적");
    assert_eq!(report.overview.record_count, 12);
    assert_eq!(report.overview.distinct_ids, 12);
    assert!((report.overview.negative_ratio - 25.0).abs() < 1e-9);

    let top = report.overview.top_combination.as_ref().unwrap();
    assert_eq!(top.label(), "배송 > 지연");
    assert_eq!(top.count, 5);

    let texts: Vec<&str> = report.summary.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "📈 2025년 총 12건의 VOC가 12건의 분류로 처리되었습니다.",
            "✅ 부정 감정 비율이 25.0%로 양호한 편입니다.",
            "🎯 '배송' 분야가 50.0%로 가장 높은 비중을 차지합니다.",
            "💡 '결제' 분야의 부정 피드백 개선을 우선 검토하시기 바랍니다.",
        ]
    );

    let may = &report.trend.months[0];
    assert_eq!(may.record_count, 10);
    assert!((may.positive_ratio - 50.0).abs() < 1e-9);
    assert!((may.negative_ratio - 30.0).abs() < 1e-9);
    assert!((may.neutral_ratio - 20.0).abs() < 1e-9);
    assert_eq!(report.trend.top_categories[0], "배송");

    assert_eq!(report.monthly_comparison.len(), 2);
    assert!((report.monthly_comparison[0].negative_share - 30.0).abs() < 1e-9);
    assert!(report.monthly_comparison[1].negative_share.abs() < f64::EPSILON);
}

#[test]
fn test_detail_filter_by_sentiment_keeps_encounter_order() {
    let filter =
        FilterState::from_selections(Some("부정"), Some("ALL"), Some("전체"), SortOrder::Desc).unwrap();
    let report = build_report(&sample_dataset(), Period::YearToDate, &filter);

    let DetailTable::Rows { rows, total } = &report.detail else {
        panic!("expected rows, got {:?}", report.detail);
    };
    assert_eq!(*total, 3);
    let minors: Vec<_> = rows.iter().map(|r| r.minor.as_deref().unwrap()).collect();
    assert_eq!(minors, vec!["환불", "오류", "파손"]);
    let ratios: Vec<f64> = rows.iter().map(|r| r.ratio).collect();
    assert_eq!(ratios, vec![33.4, 33.3, 33.3]);
}

#[test]
fn test_unknown_combination_is_no_matches() {
    let filter =
        FilterState::from_selections(None, None, Some("없음 > 없음"), SortOrder::Desc).unwrap();
    let report = build_report(&sample_dataset(), Period::YearToDate, &filter);
    assert!(report.detail.is_no_matches());
    assert!(report.detail.rows().is_empty());
}

#[test]
fn test_reports_are_idempotent() {
    let dataset = sample_dataset();
    let filter = FilterState {
        major: Some("배송".to_string()),
        sort: SortOrder::Asc,
        ..FilterState::default()
    };
    let first = build_report(&dataset, Period::YearToDate, &filter);
    let second = build_report(&dataset, Period::YearToDate, &filter);
    assert_eq!(first, second);
}

#[test]
fn test_file_without_categories_has_no_grouping_columns() {
    let csv = "date,note\n2025-02-01,hello\n2025-02-03,world\n";
    let info = FileInfo {
        path: "plain.csv".into(),
        size_kb: 0.0,
        modified: None,
    };
    let dataset = normalize_reader(csv.as_bytes(), info, 2025).unwrap();
    let report = build_report(&dataset, Period::YearToDate, &FilterState::default());

    assert_eq!(report.detail, DetailTable::NoGroupingColumns);
    assert!(report.summary.top_combinations.is_empty());
    assert_eq!(report.summary.comments.len(), 1);
    assert_eq!(report.overview.distinct_ids, 2);
}

fn arb_record() -> impl Strategy<Value = Record> {
    let sentiment = prop_oneof![
        Just(None),
        Just(Some(Sentiment::Positive)),
        Just(Some(Sentiment::Neutral)),
        Just(Some(Sentiment::Negative)),
        Just(Some(Sentiment::Other("혼합".to_string()))),
    ];
    (
        sentiment,
        prop::option::of(prop::sample::select(vec!["배송", "결제", "상품"])),
        prop::option::of(prop::sample::select(vec!["지연", "환불", "품질", "문의"])),
        1u32..=12,
    )
        .prop_map(|(sentiment, major, minor, month)| {
            let timestamp = chrono::NaiveDate::from_ymd_opt(2025, month, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Record {
                id: None,
                timestamp,
                month: MonthKey::of(&timestamp),
                sentiment,
                major: major.map(str::to_string),
                minor: minor.map(str::to_string),
                fields: Default::default(),
            }
        })
}

proptest! {
    #[test]
    fn sentiment_shares_never_exceed_100(records in prop::collection::vec(arb_record(), 0..60)) {
        let refs: Vec<&Record> = records.iter().collect();
        let (pos, neu, neg) = sentiment_ratios(&refs);
        prop_assert!(pos + neu + neg <= 100.0 + 1e-9);
        prop_assert!(pos >= 0.0 && neu >= 0.0 && neg >= 0.0);

        let all_mapped = records.iter().all(|r| {
            matches!(
                r.sentiment,
                Some(Sentiment::Positive | Sentiment::Neutral | Sentiment::Negative)
            )
        });
        if all_mapped && !records.is_empty() {
            prop_assert!((pos + neu + neg - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn mapped_sentiment_shares_sum_to_100(
        sentiments in prop::collection::vec(
            prop_oneof![
                Just(Sentiment::Positive),
                Just(Sentiment::Neutral),
                Just(Sentiment::Negative),
            ],
            1..60,
        )
    ) {
        let timestamp = chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let records: Vec<Record> = sentiments
            .into_iter()
            .map(|sentiment| Record {
                id: None,
                timestamp,
                month: MonthKey::of(&timestamp),
                sentiment: Some(sentiment),
                major: None,
                minor: None,
                fields: Default::default(),
            })
            .collect();
        let refs: Vec<&Record> = records.iter().collect();
        let (pos, neu, neg) = sentiment_ratios(&refs);
        prop_assert!((pos + neu + neg - 100.0).abs() < 1e-9);
    }

    #[test]
    fn detail_ratios_sum_to_100(records in prop::collection::vec(arb_record(), 1..60)) {
        let refs: Vec<&Record> = records.iter().collect();
        let columns = ColumnSet { sentiment: true, major: true, minor: true, ..ColumnSet::default() };
        if let DetailTable::Rows { rows, total } = detail_table(&refs, columns, &FilterState::default()) {
            let sum: f64 = rows.iter().map(|r| r.ratio).sum();
            prop_assert!((sum - 100.0).abs() <= 0.1, "sum {} over {} rows", sum, rows.len());
            prop_assert_eq!(rows.iter().map(|r| r.record_count).sum::<usize>(), total);
            prop_assert!(rows.windows(2).all(|w| w[0].record_count >= w[1].record_count));
        }
    }
}
