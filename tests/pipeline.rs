mod common;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use housing_insights::{
    AnalyticsError, GroupBy, GroupKey, TimePeriod, aggregate, aggregate::Aggregator,
    apply_filters, cleaner::Cleaner, config::AnalyticsConfig, extract_insights,
    filter::FilterCriteria, generate,
};

use common::cleaned_records;

#[test]
fn default_dataset_uses_only_catalog_values() {
    let config = AnalyticsConfig::default();
    let records = generate(&config, 5_000, 42).expect("generate");
    assert_eq!(records.len(), 5_000);

    let neighborhoods = config.neighborhood_names().into_iter().collect::<BTreeSet<_>>();
    let property_types = config.property_type_names().into_iter().collect::<BTreeSet<_>>();
    for record in &records {
        assert!(neighborhoods.contains(record.neighborhood.as_deref().unwrap()));
        assert!(property_types.contains(record.property_type.as_deref().unwrap()));
        assert!(record.price.unwrap() >= 100_000.0);
    }

    let rows = aggregate(&records, GroupBy::Neighborhood, &config);
    assert_eq!(rows.len(), 12);
    for pair in rows.windows(2) {
        assert!(pair[0].avg_price.unwrap() >= pair[1].avg_price.unwrap());
    }
}

#[test]
fn generated_records_satisfy_price_and_date_invariants() {
    let config = AnalyticsConfig::default();
    let records = generate(&config, 5_000, 42).expect("generate");
    for record in &records {
        let price = record.price.unwrap();
        let sqft = record.square_footage.unwrap() as f64;
        assert!(price >= 100_000.0);
        assert!((record.price_per_sqft.unwrap() - price / sqft).abs() < 1e-6);
        assert!(record.sale_date >= config.date_range.start);
        assert!(record.sale_date <= config.date_range.end);
    }
}

#[test]
fn generated_records_survive_cleaning_unchanged() {
    let config = AnalyticsConfig::default();
    let records = generate(&config, 2_000, 42).expect("generate");
    let cleaned = Cleaner::new(&config).clean(&records);
    assert_eq!(cleaned, records);
}

#[test]
fn cleaning_is_idempotent() {
    let config = AnalyticsConfig::default();
    let mut records = generate(&config, 1_000, 9).expect("generate");
    records[0].price = Some(25_000.0);
    records[1].square_footage = None;
    records[2].neighborhood = Some(" Downtown ".into());
    records[3].bathrooms = Some(2.26);

    let cleaner = Cleaner::new(&config);
    let once = cleaner.clean(&records);
    let twice = cleaner.clean(&once);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 998);
}

#[test]
fn zero_square_footage_records_are_all_dropped() {
    let config = AnalyticsConfig::default();
    let mut records = generate(&config, 100, 1).expect("generate");
    for record in &mut records {
        record.square_footage = Some(0);
        record.price_per_sqft = None;
    }
    let (cleaned, report) = Cleaner::new(&config).clean_with_report(&records);
    assert!(cleaned.is_empty());
    assert_eq!(report.dropped.get("square_footage_out_of_range"), Some(&100));
}

#[test]
fn missing_square_footage_drops_records_with_stale_ratio() {
    let config = AnalyticsConfig::default();
    let mut records = generate(&config, 50, 4).expect("generate");
    for record in records.iter_mut().take(20) {
        record.square_footage = None;
        assert!(record.price_per_sqft.is_some());
    }
    let (cleaned, report) = Cleaner::new(&config).clean_with_report(&records);
    assert_eq!(cleaned.len(), 30);
    assert_eq!(report.dropped.get("missing_square_footage"), Some(&20));
    assert!(cleaned.iter().all(|r| r.square_footage.is_some()));

    let mut stale = records[0].clone();
    stale.recompute_derived();
    assert_eq!(stale.price_per_sqft, None);
}

#[test]
fn neighborhood_aggregation_preserves_count() {
    let (config, records) = cleaned_records(3_000, 5);
    let rows = aggregate(&records, GroupBy::Neighborhood, &config);
    assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), records.len());

    let types = aggregate(&records, GroupBy::PropertyType, &config);
    assert_eq!(types.len(), 5);
    assert_eq!(types.iter().map(|r| r.count).sum::<usize>(), records.len());
}

#[test]
fn segments_never_fall_below_minimum_count() {
    let (config, records) = cleaned_records(1_500, 21);
    let rows = aggregate(&records, GroupBy::Segment, &config);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|row| row.count >= 5));
    for pair in rows.windows(2) {
        assert!(pair[0].count >= pair[1].count);
    }
    assert!(
        rows.iter()
            .all(|row| matches!(row.key, GroupKey::Segment { .. }))
    );
}

#[test]
fn year_aggregation_covers_configured_range() {
    let (config, records) = cleaned_records(2_000, 3);
    let rows = aggregate(&records, GroupBy::Year, &config);
    let years = rows
        .iter()
        .map(|r| match r.key {
            GroupKey::Year(year) => year,
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    assert_eq!(years, vec![2020, 2021, 2022, 2023, 2024]);
}

#[test]
fn empty_filter_is_identity() {
    let (_, records) = cleaned_records(500, 8);
    assert_eq!(apply_filters(&records, &FilterCriteria::default()), records);
}

#[test]
fn filtered_selection_feeds_aggregation() {
    let (config, records) = cleaned_records(3_000, 13);
    let criteria = FilterCriteria::default()
        .with_neighborhoods(["Downtown", "Lakeview"])
        .with_sale_date(
            NaiveDate::from_ymd_opt(2023, 1, 1),
            NaiveDate::from_ymd_opt(2023, 12, 31),
        )
        .unwrap();
    let selected = apply_filters(&records, &criteria);
    assert!(!selected.is_empty());
    let rows = aggregate(&selected, GroupBy::Neighborhood, &config);
    assert_eq!(rows.len(), 2);
    let years = aggregate(&selected, GroupBy::Year, &config);
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].key, GroupKey::Year(2023));
}

#[test]
fn insights_require_records() {
    let config = AnalyticsConfig::default();
    let err = extract_insights(&[], &config).unwrap_err();
    assert!(matches!(err, AnalyticsError::InsufficientData(_)));
}

#[test]
fn sparse_neighborhood_is_never_best_value() {
    let (config, records) = cleaned_records(5_000, 42);
    // Keep only ten Greenfield sales; Greenfield has the cheapest price multiplier.
    let mut kept_greenfield = 0;
    let sparse = records
        .into_iter()
        .filter(|r| {
            if r.neighborhood.as_deref() == Some("Greenfield") {
                kept_greenfield += 1;
                kept_greenfield <= 10
            } else {
                true
            }
        })
        .collect::<Vec<_>>();
    let insights = extract_insights(&sparse, &config).expect("insights");
    let best = insights.best_value_neighborhood.expect("a qualifying neighborhood");
    assert_ne!(best, "Greenfield");
    assert_eq!(insights.total_count, sparse.len());
    assert!(insights.size_price_correlation.unwrap() > 0.0);
}

#[test]
fn monthly_trend_spans_series_minus_first_bucket() {
    let (config, records) = cleaned_records(5_000, 42);
    let aggregator = Aggregator::from_config(&config);
    let timeline = aggregator.aggregate_by_time(&records, TimePeriod::Month);
    assert_eq!(timeline.len(), 60);
    let trend = aggregator
        .trend(&records, TimePeriod::Month, 6)
        .expect("trend");
    assert_eq!(trend.len(), 59);
    assert_eq!(trend[0].period, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
    let total_volume = timeline.iter().map(|r| r.total_price).sum::<f64>();
    let expected = records.iter().filter_map(|r| r.price).sum::<f64>();
    assert!((total_volume - expected).abs() < 1.0);
}
