use housing_insights::{
    GroupBy, aggregate, apply_filters, cleaner::Cleaner, config::AnalyticsConfig,
    filter::FilterCriteria, generate, stats::rolling_average,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_records_respect_price_floor_and_ratio(seed in any::<u64>(), count in 1usize..300) {
        let config = AnalyticsConfig::default();
        let records = generate(&config, count, seed).expect("generate");
        prop_assert_eq!(records.len(), count);
        for (idx, record) in records.iter().enumerate() {
            prop_assert_eq!(record.id, idx as u64 + 1);
            let price = record.price.unwrap();
            let sqft = record.square_footage.unwrap();
            prop_assert!(price >= config.price.min);
            prop_assert!(sqft >= config.square_footage.min);
            let ratio = record.price_per_sqft.unwrap();
            prop_assert!((ratio - price / sqft as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn same_seed_reproduces_records(seed in any::<u64>()) {
        let config = AnalyticsConfig::default();
        let first = generate(&config, 50, seed).expect("generate");
        let second = generate(&config, 50, seed).expect("generate");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cleaning_twice_matches_cleaning_once(seed in any::<u64>(), corrupt in 0usize..50) {
        let config = AnalyticsConfig::default();
        let mut records = generate(&config, 50, seed).expect("generate");
        records[corrupt].price = Some(1_000.0);
        records[(corrupt + 7) % 50].neighborhood = Some(format!("  {}  ", config.neighborhoods[0].name));
        let cleaner = Cleaner::new(&config);
        let once = cleaner.clean(&records);
        prop_assert_eq!(once.len(), 49);
        prop_assert_eq!(cleaner.clean(&once), once);
    }

    #[test]
    fn empty_criteria_select_everything(seed in any::<u64>()) {
        let config = AnalyticsConfig::default();
        let records = generate(&config, 40, seed).expect("generate");
        prop_assert_eq!(apply_filters(&records, &FilterCriteria::default()), records);
    }

    #[test]
    fn group_counts_cover_every_record(seed in any::<u64>()) {
        let config = AnalyticsConfig::default();
        let records = generate(&config, 200, seed).expect("generate");
        for group_by in [GroupBy::Neighborhood, GroupBy::PropertyType, GroupBy::Year] {
            let rows = aggregate(&records, group_by, &config);
            prop_assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), records.len());
        }
    }

    #[test]
    fn rolling_average_of_single_value_is_that_value(value in -1.0e9f64..1.0e9, window in 1usize..12) {
        prop_assert_eq!(rolling_average(&[value], window), vec![value]);
    }

    #[test]
    fn rolling_average_stays_within_series_bounds(
        values in proptest::collection::vec(0.0f64..1.0e6, 1..40),
        window in 1usize..8
    ) {
        let averaged = rolling_average(&values, window);
        prop_assert_eq!(averaged.len(), values.len());
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for avg in averaged {
            prop_assert!(avg >= lo - 1e-6 && avg <= hi + 1e-6);
        }
    }
}
