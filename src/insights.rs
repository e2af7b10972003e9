//! Single-value highlights derived from a record set.
//!
//! Every highlight is individually optional: a neighborhood ranking with no
//! qualifying candidates yields `None` without affecting the other fields.
//! Ties are resolved by catalog order, with names outside the catalog ranked
//! after it alphabetically.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::{
    aggregate::{AggregateRow, Aggregator, GroupBy, GroupKey},
    config::AnalyticsConfig,
    error::{AnalyticsError, AnalyticsResult},
    record::{PropertyRecord, Season},
    stats::{MetricAccumulator, NumericField, correlation_between},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub total_count: usize,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub price_range: Option<PriceRange>,
    pub most_expensive_neighborhood: Option<String>,
    pub most_affordable_neighborhood: Option<String>,
    pub most_active_neighborhood: Option<String>,
    pub most_popular_property_type: Option<String>,
    pub busiest_season: Option<Season>,
    pub avg_price_per_sqft: Option<f64>,
    pub best_value_neighborhood: Option<String>,
    pub size_price_correlation: Option<f64>,
}

impl Insights {
    /// Label/value pairs in display order; undefined values render empty.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        use crate::stats::format_metric;
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        vec![
            ("total_count", self.total_count.to_string()),
            ("avg_price", format_metric(self.avg_price)),
            ("median_price", format_metric(self.median_price)),
            ("min_price", format_metric(self.price_range.map(|r| r.min))),
            ("max_price", format_metric(self.price_range.map(|r| r.max))),
            (
                "most_expensive_neighborhood",
                text(&self.most_expensive_neighborhood),
            ),
            (
                "most_affordable_neighborhood",
                text(&self.most_affordable_neighborhood),
            ),
            ("most_active_neighborhood", text(&self.most_active_neighborhood)),
            (
                "most_popular_property_type",
                text(&self.most_popular_property_type),
            ),
            (
                "busiest_season",
                self.busiest_season
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
            ),
            ("avg_price_per_sqft", format_metric(self.avg_price_per_sqft)),
            ("best_value_neighborhood", text(&self.best_value_neighborhood)),
            (
                "size_price_correlation",
                self.size_price_correlation
                    .map(|c| format!("{c:.3}"))
                    .unwrap_or_default(),
            ),
        ]
    }
}

struct CatalogOrder<'a> {
    names: Vec<&'a str>,
}

impl<'a> CatalogOrder<'a> {
    fn new(names: Vec<&'a str>) -> Self {
        Self { names }
    }

    fn rank<'n>(&self, name: &'n str) -> (usize, &'n str) {
        let position = self
            .names
            .iter()
            .position(|candidate| *candidate == name)
            .unwrap_or(self.names.len());
        (position, name)
    }

    /// Picks the best candidate; on equal values the lower rank wins.
    fn select<'n>(
        &self,
        candidates: impl IntoIterator<Item = (&'n str, f64)>,
        prefer_higher: bool,
    ) -> Option<String> {
        let mut candidates = candidates
            .into_iter()
            .filter(|(_, value)| value.is_finite())
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| self.rank(a.0).cmp(&self.rank(b.0)));
        let mut best: Option<(&str, f64)> = None;
        for (name, value) in candidates {
            let better = match best {
                None => true,
                Some((_, current)) if prefer_higher => value > current,
                Some((_, current)) => value < current,
            };
            if better {
                best = Some((name, value));
            }
        }
        best.map(|(name, _)| name.to_string())
    }
}

fn key_name(row: &AggregateRow) -> Option<&str> {
    match &row.key {
        GroupKey::Neighborhood(name) | GroupKey::PropertyType(name) => Some(name.as_str()),
        _ => None,
    }
}

pub fn extract_insights(
    records: &[PropertyRecord],
    config: &AnalyticsConfig,
) -> AnalyticsResult<Insights> {
    if records.is_empty() {
        return Err(AnalyticsError::insufficient_data(
            "cannot derive insights from an empty record set",
        ));
    }

    let mut price = MetricAccumulator::new();
    let mut price_per_sqft = MetricAccumulator::new();
    let mut seasons: BTreeMap<Season, usize> = BTreeMap::new();
    for record in records {
        price.add(record.price);
        price_per_sqft.add(record.price_per_sqft);
        *seasons.entry(record.season).or_insert(0) += 1;
    }

    let aggregator = Aggregator::from_config(config);
    let by_neighborhood = aggregator.aggregate(records, GroupBy::Neighborhood);
    let by_type = aggregator.aggregate(records, GroupBy::PropertyType);
    let neighborhoods = CatalogOrder::new(config.neighborhood_names());
    let property_types = CatalogOrder::new(config.property_type_names());

    let avg_prices = by_neighborhood
        .iter()
        .filter_map(|row| Some((key_name(row)?, row.avg_price?)))
        .collect::<Vec<_>>();
    let neighborhood_counts = by_neighborhood
        .iter()
        .filter_map(|row| Some((key_name(row)?, row.count as f64)));
    let type_counts = by_type
        .iter()
        .filter_map(|row| Some((key_name(row)?, row.count as f64)));

    let min_count = config.analysis.best_value_min_count;
    let value_candidates = by_neighborhood
        .iter()
        .filter(|row| row.count >= min_count)
        .filter_map(|row| Some((key_name(row)?, row.avg_price_per_sqft?)));
    let best_value_neighborhood = neighborhoods.select(value_candidates, false);
    if best_value_neighborhood.is_none() {
        debug!("No neighborhood has {min_count} or more sales; best value is undefined");
    }

    let busiest_season = Season::ALL
        .into_iter()
        .filter_map(|season| seasons.get(&season).map(|count| (season, *count)))
        .fold(None, |best: Option<(Season, usize)>, (season, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((season, count)),
        })
        .map(|(season, _)| season);

    Ok(Insights {
        total_count: records.len(),
        avg_price: price.mean(),
        median_price: price.median(),
        price_range: price
            .min()
            .zip(price.max())
            .map(|(min, max)| PriceRange { min, max }),
        most_expensive_neighborhood: neighborhoods.select(avg_prices.iter().copied(), true),
        most_affordable_neighborhood: neighborhoods.select(avg_prices.iter().copied(), false),
        most_active_neighborhood: neighborhoods.select(neighborhood_counts, true),
        most_popular_property_type: property_types.select(type_counts, true),
        busiest_season,
        avg_price_per_sqft: price_per_sqft.mean(),
        best_value_neighborhood,
        size_price_correlation: correlation_between(
            records,
            NumericField::SquareFootage,
            NumericField::Price,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    #[test]
    fn empty_input_is_insufficient_data() {
        let err = extract_insights(&[], &AnalyticsConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData(_)));
    }

    #[test]
    fn ties_follow_catalog_order() {
        let config = AnalyticsConfig::default();
        // Riverside precedes Eastgate in the catalog.
        let records = vec![
            record(1, "Eastgate", 400_000.0, 2_000),
            record(2, "Riverside", 400_000.0, 2_000),
        ];
        let insights = extract_insights(&records, &config).unwrap();
        assert_eq!(insights.most_expensive_neighborhood.as_deref(), Some("Riverside"));
        assert_eq!(insights.most_affordable_neighborhood.as_deref(), Some("Riverside"));
        assert_eq!(insights.most_active_neighborhood.as_deref(), Some("Riverside"));
    }

    #[test]
    fn best_value_requires_minimum_sales() {
        let config = AnalyticsConfig::default();
        let mut records = (1..=20)
            .map(|id| record(id, "Downtown", 600_000.0, 2_000))
            .collect::<Vec<_>>();
        records.extend((21..=25).map(|id| record(id, "Greenfield", 150_000.0, 2_000)));
        let insights = extract_insights(&records, &config).unwrap();
        assert_eq!(insights.best_value_neighborhood.as_deref(), Some("Downtown"));
        assert_eq!(insights.most_affordable_neighborhood.as_deref(), Some("Greenfield"));

        let few = &records[..10];
        let insights = extract_insights(few, &config).unwrap();
        assert_eq!(insights.best_value_neighborhood, None);
        assert_eq!(insights.total_count, 10);
    }

    #[test]
    fn summary_fields_are_populated() {
        let config = AnalyticsConfig::default();
        let mut winter = record(3, "Lakeview", 900_000.0, 3_000);
        winter.sale_date = chrono::NaiveDate::from_ymd_opt(2022, 12, 5).unwrap();
        winter.recompute_derived();
        let records = vec![
            record(1, "Downtown", 300_000.0, 1_000),
            record(2, "Downtown", 600_000.0, 2_000),
            winter,
        ];
        let insights = extract_insights(&records, &config).unwrap();
        assert_eq!(insights.total_count, 3);
        assert_eq!(insights.avg_price, Some(600_000.0));
        assert_eq!(insights.median_price, Some(600_000.0));
        assert_eq!(
            insights.price_range,
            Some(PriceRange {
                min: 300_000.0,
                max: 900_000.0
            })
        );
        assert_eq!(insights.most_expensive_neighborhood.as_deref(), Some("Lakeview"));
        assert_eq!(insights.most_active_neighborhood.as_deref(), Some("Downtown"));
        assert_eq!(insights.most_popular_property_type.as_deref(), Some("Condo"));
        assert_eq!(insights.busiest_season, Some(Season::Spring));
        assert_eq!(insights.avg_price_per_sqft, Some(300.0));
        assert!(insights.size_price_correlation.unwrap() > 0.99);
    }
}
