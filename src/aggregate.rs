//! Grouped summaries, time buckets, and trends.
//!
//! All functions are pure: they borrow the record set and build fresh rows on
//! every call. Records lacking the grouping dimension (for example a missing
//! price when grouping by segment) are left out of every partition; missing
//! metric values only leave that metric undefined for their partition.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::{AnalysisSettings, AnalyticsConfig, BucketBoundaries},
    error::{AnalyticsError, AnalyticsResult},
    record::{PriceCategory, PropertyRecord, SizeCategory},
    stats::{MetricAccumulator, rolling_average_sparse},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "kebab-case")]
pub enum GroupBy {
    Neighborhood,
    PropertyType,
    Year,
    /// Price category × size category × neighborhood.
    Segment,
}

impl GroupBy {
    pub fn key_headers(&self) -> &'static [&'static str] {
        match self {
            GroupBy::Neighborhood => &["neighborhood"],
            GroupBy::PropertyType => &["property_type"],
            GroupBy::Year => &["year"],
            GroupBy::Segment => &["price_category", "size_category", "neighborhood"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "kebab-case")]
pub enum TimePeriod {
    Day,
    Month,
    Quarter,
    Year,
}

impl TimePeriod {
    /// First day of the bucket containing `date`.
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        let start = match self {
            TimePeriod::Day => Some(date),
            TimePeriod::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            TimePeriod::Quarter => {
                let month = (date.month() - 1) / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1)
            }
            TimePeriod::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        start.unwrap_or(date)
    }

    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            TimePeriod::Day => start.format("%Y-%m-%d").to_string(),
            TimePeriod::Month => start.format("%Y-%m").to_string(),
            TimePeriod::Quarter => format!("{}-Q{}", start.year(), (start.month() - 1) / 3 + 1),
            TimePeriod::Year => start.year().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Neighborhood(String),
    PropertyType(String),
    Year(i32),
    Segment {
        price_category: PriceCategory,
        size_category: SizeCategory,
        neighborhood: String,
    },
    Period(NaiveDate),
}

impl GroupKey {
    pub fn labels(&self) -> Vec<String> {
        match self {
            GroupKey::Neighborhood(name) | GroupKey::PropertyType(name) => vec![name.clone()],
            GroupKey::Year(year) => vec![year.to_string()],
            GroupKey::Segment {
                price_category,
                size_category,
                neighborhood,
            } => vec![
                price_category.to_string(),
                size_category.to_string(),
                neighborhood.clone(),
            ],
            GroupKey::Period(start) => vec![start.format("%Y-%m-%d").to_string()],
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels().join(" / "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub count: usize,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Sum of the partition's known prices.
    pub total_price: f64,
    pub avg_square_footage: Option<f64>,
    pub avg_price_per_sqft: Option<f64>,
    pub avg_bedrooms: Option<f64>,
    pub avg_bathrooms: Option<f64>,
    pub avg_age_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub period: NaiveDate,
    pub count: usize,
    pub avg_price: Option<f64>,
    pub total_price: f64,
    pub price_change: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub rolling_avg_price: Option<f64>,
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    count: usize,
    price: MetricAccumulator,
    square_footage: MetricAccumulator,
    price_per_sqft: MetricAccumulator,
    bedrooms: MetricAccumulator,
    bathrooms: MetricAccumulator,
    age_years: MetricAccumulator,
}

impl GroupAccumulator {
    fn ingest(&mut self, record: &PropertyRecord) {
        self.count += 1;
        self.price.add(record.price);
        self.square_footage
            .add(record.square_footage.map(|v| v as f64));
        self.price_per_sqft.add(record.price_per_sqft);
        self.bedrooms.add(record.bedrooms.map(f64::from));
        self.bathrooms.add(record.bathrooms);
        self.age_years.add(record.age_years.map(f64::from));
    }

    fn finish(self, key: GroupKey) -> AggregateRow {
        AggregateRow {
            key,
            count: self.count,
            avg_price: self.price.mean(),
            median_price: self.price.median(),
            min_price: self.price.min(),
            max_price: self.price.max(),
            total_price: self.price.sum(),
            avg_square_footage: self.square_footage.mean(),
            avg_price_per_sqft: self.price_per_sqft.mean(),
            avg_bedrooms: self.bedrooms.mean(),
            avg_bathrooms: self.bathrooms.mean(),
            avg_age_years: self.age_years.mean(),
        }
    }
}

fn summarize<F>(records: &[PropertyRecord], key_of: F) -> Vec<AggregateRow>
where
    F: Fn(&PropertyRecord) -> Option<GroupKey>,
{
    let mut groups: BTreeMap<GroupKey, GroupAccumulator> = BTreeMap::new();
    for record in records {
        if let Some(key) = key_of(record) {
            groups.entry(key).or_default().ingest(record);
        }
    }
    groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect()
}

/// Descending by average price; undefined averages sort last.
fn by_avg_price_desc(a: &AggregateRow, b: &AggregateRow) -> Ordering {
    match (a.avg_price, b.avg_price) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.key.cmp(&b.key))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    buckets: BucketBoundaries,
    settings: AnalysisSettings,
}

impl Aggregator {
    pub fn new(buckets: BucketBoundaries, settings: AnalysisSettings) -> Self {
        Self { buckets, settings }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.buckets, config.analysis)
    }

    pub fn key_for(&self, record: &PropertyRecord, group_by: GroupBy) -> Option<GroupKey> {
        match group_by {
            GroupBy::Neighborhood => record.neighborhood.clone().map(GroupKey::Neighborhood),
            GroupBy::PropertyType => record.property_type.clone().map(GroupKey::PropertyType),
            GroupBy::Year => Some(GroupKey::Year(record.sale_date.year())),
            GroupBy::Segment => Some(GroupKey::Segment {
                price_category: record.price_category(&self.buckets.price)?,
                size_category: record.size_category(&self.buckets.size)?,
                neighborhood: record.neighborhood.clone()?,
            }),
        }
    }

    pub fn aggregate(&self, records: &[PropertyRecord], group_by: GroupBy) -> Vec<AggregateRow> {
        let mut rows = summarize(records, |record| self.key_for(record, group_by));
        match group_by {
            GroupBy::Neighborhood | GroupBy::PropertyType => rows.sort_by(by_avg_price_desc),
            GroupBy::Year => {}
            GroupBy::Segment => {
                let min_count = self.settings.segment_min_count;
                let before = rows.len();
                rows.retain(|row| row.count >= min_count);
                debug!(
                    "Dropped {} segment(s) with fewer than {min_count} record(s)",
                    before - rows.len()
                );
                rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
            }
        }
        rows
    }

    /// Buckets records by the start of their sale period, oldest first.
    pub fn aggregate_by_time(
        &self,
        records: &[PropertyRecord],
        period: TimePeriod,
    ) -> Vec<AggregateRow> {
        summarize(records, |record| {
            Some(GroupKey::Period(period.floor(record.sale_date)))
        })
    }

    /// Period-over-period price movement with a trailing rolling average.
    ///
    /// The rolling average covers the whole series; the first bucket is then
    /// dropped because it has no previous period to compare against.
    pub fn trend(
        &self,
        records: &[PropertyRecord],
        period: TimePeriod,
        window: usize,
    ) -> AnalyticsResult<Vec<TrendRow>> {
        if window == 0 {
            return Err(AnalyticsError::configuration(
                "rolling window must be at least 1",
            ));
        }
        let buckets = self.aggregate_by_time(records, period);
        let averages = buckets.iter().map(|row| row.avg_price).collect::<Vec<_>>();
        let rolling = rolling_average_sparse(&averages, window);

        let rows = buckets
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, row)| {
                let previous = averages[idx - 1];
                let price_change = match (row.avg_price, previous) {
                    (Some(current), Some(prev)) => Some(current - prev),
                    _ => None,
                };
                let price_change_pct = match (price_change, previous) {
                    (Some(change), Some(prev)) if prev != 0.0 => Some(change / prev * 100.0),
                    _ => None,
                };
                TrendRow {
                    period: period_start(&row.key).unwrap_or_default(),
                    count: row.count,
                    avg_price: row.avg_price,
                    total_price: row.total_price,
                    price_change,
                    price_change_pct,
                    rolling_avg_price: rolling[idx],
                }
            })
            .collect();
        Ok(rows)
    }
}

fn period_start(key: &GroupKey) -> Option<NaiveDate> {
    match key {
        GroupKey::Period(start) => Some(*start),
        _ => None,
    }
}

pub fn aggregate(
    records: &[PropertyRecord],
    group_by: GroupBy,
    config: &AnalyticsConfig,
) -> Vec<AggregateRow> {
    Aggregator::from_config(config).aggregate(records, group_by)
}

pub fn aggregate_by_time(records: &[PropertyRecord], period: TimePeriod) -> Vec<AggregateRow> {
    Aggregator::default().aggregate_by_time(records, period)
}
