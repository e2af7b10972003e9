//! Analytics configuration: catalogs, distributions, bounds, and thresholds.
//!
//! Every knob the generator, cleaner, aggregator, and insight extractor read
//! lives in [`AnalyticsConfig`]. The defaults describe the standard synthetic
//! market; a YAML file may override any subset of keys and the remainder keep
//! their default values:
//!
//! ```yaml
//! sample_size: 2000
//! date_range:
//!   start: 2022-01-01
//!   end: 2023-12-31
//! analysis:
//!   rolling_window: 6
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    yaml_io,
};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub sample_size: usize,
    pub seed: u64,
    pub date_range: DateRange,
    pub neighborhoods: Vec<NeighborhoodSpec>,
    pub property_types: Vec<WeightedLabel>,
    pub price: PriceModel,
    pub square_footage: SizeModel,
    pub bedrooms: Vec<WeightedValue<u8>>,
    pub bathrooms: Vec<WeightedValue<f64>>,
    pub parking_spaces: Vec<WeightedValue<u8>>,
    pub age_years: AgeModel,
    pub bounding_box: BoundingBox,
    pub cleaning: CleaningBounds,
    pub buckets: BucketBoundaries,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Inclusive number of days covered by the range.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodSpec {
    pub name: String,
    pub weight: f64,
    pub price_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedLabel {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue<T> {
    pub value: T,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceModel {
    pub mean: f64,
    pub std_dev: f64,
    /// Floor applied after every price adjustment.
    pub min: f64,
    /// Cap applied after the size adjustment.
    pub max: f64,
    /// Price added per square foot above the sample mean.
    pub size_premium_per_sqft: f64,
    pub noise_std_dev: f64,
}

impl Default for PriceModel {
    fn default() -> Self {
        Self {
            mean: 450_000.0,
            std_dev: 150_000.0,
            min: 100_000.0,
            max: 2_000_000.0,
            size_premium_per_sqft: 50.0,
            noise_std_dev: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeModel {
    pub mean: f64,
    pub std_dev: f64,
    pub min: i64,
}

impl Default for SizeModel {
    fn default() -> Self {
        Self {
            mean: 1_800.0,
            std_dev: 600.0,
            min: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeModel {
    pub min: u32,
    pub max: u32,
}

impl Default for AgeModel {
    fn default() -> Self {
        Self { min: 1, max: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_latitude: 37.70,
            max_latitude: 37.82,
            min_longitude: -122.52,
            max_longitude: -122.36,
        }
    }
}

/// Acceptance ranges enforced by the cleaner, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningBounds {
    pub min_price: f64,
    pub max_price: f64,
    pub min_square_footage: i64,
    pub max_square_footage: i64,
}

impl Default for CleaningBounds {
    fn default() -> Self {
        Self {
            min_price: 50_000.0,
            max_price: 2_000_000.0,
            min_square_footage: 200,
            max_square_footage: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketBoundaries {
    pub price: PriceBuckets,
    pub size: SizeBuckets,
}

/// Upper bounds (exclusive) of the price categories below Luxury.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceBuckets {
    pub budget_below: f64,
    pub mid_market_below: f64,
    pub premium_below: f64,
}

impl Default for PriceBuckets {
    fn default() -> Self {
        Self {
            budget_below: 300_000.0,
            mid_market_below: 500_000.0,
            premium_below: 800_000.0,
        }
    }
}

/// Upper bounds (exclusive) of the size categories below Extra Large.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeBuckets {
    pub compact_below: i64,
    pub standard_below: i64,
    pub large_below: i64,
}

impl Default for SizeBuckets {
    fn default() -> Self {
        Self {
            compact_below: 1_000,
            standard_below: 1_500,
            large_below: 2_500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Segments with fewer records than this are dropped.
    pub segment_min_count: usize,
    /// Neighborhoods need at least this many sales to be named best value.
    pub best_value_min_count: usize,
    pub rolling_window: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            segment_min_count: 5,
            best_value_min_count: 20,
            rolling_window: 3,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let neighborhoods = [
            ("Downtown", 0.12, 1.40),
            ("Riverside", 0.10, 1.20),
            ("Oak Park", 0.09, 1.10),
            ("Hillcrest", 0.08, 1.30),
            ("Westside", 0.09, 1.00),
            ("Eastgate", 0.08, 0.80),
            ("Lakeview", 0.07, 1.50),
            ("Maple Grove", 0.08, 0.90),
            ("Sunset Heights", 0.07, 1.25),
            ("Harbor Point", 0.06, 1.35),
            ("Greenfield", 0.08, 0.75),
            ("University District", 0.08, 0.70),
        ]
        .into_iter()
        .map(|(name, weight, price_multiplier)| NeighborhoodSpec {
            name: name.to_string(),
            weight,
            price_multiplier,
        })
        .collect();

        let property_types = [
            ("Single Family", 0.45),
            ("Condo", 0.20),
            ("Townhouse", 0.15),
            ("Multi-Family", 0.12),
            ("Duplex", 0.08),
        ]
        .into_iter()
        .map(|(name, weight)| WeightedLabel {
            name: name.to_string(),
            weight,
        })
        .collect();

        Self {
            sample_size: 5_000,
            seed: 42,
            date_range: DateRange::default(),
            neighborhoods,
            property_types,
            price: PriceModel::default(),
            square_footage: SizeModel::default(),
            bedrooms: weighted(&[
                (1, 0.08),
                (2, 0.22),
                (3, 0.35),
                (4, 0.22),
                (5, 0.10),
                (6, 0.03),
            ]),
            bathrooms: weighted(&[
                (1.0, 0.15),
                (1.5, 0.15),
                (2.0, 0.25),
                (2.5, 0.20),
                (3.0, 0.12),
                (3.5, 0.08),
                (4.0, 0.05),
            ]),
            parking_spaces: weighted(&[(0, 0.10), (1, 0.35), (2, 0.40), (3, 0.15)]),
            age_years: AgeModel::default(),
            bounding_box: BoundingBox::default(),
            cleaning: CleaningBounds::default(),
            buckets: BucketBoundaries::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

fn weighted<T: Copy>(pairs: &[(T, f64)]) -> Vec<WeightedValue<T>> {
    pairs
        .iter()
        .map(|&(value, weight)| WeightedValue { value, weight })
        .collect()
}

impl AnalyticsConfig {
    /// Loads a YAML configuration, filling unspecified keys with defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config: AnalyticsConfig = yaml_io::load_from_path(path)?;
        config
            .validate()
            .with_context(|| format!("Validating configuration {path:?}"))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the validated defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        yaml_io::save(path, self)
    }

    pub fn neighborhood_names(&self) -> Vec<&str> {
        self.neighborhoods.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn property_type_names(&self) -> Vec<&str> {
        self.property_types.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.sample_size == 0 {
            return Err(AnalyticsError::configuration(
                "sample_size must be greater than zero",
            ));
        }
        if self.date_range.start > self.date_range.end {
            return Err(AnalyticsError::configuration(format!(
                "date range start {} is after end {}",
                self.date_range.start, self.date_range.end
            )));
        }

        if self.neighborhoods.is_empty() {
            return Err(AnalyticsError::configuration(
                "neighborhood catalog is empty",
            ));
        }
        ensure_unique("neighborhood", self.neighborhoods.iter().map(|n| &n.name))?;
        check_weights(
            "neighborhoods",
            self.neighborhoods.iter().map(|n| n.weight),
        )?;
        if let Some(bad) = self
            .neighborhoods
            .iter()
            .find(|n| !(n.price_multiplier.is_finite() && n.price_multiplier > 0.0))
        {
            return Err(AnalyticsError::configuration(format!(
                "neighborhood '{}' has non-positive price multiplier {}",
                bad.name, bad.price_multiplier
            )));
        }

        if self.property_types.is_empty() {
            return Err(AnalyticsError::configuration(
                "property type catalog is empty",
            ));
        }
        ensure_unique(
            "property type",
            self.property_types.iter().map(|p| &p.name),
        )?;
        check_weights(
            "property_types",
            self.property_types.iter().map(|p| p.weight),
        )?;
        check_weights("bedrooms", self.bedrooms.iter().map(|b| b.weight))?;
        check_weights("bathrooms", self.bathrooms.iter().map(|b| b.weight))?;
        check_weights(
            "parking_spaces",
            self.parking_spaces.iter().map(|p| p.weight),
        )?;
        if self.bedrooms.iter().any(|b| b.value == 0) {
            return Err(AnalyticsError::configuration(
                "bedroom counts must be positive",
            ));
        }
        if self
            .bathrooms
            .iter()
            .any(|b| !(b.value.is_finite() && b.value > 0.0))
        {
            return Err(AnalyticsError::configuration(
                "bathroom counts must be positive",
            ));
        }

        let price = &self.price;
        ensure_finite(
            "price",
            &[
                ("mean", price.mean),
                ("std_dev", price.std_dev),
                ("min", price.min),
                ("max", price.max),
                ("size_premium_per_sqft", price.size_premium_per_sqft),
                ("noise_std_dev", price.noise_std_dev),
            ],
        )?;
        if !(price.std_dev >= 0.0 && price.noise_std_dev >= 0.0) {
            return Err(AnalyticsError::configuration(
                "price standard deviations must be non-negative",
            ));
        }
        if !(price.min > 0.0 && price.min <= price.max) {
            return Err(AnalyticsError::configuration(format!(
                "price bounds [{}, {}] are invalid",
                price.min, price.max
            )));
        }
        let size = &self.square_footage;
        ensure_finite(
            "square_footage",
            &[("mean", size.mean), ("std_dev", size.std_dev)],
        )?;
        if !(size.std_dev >= 0.0) || size.min <= 0 {
            return Err(AnalyticsError::configuration(
                "square footage model needs a positive floor and non-negative deviation",
            ));
        }
        if self.age_years.min > self.age_years.max {
            return Err(AnalyticsError::configuration(format!(
                "age range [{}, {}] is inverted",
                self.age_years.min, self.age_years.max
            )));
        }
        let bbox = &self.bounding_box;
        ensure_finite(
            "bounding_box",
            &[
                ("min_latitude", bbox.min_latitude),
                ("max_latitude", bbox.max_latitude),
                ("min_longitude", bbox.min_longitude),
                ("max_longitude", bbox.max_longitude),
            ],
        )?;
        if bbox.min_latitude > bbox.max_latitude || bbox.min_longitude > bbox.max_longitude {
            return Err(AnalyticsError::configuration("bounding box is inverted"));
        }

        let cleaning = &self.cleaning;
        ensure_finite(
            "cleaning",
            &[
                ("min_price", cleaning.min_price),
                ("max_price", cleaning.max_price),
            ],
        )?;
        if cleaning.min_price > cleaning.max_price
            || cleaning.min_square_footage > cleaning.max_square_footage
            || cleaning.min_square_footage <= 0
        {
            return Err(AnalyticsError::configuration(
                "cleaning bounds are inverted or non-positive",
            ));
        }

        let p = &self.buckets.price;
        ensure_finite(
            "buckets.price",
            &[
                ("budget_below", p.budget_below),
                ("mid_market_below", p.mid_market_below),
                ("premium_below", p.premium_below),
            ],
        )?;
        if !(p.budget_below < p.mid_market_below && p.mid_market_below < p.premium_below) {
            return Err(AnalyticsError::configuration(
                "price bucket boundaries must be strictly increasing",
            ));
        }
        let s = &self.buckets.size;
        if !(s.compact_below < s.standard_below && s.standard_below < s.large_below) {
            return Err(AnalyticsError::configuration(
                "size bucket boundaries must be strictly increasing",
            ));
        }
        if self.analysis.rolling_window == 0 {
            return Err(AnalyticsError::configuration(
                "rolling_window must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Rejects NaN and infinite values by name.
fn ensure_finite(section: &str, values: &[(&str, f64)]) -> AnalyticsResult<()> {
    match values.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(AnalyticsError::configuration(format!(
            "{section}.{name} must be a finite number, got {value}"
        ))),
        None => Ok(()),
    }
}

fn check_weights(name: &str, weights: impl Iterator<Item = f64>) -> AnalyticsResult<()> {
    let mut total = 0.0;
    let mut seen = 0usize;
    for weight in weights {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(AnalyticsError::configuration(format!(
                "{name} contains invalid weight {weight}"
            )));
        }
        total += weight;
        seen += 1;
    }
    if seen == 0 {
        return Err(AnalyticsError::configuration(format!(
            "{name} distribution is empty"
        )));
    }
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(AnalyticsError::configuration(format!(
            "{name} weights sum to {total}, expected 1"
        )));
    }
    Ok(())
}

fn ensure_unique<'a>(kind: &str, names: impl Iterator<Item = &'a String>) -> AnalyticsResult<()> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(AnalyticsError::configuration(format!(
                "{kind} '{name}' appears more than once"
            )));
        }
    }
    Ok(())
}
