//! Synthetic property population.
//!
//! Records are drawn independently from the configured categorical and
//! normal distributions, then a second pass ties price to size so the
//! dataset shows a positive size/price correlation. The RNG is ChaCha8
//! seeded from a `u64`, so a given seed and configuration always produce
//! the same records on every platform.

use chrono::Days;
use log::{debug, info};
use rand::{Rng, SeedableRng, distributions::WeightedIndex, prelude::Distribution};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use crate::{
    config::{AnalyticsConfig, WeightedValue},
    error::{AnalyticsError, AnalyticsResult},
    record::{PropertyRecord, Season},
};

pub fn generate(
    config: &AnalyticsConfig,
    count: usize,
    seed: u64,
) -> AnalyticsResult<Vec<PropertyRecord>> {
    RecordGenerator::new(config)?.generate(count, seed)
}

pub struct RecordGenerator<'a> {
    config: &'a AnalyticsConfig,
    neighborhoods: WeightedIndex<f64>,
    property_types: WeightedIndex<f64>,
    bedrooms: WeightedIndex<f64>,
    bathrooms: WeightedIndex<f64>,
    parking: WeightedIndex<f64>,
    price: Normal<f64>,
    price_noise: Normal<f64>,
    square_footage: Normal<f64>,
}

impl<'a> RecordGenerator<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            neighborhoods: weighted_index(
                "neighborhoods",
                config.neighborhoods.iter().map(|n| n.weight),
            )?,
            property_types: weighted_index(
                "property_types",
                config.property_types.iter().map(|p| p.weight),
            )?,
            bedrooms: weighted_index("bedrooms", config.bedrooms.iter().map(|b| b.weight))?,
            bathrooms: weighted_index("bathrooms", config.bathrooms.iter().map(|b| b.weight))?,
            parking: weighted_index(
                "parking_spaces",
                config.parking_spaces.iter().map(|p| p.weight),
            )?,
            price: normal("price", config.price.mean, config.price.std_dev)?,
            price_noise: normal("price noise", 0.0, config.price.noise_std_dev)?,
            square_footage: normal(
                "square_footage",
                config.square_footage.mean,
                config.square_footage.std_dev,
            )?,
        })
    }

    pub fn generate(&self, count: usize, seed: u64) -> AnalyticsResult<Vec<PropertyRecord>> {
        if count == 0 {
            return Err(AnalyticsError::configuration(
                "record count must be greater than zero",
            ));
        }
        let range = self.config.date_range;
        if range.start > range.end {
            return Err(AnalyticsError::configuration(format!(
                "date range start {} is after end {}",
                range.start, range.end
            )));
        }
        debug!(
            "Generating {count} record(s) between {} and {} with seed {seed}",
            range.start, range.end
        );

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut records = Vec::with_capacity(count);
        for idx in 0..count {
            records.push(self.draw(&mut rng, idx as u64 + 1)?);
        }

        self.apply_size_premium(&mut records, &mut rng);
        for record in &mut records {
            record.recompute_derived();
        }
        info!("Generated {} record(s) with seed {seed}", records.len());
        Ok(records)
    }

    fn draw(&self, rng: &mut ChaCha8Rng, id: u64) -> AnalyticsResult<PropertyRecord> {
        let config = self.config;
        let neighborhood = &config.neighborhoods[self.neighborhoods.sample(rng)];
        let property_type = &config.property_types[self.property_types.sample(rng)];

        let offset = rng.gen_range(0..config.date_range.span_days()) as u64;
        let sale_date = config
            .date_range
            .start
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| {
                AnalyticsError::configuration("date range exceeds the supported calendar")
            })?;

        let base_price = self.price.sample(rng) * neighborhood.price_multiplier;
        let price = base_price.max(config.price.min);

        let square_footage =
            (self.square_footage.sample(rng).round() as i64).max(config.square_footage.min);
        let bedrooms = pick(&config.bedrooms, &self.bedrooms, rng);
        let bathrooms = pick(&config.bathrooms, &self.bathrooms, rng);
        let age_years = rng.gen_range(config.age_years.min..=config.age_years.max);
        let parking_spaces = pick(&config.parking_spaces, &self.parking, rng);

        let bbox = &config.bounding_box;
        let latitude = rng.gen_range(bbox.min_latitude..=bbox.max_latitude);
        let longitude = rng.gen_range(bbox.min_longitude..=bbox.max_longitude);

        Ok(PropertyRecord {
            id,
            neighborhood: Some(neighborhood.name.clone()),
            property_type: Some(property_type.name.clone()),
            sale_date,
            price: Some(price),
            square_footage: Some(square_footage),
            bedrooms: Some(bedrooms),
            bathrooms: Some(bathrooms),
            age_years: Some(age_years),
            parking_spaces: Some(parking_spaces),
            latitude,
            longitude,
            price_per_sqft: None,
            year: 0,
            month: 0,
            quarter: 0,
            season: Season::default(),
            age_category: None,
        })
    }

    /// Shifts each price by its distance from the mean size, plus noise.
    fn apply_size_premium(&self, records: &mut [PropertyRecord], rng: &mut ChaCha8Rng) {
        let model = &self.config.price;
        let sizes = records
            .iter()
            .filter_map(|r| r.square_footage)
            .collect::<Vec<_>>();
        if sizes.is_empty() {
            return;
        }
        let mean_size = sizes.iter().sum::<i64>() as f64 / sizes.len() as f64;

        for record in records.iter_mut() {
            let (Some(price), Some(sqft)) = (record.price, record.square_footage) else {
                continue;
            };
            let adjusted = price
                + (sqft as f64 - mean_size) * model.size_premium_per_sqft
                + self.price_noise.sample(rng);
            record.price = Some(adjusted.round().max(model.min).min(model.max));
        }
    }
}

fn pick<T: Copy>(values: &[WeightedValue<T>], index: &WeightedIndex<f64>, rng: &mut ChaCha8Rng) -> T {
    values[index.sample(rng)].value
}

fn weighted_index(
    name: &str,
    weights: impl Iterator<Item = f64>,
) -> AnalyticsResult<WeightedIndex<f64>> {
    WeightedIndex::new(weights.collect::<Vec<_>>()).map_err(|err| {
        AnalyticsError::configuration(format!("{name} distribution is invalid: {err}"))
    })
}

fn normal(name: &str, mean: f64, std_dev: f64) -> AnalyticsResult<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|err| {
        AnalyticsError::configuration(format!("{name} distribution is invalid: {err}"))
    })
}
