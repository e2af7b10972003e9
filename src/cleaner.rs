//! Record validation and normalization.
//!
//! The cleaner never mutates its input. Records that fail a rule are logged
//! and dropped individually; the batch always completes. Ids are unique in
//! the output: the first valid record with a given id is kept.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    config::{AnalyticsConfig, CleaningBounds, DateRange},
    error::{AnalyticsError, ValidationFailure},
    record::PropertyRecord,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input: usize,
    pub kept: usize,
    /// Rejections keyed by [`ValidationFailure::label`].
    pub dropped: BTreeMap<&'static str, usize>,
}

impl CleaningReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

pub struct Cleaner<'a> {
    bounds: CleaningBounds,
    date_range: DateRange,
    catalog: Vec<&'a str>,
}

impl<'a> Cleaner<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self {
            bounds: config.cleaning,
            date_range: config.date_range,
            catalog: config.neighborhood_names(),
        }
    }

    pub fn clean(&self, records: &[PropertyRecord]) -> Vec<PropertyRecord> {
        self.clean_with_report(records).0
    }

    pub fn clean_with_report(
        &self,
        records: &[PropertyRecord],
    ) -> (Vec<PropertyRecord>, CleaningReport) {
        let mut report = CleaningReport {
            input: records.len(),
            ..CleaningReport::default()
        };
        let mut cleaned = Vec::with_capacity(records.len());
        let mut seen_ids = HashSet::with_capacity(records.len());
        for record in records {
            let normalized = normalize(record);
            let verdict = self.validate(&normalized).and_then(|()| {
                if seen_ids.insert(normalized.id) {
                    Ok(())
                } else {
                    Err(AnalyticsError::Validation {
                        id: normalized.id,
                        failure: ValidationFailure::DuplicateId,
                    })
                }
            });
            match verdict {
                Ok(()) => cleaned.push(normalized),
                Err(AnalyticsError::Validation { id, failure }) => {
                    debug!("Dropping record {id}: {failure}");
                    *report.dropped.entry(failure.label()).or_insert(0) += 1;
                }
                Err(other) => {
                    debug!("Dropping record {}: {other}", record.id);
                    *report.dropped.entry("other").or_insert(0) += 1;
                }
            }
        }
        report.kept = cleaned.len();
        if report.kept == 0 && report.input > 0 {
            warn!("Cleaning rejected all {} record(s)", report.input);
        } else {
            info!(
                "Cleaning kept {} of {} record(s)",
                report.kept, report.input
            );
        }
        (cleaned, report)
    }

    /// Checks one normalized record against every rule.
    pub fn validate(&self, record: &PropertyRecord) -> Result<(), AnalyticsError> {
        let fail = |failure| AnalyticsError::Validation {
            id: record.id,
            failure,
        };
        let price = record.price.ok_or_else(|| fail(ValidationFailure::MissingPrice))?;
        let sqft = record
            .square_footage
            .ok_or_else(|| fail(ValidationFailure::MissingSquareFootage))?;
        let neighborhood = record
            .neighborhood
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| fail(ValidationFailure::MissingNeighborhood))?;

        let bounds = &self.bounds;
        if !(price >= bounds.min_price && price <= bounds.max_price) {
            return Err(fail(ValidationFailure::PriceOutOfRange(price)));
        }
        if sqft < bounds.min_square_footage || sqft > bounds.max_square_footage {
            return Err(fail(ValidationFailure::SquareFootageOutOfRange(sqft)));
        }
        if !self.catalog.contains(&neighborhood) {
            return Err(fail(ValidationFailure::UnknownNeighborhood(
                neighborhood.to_string(),
            )));
        }
        if !self.date_range.contains(record.sale_date) {
            return Err(fail(ValidationFailure::SaleDateOutOfRange(record.sale_date)));
        }
        Ok(())
    }
}

fn normalize(record: &PropertyRecord) -> PropertyRecord {
    let mut normalized = record.clone();
    normalized.neighborhood = trimmed(&record.neighborhood);
    normalized.property_type = trimmed(&record.property_type);
    normalized.price = record.price.filter(|p| p.is_finite()).map(f64::round);
    normalized.bathrooms = record
        .bathrooms
        .filter(|b| b.is_finite())
        .map(|b| (b * 2.0).round() / 2.0);
    normalized.recompute_derived();
    normalized
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
