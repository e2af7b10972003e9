//! Dashboard selection filters.
//!
//! Every dimension of [`FilterCriteria`] is optional and an unset dimension
//! places no restriction on the records. Set dimensions are combined with
//! logical AND. A record with a missing value in a restricted dimension does
//! not match.

use std::{collections::BTreeSet, fmt::Display};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    record::PropertyRecord,
};

/// Inclusive range where either bound may be left open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy + Display> Bounds<T> {
    /// Returns `None` when both ends are open so the dimension stays unset.
    pub fn new(min: Option<T>, max: Option<T>) -> AnalyticsResult<Option<Self>> {
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return Err(AnalyticsError::configuration(format!(
                "filter range lower bound {lo} exceeds upper bound {hi}"
            )));
        }
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        Ok(Some(Self { min, max }))
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value <= hi)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub neighborhoods: Option<BTreeSet<String>>,
    pub property_types: Option<BTreeSet<String>>,
    pub price: Option<Bounds<f64>>,
    pub sale_date: Option<Bounds<NaiveDate>>,
    pub bedrooms: Option<BTreeSet<u8>>,
    pub square_footage: Option<Bounds<i64>>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    pub fn with_neighborhoods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighborhoods = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_property_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_bedrooms(mut self, counts: impl IntoIterator<Item = u8>) -> Self {
        self.bedrooms = Some(counts.into_iter().collect());
        self
    }

    pub fn with_price(mut self, min: Option<f64>, max: Option<f64>) -> AnalyticsResult<Self> {
        self.price = Bounds::new(min, max)?;
        Ok(self)
    }

    pub fn with_sale_date(
        mut self,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    ) -> AnalyticsResult<Self> {
        self.sale_date = Bounds::new(min, max)?;
        Ok(self)
    }

    pub fn with_square_footage(
        mut self,
        min: Option<i64>,
        max: Option<i64>,
    ) -> AnalyticsResult<Self> {
        self.square_footage = Bounds::new(min, max)?;
        Ok(self)
    }

    pub fn matches(&self, record: &PropertyRecord) -> bool {
        member(&self.neighborhoods, record.neighborhood.as_ref())
            && member(&self.property_types, record.property_type.as_ref())
            && member(&self.bedrooms, record.bedrooms.as_ref())
            && within(&self.price, record.price)
            && within(&self.sale_date, Some(record.sale_date))
            && within(&self.square_footage, record.square_footage)
    }
}

fn member<T: Ord>(allowed: &Option<BTreeSet<T>>, value: Option<&T>) -> bool {
    match allowed {
        None => true,
        Some(set) => value.is_some_and(|v| set.contains(v)),
    }
}

fn within<T: PartialOrd + Copy + Display>(bounds: &Option<Bounds<T>>, value: Option<T>) -> bool {
    match bounds {
        None => true,
        Some(bounds) => value.is_some_and(|v| bounds.contains(v)),
    }
}

pub fn apply_filters(records: &[PropertyRecord], criteria: &FilterCriteria) -> Vec<PropertyRecord> {
    if criteria.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    fn sample() -> Vec<PropertyRecord> {
        let mut rows = vec![
            record(1, "Downtown", 250_000.0, 900),
            record(2, "Downtown", 650_000.0, 2_100),
            record(3, "Lakeview", 900_000.0, 3_000),
            record(4, "Eastgate", 400_000.0, 1_400),
        ];
        rows[1].bedrooms = Some(4);
        rows[2].sale_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        rows[3].property_type = Some("Townhouse".into());
        rows
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = sample();
        assert_eq!(apply_filters(&records, &FilterCriteria::default()), records);
    }

    #[test]
    fn dimensions_are_combined_with_and() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with_neighborhoods(["Downtown", "Lakeview"])
            .with_price(Some(300_000.0), None)
            .unwrap();
        let ids = apply_filters(&records, &criteria)
            .iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 3]);

        let narrower = criteria.with_bedrooms([4]);
        let ids = apply_filters(&records, &narrower)
            .iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn ranges_are_inclusive_and_open_ended() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with_square_footage(Some(900), Some(1_400))
            .unwrap();
        let ids = apply_filters(&records, &criteria)
            .iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 4]);

        let recent = FilterCriteria::default()
            .with_sale_date(NaiveDate::from_ymd_opt(2023, 1, 1), None)
            .unwrap();
        let ids = apply_filters(&records, &recent)
            .iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn missing_values_fail_restricted_dimensions() {
        let mut records = sample();
        records[0].price = None;
        let criteria = FilterCriteria::default()
            .with_price(None, Some(1_000_000.0))
            .unwrap();
        assert_eq!(apply_filters(&records, &criteria).len(), 3);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(Bounds::new(Some(10), Some(1)).is_err());
        assert_eq!(Bounds::<i64>::new(None, None).unwrap(), None);
    }

    #[test]
    fn property_type_filter_matches_exactly() {
        let records = sample();
        let criteria = FilterCriteria::default().with_property_types(["Townhouse"]);
        let matched = apply_filters(&records, &criteria);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 4);
    }
}
