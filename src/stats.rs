//! Descriptive statistics shared by the aggregator and insight extractor.

use serde::Serialize;

use crate::record::PropertyRecord;

/// Running summary over the non-missing values of one metric.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    values: Vec<f64>,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: Option<f64>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    pub fn median(&self) -> Option<f64> {
        median(&self.values)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Pearson correlation over complete pairs; `None` when fewer than two pairs
/// exist or either side has zero variance.
pub fn pearson(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let pairs = pairs
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Trailing mean over the current and previous `window - 1` entries.
///
/// The window shrinks at the start of the series instead of producing gaps.
pub fn rolling_average(values: &[f64], window: usize) -> Vec<f64> {
    let sparse = values.iter().copied().map(Some).collect::<Vec<_>>();
    rolling_average_sparse(&sparse, window)
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

/// Like [`rolling_average`], skipping missing entries inside each window.
pub fn rolling_average_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|idx| {
            let start = (idx + 1).saturating_sub(window);
            mean(values[start..=idx].iter().flatten().copied())
        })
        .collect()
}

/// Numeric fields available to [`correlation_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Price,
    SquareFootage,
    Bedrooms,
    Bathrooms,
    AgeYears,
    ParkingSpaces,
}

impl NumericField {
    pub const ALL: [NumericField; 6] = [
        NumericField::Price,
        NumericField::SquareFootage,
        NumericField::Bedrooms,
        NumericField::Bathrooms,
        NumericField::AgeYears,
        NumericField::ParkingSpaces,
    ];

    pub fn value(&self, record: &PropertyRecord) -> Option<f64> {
        match self {
            NumericField::Price => record.price,
            NumericField::SquareFootage => record.square_footage.map(|v| v as f64),
            NumericField::Bedrooms => record.bedrooms.map(f64::from),
            NumericField::Bathrooms => record.bathrooms,
            NumericField::AgeYears => record.age_years.map(f64::from),
            NumericField::ParkingSpaces => record.parking_spaces.map(f64::from),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::Price => "price",
            NumericField::SquareFootage => "square_footage",
            NumericField::Bedrooms => "bedrooms",
            NumericField::Bathrooms => "bathrooms",
            NumericField::AgeYears => "age_years",
            NumericField::ParkingSpaces => "parking_spaces",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<NumericField>,
    /// Row-major; `values[i][j]` correlates `fields[i]` with `fields[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericField, b: NumericField) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }
}

pub fn correlation_between(records: &[PropertyRecord], a: NumericField, b: NumericField) -> Option<f64> {
    pearson(
        records
            .iter()
            .filter_map(|r| Some((a.value(r)?, b.value(r)?))),
    )
}

/// Pairwise-complete correlations between every numeric field.
pub fn correlation_matrix(records: &[PropertyRecord]) -> CorrelationMatrix {
    let fields = NumericField::ALL.to_vec();
    let values = fields
        .iter()
        .map(|a| {
            fields
                .iter()
                .map(|b| correlation_between(records, *a, *b))
                .collect()
        })
        .collect();
    CorrelationMatrix { fields, values }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub fn format_metric(metric: Option<f64>) -> String {
    metric
        .filter(|v| v.is_finite())
        .map(format_number)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_ignores_missing_values() {
        let mut acc = MetricAccumulator::new();
        for value in [Some(3.0), None, Some(1.0), Some(f64::NAN), Some(2.0)] {
            acc.add(value);
        }
        assert_eq!(acc.count(), 3);
        assert_eq!(acc.sum(), 6.0);
        assert_eq!(acc.mean(), Some(2.0));
        assert_eq!(acc.median(), Some(2.0));
        assert_eq!(acc.min(), Some(1.0));
        assert_eq!(acc.max(), Some(3.0));
    }

    #[test]
    fn empty_accumulator_is_undefined() {
        let acc = MetricAccumulator::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.median(), None);
        assert_eq!(acc.min(), None);
    }

    #[test]
    fn median_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn rolling_average_shrinks_window_at_start() {
        let rolled = rolling_average(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(rolled, vec![1.0, 1.5, 2.0, 3.0]);
        assert_eq!(rolling_average(&[7.5], 6), vec![7.5]);
        assert!(rolling_average(&[], 3).is_empty());
    }

    #[test]
    fn sparse_rolling_average_skips_gaps() {
        let rolled = rolling_average_sparse(&[Some(2.0), None, Some(4.0)], 2);
        assert_eq!(rolled, vec![Some(2.0), Some(2.0), Some(4.0)]);
        assert_eq!(rolling_average_sparse(&[None], 3), vec![None]);
    }

    #[test]
    fn pearson_detects_linear_relationships() {
        let up = pearson([(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
        assert!((up - 1.0).abs() < 1e-12);
        let down = pearson([(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]).unwrap();
        assert!((down + 1.0).abs() < 1e-12);
        assert_eq!(pearson([(1.0, 1.0), (1.0, 2.0)]), None);
        assert_eq!(pearson([(1.0, 1.0)]), None);
    }

    #[test]
    fn format_metric_renders_blank_for_missing() {
        assert_eq!(format_metric(None), "");
        assert_eq!(format_metric(Some(f64::NAN)), "");
        assert_eq!(format_metric(Some(12.0)), "12");
        assert_eq!(format_metric(Some(12.345)), "12.35");
    }
}
