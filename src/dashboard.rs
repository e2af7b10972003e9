//! Every view of the dashboard for one filtered selection.
//!
//! The views are independent pure functions over the same borrowed record
//! set, so they are computed concurrently with `rayon::join` and collected
//! into a single [`Dashboard`] value.

use log::{debug, info};
use serde::Serialize;

use crate::{
    aggregate::{AggregateRow, Aggregator, GroupBy, TimePeriod, TrendRow},
    config::AnalyticsConfig,
    error::{AnalyticsError, AnalyticsResult},
    insights::{Insights, extract_insights},
    record::PropertyRecord,
    stats::{CorrelationMatrix, correlation_matrix},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub record_count: usize,
    /// `None` when the selection is empty.
    pub insights: Option<Insights>,
    pub by_neighborhood: Vec<AggregateRow>,
    pub by_property_type: Vec<AggregateRow>,
    pub by_year: Vec<AggregateRow>,
    pub segments: Vec<AggregateRow>,
    pub timeline: Vec<AggregateRow>,
    pub trend: Vec<TrendRow>,
    pub correlations: CorrelationMatrix,
}

pub fn build_dashboard(
    records: &[PropertyRecord],
    config: &AnalyticsConfig,
    period: TimePeriod,
) -> AnalyticsResult<Dashboard> {
    let aggregator = Aggregator::from_config(config);
    let window = config.analysis.rolling_window;
    debug!(
        "Building dashboard for {} record(s), {period:?} buckets, window {window}",
        records.len()
    );

    let ((insights, correlations), ((by_neighborhood, by_property_type), (by_year, segments))) =
        rayon::join(
            || {
                rayon::join(
                    || extract_insights(records, config),
                    || correlation_matrix(records),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || aggregator.aggregate(records, GroupBy::Neighborhood),
                            || aggregator.aggregate(records, GroupBy::PropertyType),
                        )
                    },
                    || {
                        rayon::join(
                            || aggregator.aggregate(records, GroupBy::Year),
                            || aggregator.aggregate(records, GroupBy::Segment),
                        )
                    },
                )
            },
        );
    let (timeline, trend) = rayon::join(
        || aggregator.aggregate_by_time(records, period),
        || aggregator.trend(records, period, window),
    );

    let insights = match insights {
        Ok(insights) => Some(insights),
        Err(AnalyticsError::InsufficientData(reason)) => {
            debug!("Insights unavailable: {reason}");
            None
        }
        Err(other) => return Err(other),
    };

    let dashboard = Dashboard {
        record_count: records.len(),
        insights,
        by_neighborhood,
        by_property_type,
        by_year,
        segments,
        timeline,
        trend: trend?,
        correlations,
    };
    info!(
        "Dashboard ready: {} neighborhood(s), {} segment(s), {} period(s)",
        dashboard.by_neighborhood.len(),
        dashboard.segments.len(),
        dashboard.timeline.len()
    );
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cleaner::Cleaner, generator::generate};

    #[test]
    fn parallel_views_match_direct_calls() {
        let config = AnalyticsConfig::default();
        let records = Cleaner::new(&config).clean(&generate(&config, 800, 11).unwrap());
        let dashboard = build_dashboard(&records, &config, TimePeriod::Quarter).unwrap();
        let aggregator = Aggregator::from_config(&config);

        assert_eq!(dashboard.record_count, records.len());
        assert_eq!(
            dashboard.by_neighborhood,
            aggregator.aggregate(&records, GroupBy::Neighborhood)
        );
        assert_eq!(
            dashboard.segments,
            aggregator.aggregate(&records, GroupBy::Segment)
        );
        assert_eq!(
            dashboard.insights,
            Some(extract_insights(&records, &config).unwrap())
        );
        assert_eq!(dashboard.trend.len() + 1, dashboard.timeline.len());
    }

    #[test]
    fn empty_selection_has_no_insights() {
        let config = AnalyticsConfig::default();
        let dashboard = build_dashboard(&[], &config, TimePeriod::Month).unwrap();
        assert_eq!(dashboard.insights, None);
        assert!(dashboard.by_neighborhood.is_empty());
        assert!(dashboard.trend.is_empty());
    }
}
