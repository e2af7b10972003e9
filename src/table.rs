//! Plain-text tables for terminal output.
//!
//! Columns are padded to their widest cell; numeric-looking cells are
//! right-aligned so prices line up.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    aggregate::{AggregateRow, GroupBy, TimePeriod, TrendRow},
    insights::Insights,
    stats::{CorrelationMatrix, format_metric},
};

const METRIC_HEADERS: [&str; 11] = [
    "count",
    "avg_price",
    "median_price",
    "min_price",
    "max_price",
    "total_price",
    "avg_sqft",
    "avg_price_per_sqft",
    "avg_bedrooms",
    "avg_bathrooms",
    "avg_age_years",
];

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, false));
    let separator = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, false));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, true));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], align_numbers: bool) -> String {
    values
        .iter()
        .zip(widths.iter().copied())
        .map(|(value, width)| {
            let cell = value.replace(['\n', '\r', '\t'], " ");
            if align_numbers && looks_numeric(&cell) {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .join("  ")
        .trim_end()
        .to_string()
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

fn metric_cells(row: &AggregateRow) -> Vec<String> {
    vec![
        row.count.to_string(),
        format_metric(row.avg_price),
        format_metric(row.median_price),
        format_metric(row.min_price),
        format_metric(row.max_price),
        format_metric(Some(row.total_price)),
        format_metric(row.avg_square_footage),
        format_metric(row.avg_price_per_sqft),
        format_metric(row.avg_bedrooms),
        format_metric(row.avg_bathrooms),
        format_metric(row.avg_age_years),
    ]
}

pub fn aggregate_table(group_by: GroupBy, rows: &[AggregateRow]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = group_by
        .key_headers()
        .iter()
        .chain(METRIC_HEADERS.iter())
        .map(|h| h.to_string())
        .collect();
    let body = rows
        .iter()
        .map(|row| {
            let mut cells = row.key.labels();
            cells.extend(metric_cells(row));
            cells
        })
        .collect();
    (headers, body)
}

pub fn timeline_table(period: TimePeriod, rows: &[AggregateRow]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = std::iter::once("period")
        .chain(METRIC_HEADERS.iter().copied())
        .map(str::to_string)
        .collect();
    let body = rows
        .iter()
        .map(|row| {
            let label = match &row.key {
                crate::aggregate::GroupKey::Period(start) => period.label(*start),
                other => other.to_string(),
            };
            let mut cells = vec![label];
            cells.extend(metric_cells(row));
            cells
        })
        .collect();
    (headers, body)
}

pub fn trend_table(period: TimePeriod, rows: &[TrendRow]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = [
        "period",
        "count",
        "avg_price",
        "price_change",
        "price_change_pct",
        "rolling_avg_price",
        "total_price",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                period.label(row.period),
                row.count.to_string(),
                format_metric(row.avg_price),
                format_metric(row.price_change),
                row.price_change_pct
                    .map(|pct| format!("{pct:.2}"))
                    .unwrap_or_default(),
                format_metric(row.rolling_avg_price),
                format_metric(Some(row.total_price)),
            ]
        })
        .collect();
    (headers, body)
}

pub fn insights_table(insights: &Insights) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec!["insight".to_string(), "value".to_string()];
    let body = insights
        .entries()
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect();
    (headers, body)
}

pub fn correlation_table(matrix: &CorrelationMatrix) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = std::iter::once("field".to_string())
        .chain(matrix.fields.iter().map(|f| f.as_str().to_string()))
        .collect();
    let body = matrix
        .fields
        .iter()
        .zip(&matrix.values)
        .map(|(field, values)| {
            std::iter::once(field.as_str().to_string())
                .chain(
                    values
                        .iter()
                        .map(|v| v.map(|c| format!("{c:.3}")).unwrap_or_default()),
                )
                .collect()
        })
        .collect();
    (headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_columns_and_right_aligns_numbers() {
        let headers = vec!["name".to_string(), "price".to_string()];
        let rows = vec![
            vec!["Downtown".to_string(), "5".to_string()],
            vec!["Oak Park".to_string(), "12345".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "name      price");
        assert_eq!(lines[1], "--------  -----");
        assert_eq!(lines[2], "Downtown      5");
        assert_eq!(lines[3], "Oak Park  12345");
    }

    #[test]
    fn control_characters_are_flattened() {
        let headers = vec!["note".to_string()];
        let rows = vec![vec!["a\tb\nc".to_string()]];
        let rendered = render_table(&headers, &rows);
        assert!(rendered.contains("a b c"));
    }
}
