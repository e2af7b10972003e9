use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::aggregate::{GroupBy, TimePeriod};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate and analyze synthetic housing market data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate, clean, and filter records, then export them as CSV
    Generate(GenerateArgs),
    /// Summarize records grouped by neighborhood, property type, year, or segment
    Aggregate(AggregateArgs),
    /// Summarize records per day, month, quarter, or year of sale
    Timeline(TimelineArgs),
    /// Show period-over-period price changes with a rolling average
    Trend(TrendArgs),
    /// Derive headline insights from the selected records
    Insights(InsightsArgs),
    /// Show pairwise correlations between numeric fields
    Correlations(CorrelationsArgs),
    /// Compute every dashboard view for the selected records
    Dashboard(DashboardArgs),
    /// Write the default configuration as YAML
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Where the records come from and how they are selected.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// YAML configuration overriding catalogs, distributions, and thresholds
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Import records from a CSV file instead of generating them ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Number of records to generate (defaults to the configured sample size)
    #[arg(short = 'n', long = "count")]
    pub count: Option<usize>,
    /// Random seed for generation (defaults to the configured seed)
    #[arg(long)]
    pub seed: Option<u64>,
    /// CSV delimiter for --input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Keep only these neighborhoods (repeatable or comma-separated)
    #[arg(long = "neighborhood", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub neighborhoods: Vec<String>,
    /// Keep only these property types (repeatable or comma-separated)
    #[arg(long = "property-type", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub property_types: Vec<String>,
    /// Minimum sale price (inclusive)
    #[arg(long = "min-price")]
    pub min_price: Option<f64>,
    /// Maximum sale price (inclusive)
    #[arg(long = "max-price")]
    pub max_price: Option<f64>,
    /// Earliest sale date (inclusive, YYYY-MM-DD)
    #[arg(long = "from", value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    /// Latest sale date (inclusive, YYYY-MM-DD)
    #[arg(long = "to", value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Keep only these bedroom counts (repeatable or comma-separated)
    #[arg(long = "bedrooms", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub bedrooms: Vec<u8>,
    /// Minimum square footage (inclusive)
    #[arg(long = "min-sqft")]
    pub min_sqft: Option<i64>,
    /// Maximum square footage (inclusive)
    #[arg(long = "max-sqft")]
    pub max_sqft: Option<i64>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults from the output extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Skip the cleaning pass and export records exactly as generated or imported
    #[arg(long = "raw")]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Grouping dimension
    #[arg(long = "by", value_enum, default_value = "neighborhood")]
    pub by: GroupBy,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Bucket size
    #[arg(long, value_enum, default_value = "month")]
    pub period: TimePeriod,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TrendArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Bucket size
    #[arg(long, value_enum, default_value = "month")]
    pub period: TimePeriod,
    /// Rolling window length in periods (defaults to the configured window)
    #[arg(long)]
    pub window: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CorrelationsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Bucket size for the timeline and trend views
    #[arg(long, value_enum, default_value = "month")]
    pub period: TimePeriod,
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Invalid date '{value}' (expected YYYY-MM-DD): {err}"))
}
