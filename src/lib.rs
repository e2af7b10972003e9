pub mod aggregate;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod generator;
pub mod insights;
pub mod io_utils;
pub mod record;
pub mod stats;
pub mod table;
pub mod yaml_io;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    aggregate::Aggregator,
    cleaner::Cleaner,
    cli::{Cli, Commands, FilterArgs, OutputFormat, SourceArgs},
    config::AnalyticsConfig,
    filter::FilterCriteria,
    record::PropertyRecord,
};

pub use crate::{
    aggregate::{AggregateRow, GroupBy, GroupKey, TimePeriod, TrendRow, aggregate, aggregate_by_time},
    error::{AnalyticsError, AnalyticsResult, ValidationFailure},
    filter::apply_filters,
    generator::generate,
    insights::{Insights, extract_insights},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("housing_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => handle_generate(&args),
        Commands::Aggregate(args) => handle_aggregate(&args),
        Commands::Timeline(args) => handle_timeline(&args),
        Commands::Trend(args) => handle_trend(&args),
        Commands::Insights(args) => handle_insights(&args),
        Commands::Correlations(args) => handle_correlations(&args),
        Commands::Dashboard(args) => handle_dashboard(&args),
        Commands::Config(args) => AnalyticsConfig::default()
            .save(args.output.as_deref())
            .context("Writing default configuration"),
    }
}

/// Records selected for analysis, with the configuration that produced them.
pub struct Selection {
    pub config: AnalyticsConfig,
    pub records: Vec<PropertyRecord>,
}

pub fn filter_criteria(args: &FilterArgs) -> Result<FilterCriteria> {
    let mut criteria = FilterCriteria::default()
        .with_price(args.min_price, args.max_price)?
        .with_sale_date(args.from, args.to)?
        .with_square_footage(args.min_sqft, args.max_sqft)?;
    if !args.neighborhoods.is_empty() {
        criteria = criteria.with_neighborhoods(args.neighborhoods.iter().map(|n| n.trim()));
    }
    if !args.property_types.is_empty() {
        criteria = criteria.with_property_types(args.property_types.iter().map(|p| p.trim()));
    }
    if !args.bedrooms.is_empty() {
        criteria = criteria.with_bedrooms(args.bedrooms.iter().copied());
    }
    Ok(criteria)
}

/// Loads or generates records, cleans them unless `raw`, then applies filters.
pub fn load_selection(source: &SourceArgs, raw: bool) -> Result<Selection> {
    let config = AnalyticsConfig::load_or_default(source.config.as_deref())?;
    let records = match &source.input {
        Some(path) => {
            info!("Importing records from '{}'", path.display());
            io_utils::read_records_from_path(path, source.delimiter)?
        }
        None => {
            let count = source.count.unwrap_or(config.sample_size);
            let seed = source.seed.unwrap_or(config.seed);
            generator::generate(&config, count, seed)
                .with_context(|| format!("Generating {count} record(s) with seed {seed}"))?
        }
    };
    let records = if raw {
        records
    } else {
        Cleaner::new(&config).clean(&records)
    };

    let criteria = filter_criteria(&source.filters)?;
    debug!("Filter criteria: {:?}", criteria);
    let selected = filter::apply_filters(&records, &criteria);
    if !criteria.is_empty() {
        info!(
            "Filters selected {} of {} record(s)",
            selected.len(),
            records.len()
        );
    }
    Ok(Selection {
        config,
        records: selected,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Serializing JSON output")?;
    writeln!(stdout)?;
    Ok(())
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl FnOnce() -> (Vec<String>, Vec<Vec<String>>),
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            let (headers, rows) = render();
            table::print_table(&headers, &rows);
            Ok(())
        }
    }
}

fn handle_generate(args: &cli::GenerateArgs) -> Result<()> {
    let selection = load_selection(&args.source, args.raw)?;
    io_utils::export_records(
        args.output.as_deref(),
        args.output_delimiter,
        &selection.records,
    )?;
    info!(
        "Exported {} record(s) to {}",
        selection.records.len(),
        args.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(())
}

fn handle_aggregate(args: &cli::AggregateArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let rows = Aggregator::from_config(&selection.config).aggregate(&selection.records, args.by);
    info!("Computed {} {:?} group(s)", rows.len(), args.by);
    emit(args.format, &rows, || table::aggregate_table(args.by, &rows))
}

fn handle_timeline(args: &cli::TimelineArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let rows = Aggregator::from_config(&selection.config)
        .aggregate_by_time(&selection.records, args.period);
    info!("Computed {} {:?} bucket(s)", rows.len(), args.period);
    emit(args.format, &rows, || table::timeline_table(args.period, &rows))
}

fn handle_trend(args: &cli::TrendArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let window = args
        .window
        .unwrap_or(selection.config.analysis.rolling_window);
    let rows = Aggregator::from_config(&selection.config).trend(
        &selection.records,
        args.period,
        window,
    )?;
    info!(
        "Computed {} trend row(s) with a {window}-period rolling average",
        rows.len()
    );
    emit(args.format, &rows, || table::trend_table(args.period, &rows))
}

fn handle_insights(args: &cli::InsightsArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let insights = extract_insights(&selection.records, &selection.config)
        .context("Extracting insights")?;
    emit(args.format, &insights, || table::insights_table(&insights))
}

fn handle_correlations(args: &cli::CorrelationsArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let matrix = stats::correlation_matrix(&selection.records);
    emit(args.format, &matrix, || table::correlation_table(&matrix))
}

fn handle_dashboard(args: &cli::DashboardArgs) -> Result<()> {
    let selection = load_selection(&args.source, false)?;
    let view = dashboard::build_dashboard(&selection.records, &selection.config, args.period)?;
    match args.format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Table => {
            if let Some(insights) = &view.insights {
                let (headers, rows) = table::insights_table(insights);
                table::print_table(&headers, &rows);
                println!();
            }
            for (group_by, rows) in [
                (GroupBy::Neighborhood, &view.by_neighborhood),
                (GroupBy::PropertyType, &view.by_property_type),
                (GroupBy::Year, &view.by_year),
                (GroupBy::Segment, &view.segments),
            ] {
                let (headers, body) = table::aggregate_table(group_by, rows);
                table::print_table(&headers, &body);
                println!();
            }
            let (headers, body) = table::trend_table(args.period, &view.trend);
            table::print_table(&headers, &body);
            Ok(())
        }
    }
}
