//! CSV import/export of property records.
//!
//! - **Delimiter resolution**: `.tsv` paths use tab, everything else comma,
//!   unless a delimiter is given explicitly.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.
//! - **Quoting**: output uses `QuoteStyle::Always` so re-imported files parse
//!   identically.
//! - **Import**: derived columns are optional in imported files; records are
//!   expected to pass through the cleaner, which rebuilds them. Unparseable
//!   numeric cells read as missing values. A row whose id, date, or
//!   coordinates cannot be read is skipped and counted; it never fails the
//!   import.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use log::{debug, warn};

use crate::record::PropertyRecord;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    match path.and_then(|p| p.extension()).and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn open_csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .trim(csv::Trim::Fields)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(writer))
}

/// Records read from one CSV source plus the data rows that were skipped.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub records: Vec<PropertyRecord>,
    /// 1-based line numbers of skipped rows.
    pub skipped_lines: Vec<u64>,
}

pub fn read_records<R: Read>(reader: &mut csv::Reader<R>) -> Result<ImportOutcome> {
    let headers = reader.headers().context("Reading CSV headers")?.clone();
    let mut outcome = ImportOutcome::default();
    for (idx, row) in reader.records().enumerate() {
        let line = idx as u64 + 2;
        match row.and_then(|row| row.deserialize::<PropertyRecord>(Some(&headers))) {
            Ok(record) => outcome.records.push(record),
            Err(err) if err.is_io_error() => {
                return Err(err).with_context(|| format!("Reading row {line}"));
            }
            Err(err) => {
                let line = err.position().map_or(line, |pos| pos.line());
                debug!("Skipping unreadable row on line {line}: {err}");
                outcome.skipped_lines.push(line);
            }
        }
    }
    Ok(outcome)
}

pub fn read_records_from_path(path: &Path, delimiter: Option<u8>) -> Result<Vec<PropertyRecord>> {
    let delimiter = resolve_delimiter(Some(path), delimiter);
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let outcome =
        read_records(&mut reader).with_context(|| format!("Importing records from {path:?}"))?;
    if !outcome.skipped_lines.is_empty() {
        warn!(
            "Skipped {} unreadable row(s) in {path:?}",
            outcome.skipped_lines.len()
        );
    }
    debug!("Imported {} record(s) from {path:?}", outcome.records.len());
    Ok(outcome.records)
}

/// Writes records with a header row in declared field order.
pub fn write_records<W: Write>(writer: &mut csv::Writer<W>, records: &[PropertyRecord]) -> Result<()> {
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Writing record {}", record.id))?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

pub fn export_records(
    path: Option<&Path>,
    delimiter: Option<u8>,
    records: &[PropertyRecord],
) -> Result<()> {
    let delimiter = resolve_delimiter(path, delimiter);
    let mut writer = open_csv_writer(path, delimiter)?;
    write_records(&mut writer, records)
}
