//! JSON / CSV loading for candidates, bookmaker quotes and historical records

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::models::{Candidate, HistoricalRecord, MarketQuote};

/// On-disk format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(DataFormat::Json),
            Some("csv") => Ok(DataFormat::Csv),
            _ => bail!(
                "Unsupported file type: {} (expected .json or .csv)",
                path.display()
            ),
        }
    }
}

fn read_records<T, R>(reader: R, format: DataFormat, what: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    match format {
        DataFormat::Json => serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse {} JSON", what)),
        DataFormat::Csv => {
            let mut reader = ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader);

            let mut records = Vec::new();
            for (i, result) in reader.deserialize().enumerate() {
                // Row 1 is the header
                let record: T = result
                    .with_context(|| format!("Failed to deserialize {} row {}", what, i + 2))?;
                records.push(record);
            }
            Ok(records)
        }
    }
}

fn open(path: &Path) -> Result<(BufReader<File>, DataFormat)> {
    let format = DataFormat::from_path(path)?;
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok((BufReader::new(file), format))
}

/// Read candidates; malformed numeric fields become 0.0 instead of failing
pub fn read_candidates<R: Read>(reader: R, format: DataFormat) -> Result<Vec<Candidate>> {
    read_records(reader, format, "candidate")
}

pub fn read_quotes<R: Read>(reader: R, format: DataFormat) -> Result<Vec<MarketQuote>> {
    read_records(reader, format, "quote")
}

/// Read and validate historical records
pub fn read_historical_records<R: Read>(
    reader: R,
    format: DataFormat,
) -> Result<Vec<HistoricalRecord>> {
    let records: Vec<HistoricalRecord> = read_records(reader, format, "historical record")?;
    for (i, record) in records.iter().enumerate() {
        record
            .validate()
            .with_context(|| format!("Invalid historical record #{}", i + 1))?;
    }
    Ok(records)
}

pub fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>> {
    let (reader, format) = open(path.as_ref())?;
    let candidates = read_candidates(reader, format)?;
    info!(path = %path.as_ref().display(), count = candidates.len(), "Loaded candidates");
    Ok(candidates)
}

pub fn load_quotes<P: AsRef<Path>>(path: P) -> Result<Vec<MarketQuote>> {
    let (reader, format) = open(path.as_ref())?;
    let quotes = read_quotes(reader, format)?;
    info!(path = %path.as_ref().display(), count = quotes.len(), "Loaded quotes");
    Ok(quotes)
}

pub fn load_historical_records<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalRecord>> {
    let (reader, format) = open(path.as_ref())?;
    let records = read_historical_records(reader, format)?;
    info!(path = %path.as_ref().display(), count = records.len(), "Loaded historical records");
    Ok(records)
}
