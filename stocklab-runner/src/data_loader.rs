//! Data loading: annotated bar series from CSV.
//!
//! Expected header (case of the first letter is free, extra columns are ignored):
//!
//! ```text
//! timestamp,Open,High,Low,Close,Volume,Signal,Execute,Quantity
//! ```
//!
//! `Date`, `Datetime` and `Timestamp` are accepted for the time column.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use stocklab_core::domain::{Action, AnnotatedBar, Bar, Directive};

use crate::sizing::QuantityMode;

/// Errors from loading annotated bars.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open bar file: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: unknown signal '{value}'")]
    UnknownSignal { row: usize, value: String },

    #[error("row {row}: unparseable execute price '{value}'")]
    BadExecutePrice { row: usize, value: String },

    #[error("row {row}: timestamp {timestamp} does not follow the previous row")]
    NonIncreasing { row: usize, timestamp: NaiveDateTime },

    #[error("bar file contains no rows")]
    Empty,
}

/// One parsed row before sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub bar: Bar,
    pub action: Action,
    pub execute_price: Option<f64>,
    /// Trade size in the unit chosen by [`QuantityMode`].
    pub quantity: f64,
}

/// Loaded series plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub rows: Vec<RawRow>,
    /// Dataset hash for fingerprinting (BLAKE3 over all row data).
    pub dataset_hash: String,
    /// Rows failing the OHLC sanity check. They are kept, not dropped.
    pub insane_bars: usize,
}

impl LoadedData {
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let dataset_hash = compute_dataset_hash(&rows);
        let insane_bars = rows.iter().filter(|r| !r.bar.is_sane()).count();
        Self {
            rows,
            dataset_hash,
            insane_bars,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve every row's quantity into a dollar notional.
    pub fn annotate(&self, mode: QuantityMode, initial_capital: f64) -> Vec<AnnotatedBar> {
        self.rows
            .iter()
            .map(|row| {
                let notional = match row.action {
                    Action::Buy | Action::Sell => {
                        mode.to_notional(row.quantity, row.execute_price, initial_capital)
                    }
                    _ => 0.0,
                };
                let directive = Directive {
                    action: row.action,
                    execute_price: row.execute_price,
                    notional,
                };
                AnnotatedBar::new(row.bar.clone(), directive)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Timestamp",
        alias = "date",
        alias = "Date",
        alias = "datetime",
        alias = "Datetime"
    )]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
    #[serde(alias = "Signal", default)]
    signal: String,
    #[serde(alias = "Execute", default)]
    execute: String,
    #[serde(alias = "Quantity", default)]
    quantity: Option<f64>,
}

/// Load an annotated series from a CSV file.
pub fn load_annotated_csv(path: &Path) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path)?;
    let data = load_annotated_reader(file)?;
    log::info!(
        "loaded {} bars from {} (dataset {})",
        data.len(),
        path.display(),
        &data.dataset_hash[..12]
    );
    Ok(data)
}

/// Load an annotated series from any CSV source.
pub fn load_annotated_reader<R: Read>(reader: R) -> Result<LoadedData, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<RawRow> = Vec::new();
    for (idx, record) in csv_reader.deserialize::<CsvRecord>().enumerate() {
        let row = idx + 1;
        let record = record?;
        let parsed = parse_record(row, record)?;
        if let Some(prev) = rows.last() {
            if parsed.bar.timestamp <= prev.bar.timestamp {
                return Err(LoadError::NonIncreasing {
                    row,
                    timestamp: parsed.bar.timestamp,
                });
            }
        }
        rows.push(parsed);
    }

    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    let data = LoadedData::from_rows(rows);
    if data.insane_bars > 0 {
        log::warn!(
            "{} of {} bars fail the OHLC sanity check",
            data.insane_bars,
            data.len()
        );
    }
    Ok(data)
}

fn parse_record(row: usize, record: CsvRecord) -> Result<RawRow, LoadError> {
    let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::BadTimestamp {
        row,
        value: record.timestamp.clone(),
    })?;
    let action: Action = record
        .signal
        .parse()
        .map_err(|_| LoadError::UnknownSignal {
            row,
            value: record.signal.clone(),
        })?;
    let execute_price = parse_execute(&record.execute).ok_or_else(|| LoadError::BadExecutePrice {
        row,
        value: record.execute.clone(),
    })?;

    Ok(RawRow {
        bar: Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.unwrap_or(0.0),
        },
        action,
        execute_price,
        quantity: record.quantity.unwrap_or(0.0),
    })
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse the supported timestamp layouts. Offsets are normalized to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `Some(None)` for an absent price, `None` if the text is not a number.
fn parse_execute(s: &str) -> Option<Option<f64>> {
    match s.to_ascii_lowercase().as_str() {
        "" | "none" | "null" | "nan" => Some(None),
        _ => s.parse::<f64>().ok().map(Some),
    }
}

/// Compute a deterministic hash over the full series.
///
/// Covers timestamps, OHLCV values and the directive columns in row order.
fn compute_dataset_hash(rows: &[RawRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        let bar = &row.bar;
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
        hasher.update(row.action.as_str().as_bytes());
        hasher.update(&row.execute_price.unwrap_or(f64::NAN).to_le_bytes());
        hasher.update(&row.quantity.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
