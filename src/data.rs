//! Loading price panels from wide CSV files.
//!
//! The expected layout is one date column followed by one column per asset:
//!
//! ```text
//! Date,AAPL,MSFT
//! 2024-01-02,185.64,370.87
//! 2024-01-03,184.25,
//! ```
//!
//! Blank cells and the usual missing-value markers (`NaN`, `null`, `NA`)
//! become missing prices.

use crate::error::{Result, SimulationError};
use crate::panel::PricePanel;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

const MISSING_MARKERS: [&str; 7] = ["", "nan", "null", "na", "n/a", "none", "-"];

/// Data source configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Date format string for parsing (e.g., "%Y-%m-%d").
    pub date_format: Option<String>,
    /// CSV delimiter character. If None, delimiter is auto-detected.
    pub delimiter: Option<u8>,
    /// Skip rows with unparseable dates and blank out unparseable prices
    /// instead of failing.
    pub skip_invalid: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            delimiter: None,
            skip_invalid: true,
        }
    }
}

/// Detect the CSV delimiter by analyzing the first few lines of the file.
///
/// Tries comma, tab, semicolon and pipe and keeps the one that splits every
/// line into the same number (at least two) of fields.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().take(5).filter_map(|l| l.ok()).collect();

    if lines.is_empty() {
        return Ok(b',');
    }

    let delimiters = [b',', b'\t', b';', b'|'];
    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in &delimiters {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.as_bytes().iter().filter(|&&b| b == delim).count() + 1)
            .collect();

        let first_count = counts[0];
        let all_consistent = counts.iter().all(|&c| c == first_count);
        if all_consistent && first_count >= 2 && first_count > best_score {
            best_score = first_count;
            best_delimiter = delim;
        }
    }

    debug!(
        "Detected delimiter {:?} with {} fields",
        best_delimiter as char, best_score
    );
    Ok(best_delimiter)
}

/// Parse a calendar date, trying an explicit format first, then common
/// date and datetime layouts, then a Unix timestamp.
pub fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    let s = s.trim();

    if let Some(fmt) = format {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%d-%b-%Y",  // 15-Jan-2024
        "%d %b %Y",  // 15 Jan 2024
        "%b %d, %Y", // Jan 15, 2024
    ];

    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%m/%d/%Y %H:%M:%S",
    ];

    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt.date_naive());
        }
    }

    Err(SimulationError::DataError(format!(
        "Could not parse date: '{}'",
        s
    )))
}

/// Parse one price cell. `Ok(None)` is a missing value.
fn parse_price(cell: &str) -> std::result::Result<Option<f64>, String> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell.to_lowercase().as_str()) {
        return Ok(None);
    }

    let value: f64 = cell
        .parse()
        .map_err(|_| format!("'{}' is not a number", cell))?;

    if value.is_finite() && value > 0.0 {
        Ok(Some(value))
    } else {
        Err(format!("'{}' is not a positive price", cell))
    }
}

/// Load a wide price panel from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<PricePanel> {
    let path = path.as_ref();
    info!("Loading prices from: {}", path.display());

    let delimiter = match config.delimiter {
        Some(d) => d,
        None => detect_delimiter(path)?,
    };

    load_csv_from_reader(File::open(path)?, delimiter, config)
}

/// Load a wide price panel from any reader.
pub fn load_csv_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
    config: &DataConfig,
) -> Result<PricePanel> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(SimulationError::DataError(
            "expected a date column followed by at least one asset column".to_string(),
        ));
    }

    let assets: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();
    if let Some(pos) = assets.iter().position(|a| a.is_empty()) {
        return Err(SimulationError::DataError(format!(
            "asset column {} has no name",
            pos + 2
        )));
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    let mut skipped = 0;
    let mut blanked = 0;

    for (row_num, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(SimulationError::CsvError(e)),
        };

        let date = match parse_date(record.get(0).unwrap_or_default(), config.date_format.as_deref()) {
            Ok(d) => d,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {} due to date parse error: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut prices = Vec::with_capacity(assets.len());
        for (col, asset) in assets.iter().enumerate() {
            match parse_price(record.get(col + 1).unwrap_or_default()) {
                Ok(p) => prices.push(p),
                Err(msg) if config.skip_invalid => {
                    debug!("Blanking {} on {}: {}", asset, date, msg);
                    blanked += 1;
                    prices.push(None);
                }
                Err(msg) => {
                    return Err(SimulationError::DataError(format!(
                        "row {}, column '{}': {}",
                        row_num + 1,
                        asset,
                        msg
                    )))
                }
            }
        }

        rows.push((date, prices));
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows", skipped);
    }
    if blanked > 0 {
        warn!("Treated {} invalid prices as missing", blanked);
    }

    rows.sort_by_key(|(d, _)| *d);
    let original_len = rows.len();
    rows.dedup_by_key(|(d, _)| *d);
    if rows.len() < original_len {
        warn!("Removed {} duplicate dates", original_len - rows.len());
    }

    if rows.is_empty() {
        return Err(SimulationError::NoData);
    }

    let dates: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
    let columns: Vec<Vec<Option<f64>>> = (0..assets.len())
        .map(|col| rows.iter().map(|(_, prices)| prices[col]).collect())
        .collect();

    info!(
        "Loaded {} rows for {} assets from {} to {}",
        dates.len(),
        assets.len(),
        dates[0],
        dates[dates.len() - 1]
    );

    PricePanel::new(dates, assets, columns)
}
