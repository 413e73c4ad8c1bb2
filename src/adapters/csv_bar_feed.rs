//! CSV bar feed adapter.
//!
//! One `<SYMBOL>.csv` per instrument under a base directory:
//!
//! ```text
//! timestamp,open,high,low,close,volume
//! 2025-08-04T09:15:00+05:30,24600.0,24650.5,24580.0,24630.0,182000
//! ```

use crate::domain::bar::Bar;
use crate::domain::error::SniperError;
use crate::ports::bar_feed_port::BarFeedPort;
use chrono::DateTime;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub struct CsvBarFeed {
    base_path: PathBuf,
}

impl CsvBarFeed {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn feed_error(symbol: &str, reason: String) -> SniperError {
        SniperError::Feed {
            symbol: symbol.to_string(),
            reason,
        }
    }
}

impl BarFeedPort for CsvBarFeed {
    fn get_bars(&self, symbol: &str, lookback: usize) -> Result<Vec<Bar>, SniperError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            Self::feed_error(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<BarRecord>().enumerate() {
            let record = result
                .map_err(|e| Self::feed_error(symbol, format!("CSV parse error: {}", e)))?;
            let timestamp = DateTime::parse_from_rfc3339(&record.timestamp).map_err(|e| {
                Self::feed_error(
                    symbol,
                    format!("invalid timestamp on row {}: {}", line + 1, e),
                )
            })?;

            bars.push(Bar {
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        let skip = bars.len().saturating_sub(lookback);
        Ok(bars.split_off(skip))
    }
}
