//! Price/volume bar representation.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// One sampling interval of an instrument, stamped in exchange-local time.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// (open + high + low + close) / 4
    pub fn typical_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    /// Calendar date of the trading session this bar belongs to.
    pub fn session_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
