//! Order journal adapter: appends every submitted intent to a CSV file.
//!
//! The journal is also the book of record between processes: an `open` row
//! with no later `close` row for the same symbol is a position still held.

use crate::domain::error::SniperError;
use crate::domain::position::{Position, PositionStatus, Side};
use crate::domain::sizing::{OptionContract, OptionSide};
use crate::ports::order_port::{OrderIntent, OrderPort};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JournalAction {
    Open,
    Close,
}

#[derive(Debug, Serialize)]
struct JournalRow<'a> {
    time: String,
    action: JournalAction,
    symbol: &'a str,
    side: String,
    quantity: u64,
    contract: Option<String>,
    premium: Option<f64>,
    reference_price: f64,
    reason: Option<String>,
    rationale: Option<String>,
}

impl<'a> From<&'a OrderIntent> for JournalRow<'a> {
    fn from(intent: &'a OrderIntent) -> Self {
        match intent {
            OrderIntent::Open(o) => JournalRow {
                time: o.time.to_rfc3339(),
                action: JournalAction::Open,
                symbol: &o.symbol,
                side: o.side.to_string(),
                quantity: o.quantity,
                contract: Some(o.contract.to_string()),
                premium: Some(o.premium),
                reference_price: o.reference_price,
                reason: None,
                rationale: Some(o.rationale.join("; ")),
            },
            OrderIntent::Close(c) => JournalRow {
                time: c.time.to_rfc3339(),
                action: JournalAction::Close,
                symbol: &c.symbol,
                side: c.side.to_string(),
                quantity: c.quantity,
                contract: None,
                premium: None,
                reference_price: c.reference_price,
                reason: Some(c.reason.to_string()),
                rationale: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct JournalRecord {
    time: String,
    action: JournalAction,
    symbol: String,
    side: String,
    quantity: u64,
    contract: Option<String>,
    reference_price: f64,
}

/// Inverse of `OptionContract`'s display, e.g. `NIFTY24800CE`.
fn parse_contract(underlying: &str, label: &str) -> Option<OptionContract> {
    let rest = label.strip_prefix(underlying)?;
    let (strike, side) = match rest.strip_suffix("CE") {
        Some(strike) => (strike, OptionSide::Call),
        None => (rest.strip_suffix("PE")?, OptionSide::Put),
    };
    Some(OptionContract {
        underlying: underlying.to_string(),
        side,
        strike: strike.parse().ok()?,
    })
}

pub struct CsvOrderJournal {
    path: PathBuf,
}

impl CsvOrderJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Positions still open according to the journal, in the order they were opened.
    ///
    /// A missing journal is an empty book.
    pub fn open_positions(&self) -> Result<Vec<Position>, SniperError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut open: Vec<Position> = Vec::new();

        for (index, row) in reader.deserialize::<JournalRecord>().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let record = row.map_err(|e| self.bad_row(line, e.to_string()))?;
            match record.action {
                JournalAction::Open => {
                    let position = self.position_from(record, line)?;
                    open.retain(|p| p.symbol != position.symbol);
                    open.push(position);
                }
                JournalAction::Close => open.retain(|p| p.symbol != record.symbol),
            }
        }

        debug!(journal = %self.path.display(), open = open.len(), "journal replayed");
        Ok(open)
    }

    fn position_from(&self, record: JournalRecord, line: usize) -> Result<Position, SniperError> {
        let side: Side = record.side.parse().map_err(|e| self.bad_row(line, e))?;
        let entry_time = DateTime::parse_from_rfc3339(&record.time)
            .map_err(|e| self.bad_row(line, format!("bad time '{}': {}", record.time, e)))?;
        let contract = record
            .contract
            .as_deref()
            .and_then(|label| parse_contract(&record.symbol, label));

        Ok(Position {
            symbol: record.symbol,
            side,
            entry_price: record.reference_price,
            quantity: record.quantity,
            entry_time,
            status: PositionStatus::Open,
            contract,
        })
    }

    fn bad_row(&self, line: usize, reason: impl Into<String>) -> SniperError {
        SniperError::Journal {
            path: self.path.display().to_string(),
            line,
            reason: reason.into(),
        }
    }

    fn append(&self, intent: &OrderIntent) -> Result<(), SniperError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let write_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(JournalRow::from(intent))?;
        writer.flush()?;
        Ok(())
    }
}

impl OrderPort for CsvOrderJournal {
    fn submit(&self, intent: &OrderIntent) -> Result<(), SniperError> {
        self.append(intent).map_err(|e| SniperError::Order {
            symbol: intent.symbol().to_string(),
            reason: format!("journal write to {} failed: {}", self.path.display(), e),
        })?;
        info!(
            symbol = %intent.symbol(),
            journal = %self.path.display(),
            "order intent journaled"
        );
        Ok(())
    }
}
