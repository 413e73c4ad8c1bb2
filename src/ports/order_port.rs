//! Order submission port trait and the intents it carries.

use crate::domain::error::SniperError;
use crate::domain::position::{ExitReason, Side};
use crate::domain::sizing::OptionContract;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    /// Underlying price the decision was made at.
    pub reference_price: f64,
    pub contract: OptionContract,
    pub premium: f64,
    pub rationale: Vec<String>,
    pub time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub reason: ExitReason,
    pub reference_price: f64,
    pub time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderIntent {
    Open(OpenIntent),
    Close(CloseIntent),
}

impl OrderIntent {
    pub fn symbol(&self) -> &str {
        match self {
            OrderIntent::Open(o) => &o.symbol,
            OrderIntent::Close(c) => &c.symbol,
        }
    }
}

pub trait OrderPort {
    /// Hand the intent to the execution side. The book only changes after `Ok`.
    fn submit(&self, intent: &OrderIntent) -> Result<(), SniperError>;
}
