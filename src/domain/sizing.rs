//! Lot sizing and option contract selection.

use crate::domain::position::Side;
use std::fmt;

/// Number of units to buy for one position.
///
/// The capital is split evenly across `max_concurrent_trades`, and each slot
/// buys as many whole lots as the premium allows:
/// `floor((capital / max_concurrent_trades) / (premium * lot_size)) * lot_size`.
///
/// Returns 0 when any input makes the division meaningless. A slot that
/// cannot afford one lot gets 0, never a rounded-up lot.
pub fn lot_quantity(capital: f64, max_concurrent_trades: u32, premium: f64, lot_size: u64) -> u64 {
    if !capital.is_finite() || !premium.is_finite() {
        return 0;
    }
    if capital <= 0.0 || premium <= 0.0 || max_concurrent_trades == 0 || lot_size == 0 {
        return 0;
    }

    let per_trade = capital / max_concurrent_trades as f64;
    let lots = (per_trade / (premium * lot_size as f64)).floor();
    if !lots.is_finite() || lots < 1.0 {
        return 0;
    }
    lots as u64 * lot_size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSide {
    Call,
    Put,
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Call => write!(f, "CE"),
            OptionSide::Put => write!(f, "PE"),
        }
    }
}

/// The option an entry buys on the underlying.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionContract {
    pub underlying: String,
    pub side: OptionSide,
    pub strike: f64,
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.underlying, self.strike.round() as i64, self.side)
    }
}

/// Out-of-the-money contract for a directional view on `underlying`.
///
/// The at-the-money strike is `price` rounded to the nearest `strike_increment`.
/// A long view buys a call `otm_offset` above it, a short view a put `otm_offset` below.
pub fn select_contract(
    underlying: &str,
    price: f64,
    side: Side,
    strike_increment: f64,
    otm_offset: f64,
) -> OptionContract {
    let atm = if strike_increment > 0.0 {
        (price / strike_increment).round() * strike_increment
    } else {
        price
    };

    let (option_side, strike) = match side {
        Side::Long => (OptionSide::Call, atm + otm_offset),
        Side::Short => (OptionSide::Put, atm - otm_offset),
    };

    OptionContract {
        underlying: underlying.to_string(),
        side: option_side,
        strike,
    }
}
