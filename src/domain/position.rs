//! Position tracking and the closed-trade ledger.

use crate::domain::sizing::OptionContract;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Side::Long),
            "short" => Ok(Side::Short),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Why a position was closed, in the order exits are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    FridayForcedExit,
    StopLoss,
    ProfitTarget,
    Reversal,
    /// Operator-requested flatten, e.g. on shutdown.
    Shutdown,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::FridayForcedExit => "friday_forced_exit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::ProfitTarget => "profit_target",
            ExitReason::Reversal => "reversal",
            ExitReason::Shutdown => "shutdown",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    /// Underlying price at entry.
    pub entry_price: f64,
    pub quantity: u64,
    pub entry_time: DateTime<FixedOffset>,
    pub status: PositionStatus,
    pub contract: Option<OptionContract>,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        let points = match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        };
        points * self.quantity as f64
    }

    /// Long: `price <= entry * (1 - stop_fraction)`. Short: `price >= entry * (1 + stop_fraction)`.
    pub fn should_stop_loss(&self, price: f64, stop_fraction: f64) -> bool {
        match self.side {
            Side::Long => price <= self.entry_price * (1.0 - stop_fraction),
            Side::Short => price >= self.entry_price * (1.0 + stop_fraction),
        }
    }

    /// A zero target disables the check.
    pub fn should_take_profit(&self, price: f64, target_fraction: f64) -> bool {
        if target_fraction <= 0.0 {
            return false;
        }
        match self.side {
            Side::Long => price >= self.entry_price * (1.0 + target_fraction),
            Side::Short => price <= self.entry_price * (1.0 - target_fraction),
        }
    }

    pub fn close(
        mut self,
        exit_price: f64,
        exit_time: DateTime<FixedOffset>,
        reason: ExitReason,
    ) -> ClosedTrade {
        self.status = PositionStatus::Closed;
        let pnl = self.unrealized_pnl(exit_price);
        ClosedTrade {
            symbol: self.symbol,
            side: self.side,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price,
            entry_time: self.entry_time,
            exit_time,
            reason,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: DateTime<FixedOffset>,
    pub exit_time: DateTime<FixedOffset>,
    pub reason: ExitReason,
    /// Underlying points times quantity.
    pub pnl: f64,
}
