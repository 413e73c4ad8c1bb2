//! Per-symbol position lifecycle.
//!
//! Each symbol is Flat, Long or Short. `decide` is a pure read of the book;
//! only `open`, `close` and `force_exit_all` mutate it.
//!
//! Exit triggers for an open position, first match wins:
//! 1. Friday forced exit
//! 2. Stop-loss
//! 3. Profit target (when configured)
//! 4. Reversal: an opposing confluence signal (when enabled)

use crate::domain::error::SniperError;
use crate::domain::position::{ClosedTrade, ExitReason, Position, Side};
use crate::domain::signal::{Direction, Signal};
use crate::domain::time_policy::{EntryPermission, TimePolicyDecision};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "flat"),
            PositionState::Long => write!(f, "long"),
            PositionState::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Enter(Side),
    Exit(ExitReason),
    /// Keep the current state, flat or open.
    Hold,
    /// A directional signal arrived while the time policy refuses entries.
    EntryBlocked { reason: String },
}

fn entry_side(direction: Direction) -> Option<Side> {
    match direction {
        Direction::Bullish => Some(Side::Long),
        Direction::Bearish => Some(Side::Short),
        Direction::Neutral => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitRules {
    pub stop_fraction: f64,
    /// 0 disables the profit target.
    pub target_fraction: f64,
    pub reversal_exit: bool,
}

impl Default for ExitRules {
    fn default() -> Self {
        ExitRules {
            stop_fraction: 0.05,
            target_fraction: 0.0,
            reversal_exit: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    rules: ExitRules,
    positions: HashMap<String, Position>,
    closed_trades: Vec<ClosedTrade>,
}

impl LifecycleManager {
    pub fn new(rules: ExitRules) -> Self {
        LifecycleManager {
            rules,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
        }
    }

    pub fn rules(&self) -> &ExitRules {
        &self.rules
    }

    pub fn state(&self, symbol: &str) -> PositionState {
        match self.positions.get(symbol).map(|p| p.side) {
            None => PositionState::Flat,
            Some(Side::Long) => PositionState::Long,
            Some(Side::Short) => PositionState::Short,
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Open positions sorted by symbol.
    pub fn open_positions(&self) -> Vec<&Position> {
        let mut open: Vec<&Position> = self.positions.values().collect();
        open.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        open
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades.iter().map(|t| t.pnl).sum()
    }

    pub fn decide(
        &self,
        symbol: &str,
        price: f64,
        signal: &Signal,
        policy: &TimePolicyDecision,
    ) -> Decision {
        match self.positions.get(symbol) {
            Some(position) => self.decide_open(position, price, signal, policy),
            None => {
                let Some(side) = entry_side(signal.direction) else {
                    return Decision::Hold;
                };
                match &policy.entry {
                    EntryPermission::Allowed => Decision::Enter(side),
                    EntryPermission::Blocked { reason } => Decision::EntryBlocked {
                        reason: reason.clone(),
                    },
                }
            }
        }
    }

    fn decide_open(
        &self,
        position: &Position,
        price: f64,
        signal: &Signal,
        policy: &TimePolicyDecision,
    ) -> Decision {
        if policy.forced_exit {
            return Decision::Exit(ExitReason::FridayForcedExit);
        }
        if position.should_stop_loss(price, self.rules.stop_fraction) {
            return Decision::Exit(ExitReason::StopLoss);
        }
        if position.should_take_profit(price, self.rules.target_fraction) {
            return Decision::Exit(ExitReason::ProfitTarget);
        }

        let opposing = entry_side(signal.direction) == Some(position.side.opposite());
        if self.rules.reversal_exit && opposing {
            return Decision::Exit(ExitReason::Reversal);
        }

        Decision::Hold
    }

    /// Record a new open position. A symbol holds at most one position.
    pub fn open(&mut self, position: Position) -> Result<(), SniperError> {
        if self.positions.contains_key(&position.symbol) {
            return Err(SniperError::PositionAlreadyOpen {
                symbol: position.symbol,
            });
        }
        self.positions.insert(position.symbol.clone(), position);
        Ok(())
    }

    /// Close the position on `symbol`, returning the trade. Flat symbols return `None`.
    pub fn close(
        &mut self,
        symbol: &str,
        price: f64,
        time: DateTime<FixedOffset>,
        reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let position = self.positions.remove(symbol)?;
        let trade = position.close(price, time, reason);
        self.closed_trades.push(trade.clone());
        Some(trade)
    }

    /// Close every open position. Symbols missing from `prices` exit at their entry price.
    pub fn force_exit_all(
        &mut self,
        prices: &HashMap<String, f64>,
        time: DateTime<FixedOffset>,
        reason: ExitReason,
    ) -> Vec<ClosedTrade> {
        let mut symbols: Vec<String> = self.positions.keys().cloned().collect();
        symbols.sort();

        symbols
            .iter()
            .filter_map(|symbol| {
                let price = prices
                    .get(symbol)
                    .copied()
                    .or_else(|| self.positions.get(symbol).map(|p| p.entry_price))?;
                self.close(symbol, price, time, reason)
            })
            .collect()
    }
}
