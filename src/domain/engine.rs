//! Tick orchestration.
//!
//! `TradingEngine` is the single context object a process owns. One tick for
//! one symbol runs feed -> indicators -> signal -> lifecycle decision ->
//! sizing -> order submission -> notification. The book only changes after
//! the order port accepts the intent.
//!
//! A tick never fails: every problem is logged and reported as
//! `TickOutcome::Skipped`. The Friday forced exit is the exception to
//! skipping, since it depends only on the clock. Outside the exchange
//! session the tick is skipped before the feed is read.

use crate::domain::config::{EngineConfig, InstrumentConfig};
use crate::domain::indicator::compute_snapshots;
use crate::domain::lifecycle::{Decision, LifecycleManager, PositionState};
use crate::domain::position::{ExitReason, Position, PositionStatus, Side};
use crate::domain::signal::{evaluate_signal, Signal};
use crate::domain::sizing::{lot_quantity, select_contract};
use crate::domain::time_policy::{EntryPermission, TimePolicyDecision};
use crate::ports::bar_feed_port::BarFeedPort;
use crate::ports::notification_port::NotificationPort;
use crate::ports::order_port::{CloseIntent, OpenIntent, OrderIntent, OrderPort};
use crate::ports::premium_port::PremiumPort;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, warn};

/// The external collaborators one engine talks to.
#[derive(Clone, Copy)]
pub struct EnginePorts<'a> {
    pub feed: &'a dyn BarFeedPort,
    pub orders: &'a dyn OrderPort,
    pub premiums: &'a dyn PremiumPort,
    pub notifier: &'a dyn NotificationPort,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    UnknownSymbol,
    MarketClosed { reason: String },
    FeedFailure { reason: String },
    InsufficientData { bars: usize, minimum: usize },
    EntryBlocked { reason: String },
    ZeroQuantity,
    MaxPositions { open: usize },
    OrderRejected { reason: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownSymbol => write!(f, "unknown symbol"),
            SkipReason::MarketClosed { reason } => write!(f, "{}", reason),
            SkipReason::FeedFailure { reason } => write!(f, "feed failure: {}", reason),
            SkipReason::InsufficientData { bars, minimum } => {
                write!(f, "insufficient data: {} of {} bars", bars, minimum)
            }
            SkipReason::EntryBlocked { reason } => write!(f, "entry blocked: {}", reason),
            SkipReason::ZeroQuantity => write!(f, "sized quantity is zero"),
            SkipReason::MaxPositions { open } => {
                write!(f, "max concurrent trades reached ({} open)", open)
            }
            SkipReason::OrderRejected { reason } => write!(f, "order rejected: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Opened(OpenIntent),
    Closed(CloseIntent),
    Held(PositionState),
    Skipped(SkipReason),
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Opened(o) => write!(
                f,
                "opened {} x{} {} @ {:.2}",
                o.side, o.quantity, o.contract, o.reference_price
            ),
            TickOutcome::Closed(c) => write!(
                f,
                "closed {} x{} ({}) @ {:.2}",
                c.side, c.quantity, c.reason, c.reference_price
            ),
            TickOutcome::Held(state) => write!(f, "held {}", state),
            TickOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

pub struct TradingEngine<'a> {
    config: EngineConfig,
    ports: EnginePorts<'a>,
    lifecycle: LifecycleManager,
    last_prices: HashMap<String, f64>,
}

impl<'a> TradingEngine<'a> {
    pub fn new(config: EngineConfig, ports: EnginePorts<'a>) -> Self {
        let lifecycle = LifecycleManager::new(config.risk.exit_rules());
        TradingEngine {
            config,
            ports,
            lifecycle,
            last_prices: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Direct access to the book, e.g. to restore positions held from a previous run.
    pub fn lifecycle_mut(&mut self) -> &mut LifecycleManager {
        &mut self.lifecycle
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.last_prices.get(symbol).copied()
    }

    /// Run one tick for `symbol` at `now`.
    pub fn tick<Tz: TimeZone>(&mut self, symbol: &str, now: &DateTime<Tz>) -> TickOutcome {
        let Some(instrument) = self.config.instrument(symbol).cloned() else {
            warn!(symbol = %symbol, "tick for unconfigured symbol");
            return TickOutcome::Skipped(SkipReason::UnknownSymbol);
        };

        let now = now.with_timezone(&self.config.session.offset);
        let policy = self.config.time_policy.evaluate(&now);

        if !policy.session_open {
            let reason = match policy.entry {
                EntryPermission::Blocked { reason } => reason,
                EntryPermission::Allowed => "market closed".to_string(),
            };
            debug!(symbol = %symbol, %reason, "outside market session");
            return TickOutcome::Skipped(SkipReason::MarketClosed { reason });
        }

        if let Some(warning) = &policy.warning {
            if self.lifecycle.position(symbol).is_some() {
                self.notify(&format!("{}: {}", symbol, warning.message));
            }
        }

        let bars = match self.ports.feed.get_bars(symbol, self.config.session.lookback) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "bar feed failed, skipping tick");
                return self.skip_unless_forced(
                    symbol,
                    &policy,
                    now,
                    SkipReason::FeedFailure {
                        reason: e.to_string(),
                    },
                );
            }
        };

        if let Some(last) = bars.last() {
            self.last_prices.insert(symbol.to_string(), last.close);
        }

        let minimum = self.config.minimum_bars();
        if bars.len() < minimum {
            warn!(
                symbol = %symbol,
                bars = bars.len(),
                minimum,
                "insufficient data, skipping tick"
            );
            return self.skip_unless_forced(
                symbol,
                &policy,
                now,
                SkipReason::InsufficientData {
                    bars: bars.len(),
                    minimum,
                },
            );
        }

        let snapshots = compute_snapshots(&bars, &self.config.indicators);
        let (previous, current) = match snapshots.as_slice() {
            [.., previous, current] => (previous, current),
            _ => {
                return TickOutcome::Skipped(SkipReason::InsufficientData {
                    bars: bars.len(),
                    minimum,
                })
            }
        };

        let signal = evaluate_signal(current, previous);
        let price = current.close;
        debug!(
            symbol = %symbol,
            direction = %signal.direction,
            score = signal.confluence_score,
            cpr = %signal.cpr_signal,
            ma = %signal.ma_signal,
            price,
            "signal evaluated"
        );

        match self.lifecycle.decide(symbol, price, &signal, &policy) {
            Decision::Enter(side) => self.enter(&instrument, side, price, signal, now),
            Decision::Exit(reason) => self.exit(symbol, price, reason, now),
            Decision::Hold => TickOutcome::Held(self.lifecycle.state(symbol)),
            Decision::EntryBlocked { reason } => {
                info!(symbol = %symbol, direction = %signal.direction, %reason, "entry blocked");
                TickOutcome::Skipped(SkipReason::EntryBlocked { reason })
            }
        }
    }

    /// Tick every configured instrument, in configuration order.
    pub fn tick_all<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<(String, TickOutcome)> {
        let symbols: Vec<String> = self
            .config
            .instruments
            .iter()
            .map(|i| i.symbol.clone())
            .collect();

        symbols
            .into_iter()
            .map(|symbol| {
                let outcome = self.tick(&symbol, now);
                (symbol, outcome)
            })
            .collect()
    }

    /// Close every open position regardless of signals. Rejected close
    /// orders are logged and the position is flattened anyway.
    pub fn force_exit_all<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        reason: ExitReason,
    ) -> Vec<CloseIntent> {
        let now = now.with_timezone(&self.config.session.offset);

        let intents: Vec<CloseIntent> = self
            .lifecycle
            .open_positions()
            .into_iter()
            .map(|p| CloseIntent {
                symbol: p.symbol.clone(),
                side: p.side,
                quantity: p.quantity,
                reason,
                reference_price: self.last_prices.get(&p.symbol).copied().unwrap_or(p.entry_price),
                time: now,
            })
            .collect();

        for intent in &intents {
            if let Err(e) = self.ports.orders.submit(&OrderIntent::Close(intent.clone())) {
                error!(symbol = %intent.symbol, error = %e, "close order rejected during flatten");
            }
        }

        let trades = self.lifecycle.force_exit_all(&self.last_prices, now, reason);
        for trade in &trades {
            info!(
                symbol = %trade.symbol,
                side = %trade.side,
                pnl = trade.pnl,
                %reason,
                "position flattened"
            );
        }
        if !trades.is_empty() {
            self.notify(&format!("Flattened {} position(s): {}", trades.len(), reason));
        }

        intents
    }

    fn skip_unless_forced(
        &mut self,
        symbol: &str,
        policy: &TimePolicyDecision,
        now: DateTime<FixedOffset>,
        reason: SkipReason,
    ) -> TickOutcome {
        if policy.forced_exit {
            if let Some(position) = self.lifecycle.position(symbol) {
                let price = self
                    .last_prices
                    .get(symbol)
                    .copied()
                    .unwrap_or(position.entry_price);
                warn!(symbol = %symbol, price, "forcing Friday exit without fresh data");
                return self.exit(symbol, price, ExitReason::FridayForcedExit, now);
            }
        }
        TickOutcome::Skipped(reason)
    }

    fn enter(
        &mut self,
        instrument: &InstrumentConfig,
        side: Side,
        price: f64,
        signal: Signal,
        now: DateTime<FixedOffset>,
    ) -> TickOutcome {
        let symbol = instrument.symbol.as_str();
        let risk = &self.config.risk;

        let open = self.lifecycle.open_count();
        if open >= risk.max_concurrent_trades as usize {
            info!(symbol = %symbol, open, "max concurrent trades reached, entry skipped");
            return TickOutcome::Skipped(SkipReason::MaxPositions { open });
        }

        let contract = select_contract(
            symbol,
            price,
            side,
            instrument.strike_increment,
            instrument.otm_offset,
        );
        let premium = match self.ports.premiums.premium(&contract) {
            Ok(premium) => premium,
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    contract = %contract,
                    error = %e,
                    fallback = instrument.premium,
                    "premium lookup failed, using configured estimate"
                );
                instrument.premium
            }
        };

        let quantity = lot_quantity(
            risk.capital,
            risk.max_concurrent_trades,
            premium,
            instrument.lot_size,
        );
        if quantity == 0 {
            info!(symbol = %symbol, premium, lot_size = instrument.lot_size, "sized quantity is zero");
            return TickOutcome::Skipped(SkipReason::ZeroQuantity);
        }

        let intent = OpenIntent {
            symbol: symbol.to_string(),
            side,
            quantity,
            reference_price: price,
            contract: contract.clone(),
            premium,
            rationale: signal.rationale,
            time: now,
        };

        if let Err(e) = self.ports.orders.submit(&OrderIntent::Open(intent.clone())) {
            error!(symbol = %symbol, error = %e, "open order rejected, staying flat");
            return TickOutcome::Skipped(SkipReason::OrderRejected {
                reason: e.to_string(),
            });
        }

        let position = Position {
            symbol: symbol.to_string(),
            side,
            entry_price: price,
            quantity,
            entry_time: now,
            status: PositionStatus::Open,
            contract: Some(contract),
        };
        if let Err(e) = self.lifecycle.open(position) {
            error!(symbol = %symbol, error = %e, "order accepted but book refused the position");
            return TickOutcome::Held(self.lifecycle.state(symbol));
        }

        info!(
            symbol = %symbol,
            side = %side,
            quantity,
            contract = %intent.contract,
            premium,
            price,
            score = signal.confluence_score,
            "position opened"
        );
        self.notify(&format!(
            "{} {} entry: {} x{} @ premium {:.2} (underlying {:.2}); {}",
            symbol,
            side,
            intent.contract,
            quantity,
            premium,
            price,
            intent.rationale.join(", ")
        ));

        TickOutcome::Opened(intent)
    }

    fn exit(
        &mut self,
        symbol: &str,
        price: f64,
        reason: ExitReason,
        now: DateTime<FixedOffset>,
    ) -> TickOutcome {
        let Some(position) = self.lifecycle.position(symbol) else {
            return TickOutcome::Held(PositionState::Flat);
        };

        let intent = CloseIntent {
            symbol: symbol.to_string(),
            side: position.side,
            quantity: position.quantity,
            reason,
            reference_price: price,
            time: now,
        };

        if let Err(e) = self.ports.orders.submit(&OrderIntent::Close(intent.clone())) {
            error!(symbol = %symbol, error = %e, %reason, "close order rejected, position kept for retry");
            return TickOutcome::Skipped(SkipReason::OrderRejected {
                reason: e.to_string(),
            });
        }

        if let Some(trade) = self.lifecycle.close(symbol, price, now, reason) {
            info!(
                symbol = %symbol,
                side = %trade.side,
                %reason,
                entry = trade.entry_price,
                exit = trade.exit_price,
                pnl = trade.pnl,
                "position closed"
            );
            self.notify(&format!(
                "{} {} exit ({}): {:.2} -> {:.2}, pnl {:.2}",
                symbol, trade.side, reason, trade.entry_price, trade.exit_price, trade.pnl
            ));
        }

        TickOutcome::Closed(intent)
    }

    fn notify(&self, message: &str) {
        if let Err(e) = self.ports.notifier.notify(message) {
            warn!(error = %e, "notification failed");
        }
    }
}
