#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset};
pub use swingsniper::domain::bar::Bar;
use swingsniper::domain::config::{EngineConfig, InstrumentConfig, RiskBudget, SessionConfig};
use swingsniper::domain::error::SniperError;
use swingsniper::domain::indicator::IndicatorConfig;
use swingsniper::domain::sizing::OptionContract;
use swingsniper::domain::time_policy::TimePolicy;
use swingsniper::ports::bar_feed_port::BarFeedPort;
use swingsniper::ports::notification_port::NotificationPort;
use swingsniper::ports::order_port::{OrderIntent, OrderPort};
use swingsniper::ports::premium_port::PremiumPort;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct MockBarFeed {
    pub data: RefCell<HashMap<String, Vec<Bar>>>,
    pub errors: RefCell<HashMap<String, String>>,
}

impl MockBarFeed {
    pub fn new() -> Self {
        Self {
            data: RefCell::new(HashMap::new()),
            errors: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_bars(self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.set_bars(symbol, bars);
        self
    }

    pub fn with_error(self, symbol: &str, reason: &str) -> Self {
        self.set_error(symbol, reason);
        self
    }

    /// Replace the bars served for `symbol` between ticks.
    pub fn set_bars(&self, symbol: &str, bars: Vec<Bar>) {
        self.errors.borrow_mut().remove(symbol);
        self.data.borrow_mut().insert(symbol.to_string(), bars);
    }

    pub fn set_error(&self, symbol: &str, reason: &str) {
        self.errors
            .borrow_mut()
            .insert(symbol.to_string(), reason.to_string());
    }
}

impl BarFeedPort for MockBarFeed {
    fn get_bars(&self, symbol: &str, lookback: usize) -> Result<Vec<Bar>, SniperError> {
        if let Some(reason) = self.errors.borrow().get(symbol) {
            return Err(SniperError::Feed {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let bars = self.data.borrow().get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(lookback);
        Ok(bars.into_iter().skip(skip).collect())
    }
}

pub struct RecordingOrderPort {
    pub submitted: RefCell<Vec<OrderIntent>>,
    pub reject: Cell<bool>,
}

impl RecordingOrderPort {
    pub fn new() -> Self {
        Self {
            submitted: RefCell::new(Vec::new()),
            reject: Cell::new(false),
        }
    }

    pub fn rejecting() -> Self {
        let port = Self::new();
        port.reject.set(true);
        port
    }

    pub fn count(&self) -> usize {
        self.submitted.borrow().len()
    }
}

impl OrderPort for RecordingOrderPort {
    fn submit(&self, intent: &OrderIntent) -> Result<(), SniperError> {
        if self.reject.get() {
            return Err(SniperError::Order {
                symbol: intent.symbol().to_string(),
                reason: "broker unavailable".to_string(),
            });
        }
        self.submitted.borrow_mut().push(intent.clone());
        Ok(())
    }
}

pub struct RecordingNotifier {
    pub messages: RefCell<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            fail: true,
        }
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<(), SniperError> {
        if self.fail {
            return Err(SniperError::Notification {
                reason: "channel closed".to_string(),
            });
        }
        self.messages.borrow_mut().push(message.to_string());
        Ok(())
    }
}

pub struct FixedPremium(pub f64);

impl PremiumPort for FixedPremium {
    fn premium(&self, _contract: &OptionContract) -> Result<f64, SniperError> {
        Ok(self.0)
    }
}

pub struct FailingPremium;

impl PremiumPort for FailingPremium {
    fn premium(&self, contract: &OptionContract) -> Result<f64, SniperError> {
        Err(SniperError::Feed {
            symbol: contract.underlying.clone(),
            reason: "no quote".to_string(),
        })
    }
}

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap()
}

pub fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

/// Wednesday mid-session: no Friday restriction applies.
pub fn midweek() -> DateTime<FixedOffset> {
    ts("2025-08-06T11:00:00+05:30")
}

/// Bars with open = high = low = close, 30 minutes apart, and volume rising by one each bar.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = ts("2025-07-01T09:15:00+05:30");
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + Duration::minutes(30 * i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000 + i as u64,
        })
        .collect()
}

/// 227 closes: a zig-zag uptrend, a short chop, a dip, then a spike to 1177.
///
/// With the default indicator windows the last bar carries every bullish
/// gate and a bullish continuation through the 20-bar average.
pub fn bullish_closes() -> Vec<f64> {
    let mut closes = vec![1000.0];
    for i in 0..220 {
        let step = if i % 2 == 0 { 2.0 } else { -0.5 };
        closes.push(closes[closes.len() - 1] + step);
    }
    for step in [0.5, -0.5, 0.5, -0.5, -3.0, 15.0] {
        closes.push(closes[closes.len() - 1] + step);
    }
    closes
}

/// Mirror image of `bullish_closes` around 2000; ends at 2823 with every bearish gate.
pub fn bearish_closes() -> Vec<f64> {
    bullish_closes().into_iter().map(|c| 4000.0 - c).collect()
}

pub fn bullish_bars() -> Vec<Bar> {
    bars_from_closes(&bullish_closes())
}

pub fn bearish_bars() -> Vec<Bar> {
    bars_from_closes(&bearish_closes())
}

/// `bullish_closes` with the final spike replaced by a drop to `last`.
pub fn bullish_then(last: f64) -> Vec<Bar> {
    let mut closes = bullish_closes();
    if let Some(c) = closes.last_mut() {
        *c = last;
    }
    bars_from_closes(&closes)
}

pub fn nifty() -> InstrumentConfig {
    InstrumentConfig {
        symbol: "NIFTY".to_string(),
        lot_size: 75,
        strike_increment: 50.0,
        otm_offset: 200.0,
        premium: 50.0,
    }
}

pub fn instrument(symbol: &str) -> InstrumentConfig {
    InstrumentConfig {
        symbol: symbol.to_string(),
        ..nifty()
    }
}

pub fn engine_config(instruments: Vec<InstrumentConfig>) -> EngineConfig {
    EngineConfig {
        session: SessionConfig {
            offset: ist(),
            lookback: 300,
            tick_interval_secs: 1800,
        },
        risk: RiskBudget {
            capital: 100_000.0,
            max_concurrent_trades: 3,
            stop_fraction: 0.05,
            target_fraction: 0.0,
            reversal_exit: true,
        },
        time_policy: TimePolicy::default(),
        indicators: IndicatorConfig::default(),
        instruments,
    }
}

pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.to_rfc3339(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    out
}
