//! Validated engine configuration.
//!
//! Built once at startup by `config_validation::load_engine_config` and
//! read-only afterwards.

use crate::domain::indicator::IndicatorConfig;
use crate::domain::lifecycle::ExitRules;
use crate::domain::time_policy::TimePolicy;
use chrono::FixedOffset;

/// Contract specification for one tradable underlying.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub lot_size: u64,
    pub strike_increment: f64,
    pub otm_offset: f64,
    /// Premium estimate used when no live quote is available.
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskBudget {
    pub capital: f64,
    pub max_concurrent_trades: u32,
    pub stop_fraction: f64,
    pub target_fraction: f64,
    pub reversal_exit: bool,
}

impl RiskBudget {
    pub fn exit_rules(&self) -> ExitRules {
        ExitRules {
            stop_fraction: self.stop_fraction,
            target_fraction: self.target_fraction,
            reversal_exit: self.reversal_exit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Exchange offset from UTC.
    pub offset: FixedOffset,
    /// Bars requested from the feed on every tick.
    pub lookback: usize,
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub session: SessionConfig,
    pub risk: RiskBudget,
    pub time_policy: TimePolicy,
    pub indicators: IndicatorConfig,
    /// In configuration order.
    pub instruments: Vec<InstrumentConfig>,
}

impl EngineConfig {
    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    /// Bars needed before a signal can be evaluated: every field ready on the
    /// last bar plus one previous bar for band crossings.
    pub fn minimum_bars(&self) -> usize {
        self.indicators.warmup_bars() + 1
    }
}
