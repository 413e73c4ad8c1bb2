//! Technical indicator implementations.
//!
//! This module provides:
//! - `Reading`: explicit per-bar indicator state (ready, not ready, degenerate)
//! - `IndicatorConfig`: window lengths for every derived field
//! - `IndicatorSnapshot`: the typed, read-only record derived for one bar
//! - `compute_snapshots`: the pure calculator producing one snapshot per bar

pub mod cpr;
pub mod ema;
pub mod lr_slope;
pub mod pvi;
pub mod rsi;
pub mod sma;
pub mod wma;

use crate::domain::bar::Bar;
use chrono::{DateTime, FixedOffset};

/// Value of an indicator at a single bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Ready(f64),
    /// Not enough history for the window yet.
    NotReady,
    /// The formula had no defined value and was recovered locally (e.g. RSI with zero loss).
    Degenerate(f64),
}

impl Reading {
    /// The usable value, if any. Degenerate readings carry their recovered value.
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Ready(v) | Reading::Degenerate(v) => Some(*v),
            Reading::NotReady => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, Reading::NotReady)
    }
}

/// Window lengths for the indicator set.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ma_fast: usize,
    pub ma_short: usize,
    pub ma_mid: usize,
    pub ma_long: usize,
    pub ma_trend: usize,
    pub rsi_period: usize,
    pub rsi_ma_fast: usize,
    pub rsi_ma_mid: usize,
    pub rsi_ma_slow: usize,
    pub lr_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ma_fast: 3,
            ma_short: 9,
            ma_mid: 20,
            ma_long: 50,
            ma_trend: 200,
            rsi_period: 21,
            rsi_ma_fast: 9,
            rsi_ma_mid: 14,
            rsi_ma_slow: 26,
            lr_window: 21,
        }
    }
}

impl IndicatorConfig {
    /// Number of bars after which every snapshot field is ready.
    ///
    /// RSI needs `rsi_period + 1` bars and its slowest average another
    /// `rsi_ma_slow - 1` RSI values on top of that.
    pub fn warmup_bars(&self) -> usize {
        let ma = self
            .ma_fast
            .max(self.ma_short)
            .max(self.ma_mid)
            .max(self.ma_long)
            .max(self.ma_trend);
        let rsi = self.rsi_period + self.rsi_ma_slow;
        ma.max(rsi).max(self.lr_window)
    }
}

/// Indicator state derived for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<FixedOffset>,
    pub close: f64,
    pub typical_price: f64,
    /// SMA of typical price.
    pub ma3: Reading,
    /// EMA of typical price.
    pub ma9: Reading,
    /// SMA of typical price.
    pub ma20: Reading,
    /// EMA of high.
    pub ma50: Reading,
    /// WMA of high.
    pub ma200: Reading,
    pub rsi: Reading,
    pub rsi_ma9: Reading,
    pub rsi_ma14: Reading,
    pub rsi_ma26: Reading,
    pub lr_slope: Reading,
    pub lr_slope_positive: Option<bool>,
    pub pvi: Reading,
    pub pvi_positive: Option<bool>,
    pub cpr_top: Reading,
    pub cpr_bottom: Reading,
}

/// Derive one snapshot per bar. Pure: the same bars always yield the same snapshots.
pub fn compute_snapshots(bars: &[Bar], config: &IndicatorConfig) -> Vec<IndicatorSnapshot> {
    let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();

    let ma3 = sma::calculate_sma(&typical, config.ma_fast);
    let ma9 = ema::calculate_ema(&typical, config.ma_short);
    let ma20 = sma::calculate_sma(&typical, config.ma_mid);
    let ma50 = ema::calculate_ema(&highs, config.ma_long);
    let ma200 = wma::calculate_wma(&highs, config.ma_trend);

    let rsi = rsi::calculate_rsi(&typical, config.rsi_period);
    let rsi_ma9 = sma::smooth_readings(&rsi, config.rsi_ma_fast);
    let rsi_ma14 = sma::smooth_readings(&rsi, config.rsi_ma_mid);
    let rsi_ma26 = sma::smooth_readings(&rsi, config.rsi_ma_slow);

    let lr_slope = lr_slope::calculate_lr_slope(&highs, config.lr_window);
    let pvi = pvi::calculate_pvi(bars);
    let cpr = cpr::calculate_cpr(bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSnapshot {
            timestamp: bar.timestamp,
            close: bar.close,
            typical_price: typical[i],
            ma3: ma3[i],
            ma9: ma9[i],
            ma20: ma20[i],
            ma50: ma50[i],
            ma200: ma200[i],
            rsi: rsi[i],
            rsi_ma9: rsi_ma9[i],
            rsi_ma14: rsi_ma14[i],
            rsi_ma26: rsi_ma26[i],
            lr_slope: lr_slope[i],
            lr_slope_positive: lr_slope[i].value().map(|v| v > 0.0),
            pvi: pvi[i],
            pvi_positive: pvi[i].value().map(|v| v > 0.0),
            cpr_top: cpr[i].map_or(Reading::NotReady, |band| Reading::Ready(band.top)),
            cpr_bottom: cpr[i].map_or(Reading::NotReady, |band| Reading::Ready(band.bottom)),
        })
        .collect()
}
