//! RSI (Relative Strength Index) over a price series.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n deltas
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 the ratio is undefined and RSI is reported as Degenerate(100).
//!
//! Warmup: first n values are not ready (n deltas need n+1 prices).

use crate::domain::indicator::Reading;

pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<Reading> {
    if period == 0 || prices.len() < 2 {
        return vec![Reading::NotReady; prices.len()];
    }

    let mut out = Vec::with_capacity(prices.len());
    out.push(Reading::NotReady);

    let mut sum_gain = 0.0;
    let mut sum_loss = 0.0;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };
        let delta_idx = i - 1;

        if delta_idx < period - 1 {
            sum_gain += gain;
            sum_loss += loss;
            out.push(Reading::NotReady);
            continue;
        }

        if delta_idx == period - 1 {
            avg_gain = (sum_gain + gain) / period as f64;
            avg_loss = (sum_loss + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        out.push(rsi_from_averages(avg_gain, avg_loss));
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Reading {
    if avg_loss == 0.0 {
        return Reading::Degenerate(100.0);
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    Reading::Ready(rsi.clamp(0.0, 100.0))
}
