//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then EMA[i] = P[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are not ready.

use crate::domain::indicator::Reading;

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Reading> {
    if period == 0 {
        return vec![Reading::NotReady; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i < period - 1 {
            sum += value;
            out.push(Reading::NotReady);
        } else if i == period - 1 {
            sum += value;
            ema = sum / period as f64;
            out.push(Reading::Ready(ema));
        } else {
            ema = value * k + ema * (1.0 - k);
            out.push(Reading::Ready(ema));
        }
    }

    out
}
