//! Simple Moving Average.
//!
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n, maintained as a running window sum.
//! Warmup: first (n-1) values are not ready.

use crate::domain::indicator::Reading;

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Reading> {
    if period == 0 {
        return vec![Reading::NotReady; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window_sum = 0.0;

    for (i, &value) in values.iter().enumerate() {
        window_sum += value;
        if i >= period {
            window_sum -= values[i - period];
        }

        if i + 1 < period {
            out.push(Reading::NotReady);
        } else {
            out.push(Reading::Ready(window_sum / period as f64));
        }
    }

    out
}

/// SMA over another indicator's readings.
///
/// A value is produced only once `period` consecutive usable readings exist;
/// degenerate inputs contribute their recovered value.
pub fn smooth_readings(readings: &[Reading], period: usize) -> Vec<Reading> {
    if period == 0 {
        return vec![Reading::NotReady; readings.len()];
    }

    readings
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                return Reading::NotReady;
            }
            let window = &readings[i + 1 - period..=i];
            let mut sum = 0.0;
            for r in window {
                match r.value() {
                    Some(v) => sum += v,
                    None => return Reading::NotReady,
                }
            }
            Reading::Ready(sum / period as f64)
        })
        .collect()
}
