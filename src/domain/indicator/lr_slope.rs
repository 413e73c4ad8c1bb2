//! Linear-regression slope over a trailing window.
//!
//! Ordinary least squares of price against bar index x = 0..n-1:
//! slope = (nΣxy - ΣxΣy) / (nΣx² - (Σx)²)
//! Only the sign is consumed by the signal rules.
//! Warmup: first (n-1) values are not ready.

use crate::domain::indicator::Reading;

pub fn calculate_lr_slope(values: &[f64], period: usize) -> Vec<Reading> {
    if period < 2 {
        return vec![Reading::NotReady; values.len()];
    }

    let n = period as f64;
    // Σx and Σx² over 0..n-1 are fixed for the window.
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let denom = n * sum_x2 - sum_x * sum_x;

    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                return Reading::NotReady;
            }
            let window = &values[i + 1 - period..=i];
            let mut sum_y = 0.0;
            let mut sum_xy = 0.0;
            for (x, &y) in window.iter().enumerate() {
                sum_y += y;
                sum_xy += x as f64 * y;
            }
            Reading::Ready((n * sum_xy - sum_x * sum_y) / denom)
        })
        .collect()
}
