//! Weighted Moving Average.
//!
//! O(n) sliding window: the weighted sum gains n*P[i] and loses the previous plain window sum.
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! Warmup: first (n-1) values are not ready.

use crate::domain::indicator::Reading;

pub fn calculate_wma(values: &[f64], period: usize) -> Vec<Reading> {
    if period == 0 {
        return vec![Reading::NotReady; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let divisor = (period * (period + 1)) as f64 / 2.0;
    let mut weighted_sum: f64 = 0.0;
    let mut window_sum: f64 = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i < period {
            weighted_sum += (i + 1) as f64 * value;
            window_sum += value;
        } else {
            weighted_sum += period as f64 * value - window_sum;
            window_sum += value - values[i - period];
        }

        if i + 1 < period {
            out.push(Reading::NotReady);
        } else {
            out.push(Reading::Ready(weighted_sum / divisor));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(r: Reading) -> f64 {
        r.value().expect("reading should be ready")
    }

    #[test]
    fn wma_warmup() {
        let series = calculate_wma(&[10.0, 20.0, 30.0, 40.0], 3);
        assert!(!series[0].is_ready());
        assert!(!series[1].is_ready());
        assert!(series[2].is_ready());
        assert!(series[3].is_ready());
    }

    #[test]
    fn wma_known_values() {
        let series = calculate_wma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        let divisor = 6.0;

        let expected = (10.0 + 2.0 * 20.0 + 3.0 * 30.0) / divisor;
        assert!((value(series[2]) - expected).abs() < 1e-9);

        let expected = (20.0 + 2.0 * 30.0 + 3.0 * 40.0) / divisor;
        assert!((value(series[3]) - expected).abs() < 1e-9);

        let expected = (30.0 + 2.0 * 40.0 + 3.0 * 50.0) / divisor;
        assert!((value(series[4]) - expected).abs() < 1e-9);
    }

    #[test]
    fn wma_lags_less_than_sma_on_a_trend() {
        let prices: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let wma = calculate_wma(&prices, 5);
        let sma = crate::domain::indicator::sma::calculate_sma(&prices, 5);
        assert!(value(wma[9]) > value(sma[9]));
    }

    #[test]
    fn wma_period_0_keeps_length() {
        assert_eq!(calculate_wma(&[1.0, 2.0], 0).len(), 2);
    }
}
