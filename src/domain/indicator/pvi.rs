//! PVI (Positive Volume Index) indicator implementation.

use crate::domain::bar::Bar;
use crate::domain::indicator::Reading;

/// Calculate the cumulative Price-Volume Index.
///
/// PVI[0] is not ready (no previous bar to compare volume against).
/// PVI starts at 0 and, when volume[i] > volume[i-1], adds
/// (close[i] - close[i-1]) / close[i-1] * 100; otherwise it carries forward.
/// A non-positive previous close never increments.
pub fn calculate_pvi(bars: &[Bar]) -> Vec<Reading> {
    let mut values = Vec::with_capacity(bars.len());
    let mut pvi = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            values.push(Reading::NotReady);
            continue;
        }
        let prev = &bars[i - 1];
        if bar.volume > prev.volume && prev.close > 0.0 {
            pvi += (bar.close - prev.close) / prev.close * 100.0;
        }
        values.push(Reading::Ready(pvi));
    }

    values
}
