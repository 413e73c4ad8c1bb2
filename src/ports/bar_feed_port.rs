//! Bar feed port trait.

use crate::domain::bar::Bar;
use crate::domain::error::SniperError;

pub trait BarFeedPort {
    /// Up to `lookback` most recent bars for `symbol`, oldest first.
    ///
    /// May fail or return fewer bars than requested.
    fn get_bars(&self, symbol: &str, lookback: usize) -> Result<Vec<Bar>, SniperError>;
}
