//! Option premium lookup port trait.

use crate::domain::error::SniperError;
use crate::domain::sizing::OptionContract;

pub trait PremiumPort {
    /// Current premium per unit of `contract`.
    fn premium(&self, contract: &OptionContract) -> Result<f64, SniperError>;
}
