//! Premium adapter backed by per-instrument estimates from configuration.

use crate::domain::config::EngineConfig;
use crate::domain::error::SniperError;
use crate::domain::sizing::OptionContract;
use crate::ports::premium_port::PremiumPort;
use std::collections::HashMap;

pub struct FixedPremiumAdapter {
    premiums: HashMap<String, f64>,
}

impl FixedPremiumAdapter {
    pub fn new(premiums: HashMap<String, f64>) -> Self {
        Self { premiums }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config
                .instruments
                .iter()
                .map(|i| (i.symbol.clone(), i.premium))
                .collect(),
        )
    }
}

impl PremiumPort for FixedPremiumAdapter {
    fn premium(&self, contract: &OptionContract) -> Result<f64, SniperError> {
        self.premiums
            .get(&contract.underlying)
            .copied()
            .ok_or_else(|| SniperError::Feed {
                symbol: contract.underlying.clone(),
                reason: format!("no premium estimate for {}", contract),
            })
    }
}
