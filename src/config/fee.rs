use serde::{Deserialize, Serialize};

use crate::config::types::Bps;

/// Execution-cost model. A [`FeeConfig::Venue`] carries the fuller
/// venue-parameterised shape (taker fee, slippage, optional latency and
/// fill-probability knobs); [`FeeConfig::Simple`] is the flat two-field
/// shape. Both resolve to the same scalar one-sided cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeConfig {
    Venue(VenueModel),
    Simple {
        taker_fee_bps: f64,
        slippage_bps: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueModel {
    #[serde(default = "VenueModel::default_taker_fee_bps")]
    pub taker_fee_bps: f64,
    #[serde(default)]
    pub entry_slippage_bps: f64,
    pub latency_ms: Option<i64>,
    pub partial_fill_prob: Option<f64>,
    pub failure_prob: Option<f64>,
}

impl VenueModel {
    const fn default_taker_fee_bps() -> f64 {
        25.0
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig::Venue(VenueModel {
            taker_fee_bps: VenueModel::default_taker_fee_bps(),
            entry_slippage_bps: 0.0,
            latency_ms: None,
            partial_fill_prob: None,
            failure_prob: None,
        })
    }
}

impl FeeConfig {
    /// One-sided cost in basis points (entry or exit, not round-trip).
    pub fn total_fee_bps(&self) -> Bps {
        match self {
            FeeConfig::Venue(v) => Bps::new(v.taker_fee_bps + v.entry_slippage_bps),
            FeeConfig::Simple {
                taker_fee_bps,
                slippage_bps,
            } => Bps::new(taker_fee_bps + slippage_bps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_model_defaults_match_simple_equivalent() {
        let venue = FeeConfig::default();
        let simple = FeeConfig::Simple {
            taker_fee_bps: 25.0,
            slippage_bps: 0.0,
        };
        assert_eq!(venue.total_fee_bps(), simple.total_fee_bps());
    }

    #[test]
    fn simple_sums_both_fields() {
        let fee = FeeConfig::Simple {
            taker_fee_bps: 10.0,
            slippage_bps: 5.0,
        };
        assert_eq!(*fee.total_fee_bps(), 15.0);
    }
}
