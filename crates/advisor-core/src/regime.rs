//! Market regime descriptor
//!
//! The regime captures the prevailing market conditions along four
//! dimensions. Every dimension defaults to its neutral value, which
//! contributes a 1.0 factor during adaptive persona weighting, so a
//! partially known regime never penalizes or favors anyone.

use serde::{Deserialize, Serialize};

/// Prevailing market volatility level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    #[default]
    Medium,
    High,
}

/// Prevailing price trend direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// Interest rate environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestRates {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Broad economic outlook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EconomicOutlook {
    Expanding,
    Contracting,
    #[default]
    Stable,
}

/// Current market-condition descriptor used to re-weight personas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRegime {
    #[serde(default)]
    pub volatility: Volatility,
    #[serde(default)]
    pub trend: Trend,
    #[serde(default)]
    pub interest_rates: InterestRates,
    #[serde(default)]
    pub economic_outlook: EconomicOutlook,
}

impl MarketRegime {
    /// A fully neutral regime
    pub fn neutral() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_defaults() {
        let regime = MarketRegime::neutral();
        assert_eq!(regime.volatility, Volatility::Medium);
        assert_eq!(regime.trend, Trend::Neutral);
        assert_eq!(regime.interest_rates, InterestRates::Stable);
        assert_eq!(regime.economic_outlook, EconomicOutlook::Stable);
    }

    #[test]
    fn test_lowercase_serde() {
        let regime = MarketRegime {
            volatility: Volatility::High,
            trend: Trend::Bullish,
            interest_rates: InterestRates::Rising,
            economic_outlook: EconomicOutlook::Contracting,
        };
        let json = serde_json::to_value(&regime).unwrap();
        assert_eq!(json["volatility"], "high");
        assert_eq!(json["trend"], "bullish");
        assert_eq!(json["interest_rates"], "rising");
        assert_eq!(json["economic_outlook"], "contracting");
    }

    #[test]
    fn test_missing_dimensions_deserialize_neutral() {
        let regime: MarketRegime = serde_json::from_str(r#"{"trend": "bearish"}"#).unwrap();
        assert_eq!(regime.trend, Trend::Bearish);
        assert_eq!(regime.volatility, Volatility::Medium);
    }
}
