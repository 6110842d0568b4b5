//! Adaptive persona weighting
//!
//! Maps the prevailing market regime to a per-persona weight multiplier.
//! Each regime dimension contributes one multiplicative factor in a fixed
//! order; the running product is clamped to [0.5, 2.0] once at the end,
//! and the final weights are renormalized to sum to 1 across personas.

use crate::persona::{tags, Persona, RiskTolerance, TimeHorizon};
use advisor_core::{EconomicOutlook, InterestRates, MarketRegime, Trend, Volatility};
use std::collections::HashMap;
use tracing::debug;

/// Bounds for the raw per-persona multiplier, applied after all factors
const MULTIPLIER_FLOOR: f64 = 0.5;
const MULTIPLIER_CEILING: f64 = 2.0;

/// Re-weights personas for the current market regime
///
/// The stored weight table starts uniform and is replaced on every
/// [`update_weights`](Self::update_weights) call; the consensus integrator
/// reads it when combining opinions.
pub struct AdaptiveWeightingSystem {
    personas: Vec<Persona>,
    weights: HashMap<String, f64>,
}

impl AdaptiveWeightingSystem {
    /// Create a weighting system with uniform initial weights
    pub fn new(personas: Vec<Persona>) -> Self {
        let uniform = if personas.is_empty() {
            0.0
        } else {
            1.0 / personas.len() as f64
        };
        let weights = personas
            .iter()
            .map(|p| (p.name.clone(), uniform))
            .collect();
        Self { personas, weights }
    }

    /// The personas under management
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// The current weight table
    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    /// Recompute weights for the given regime
    ///
    /// O(number of personas). The returned table sums to 1; the stored
    /// table is replaced with the same values.
    pub fn update_weights(&mut self, regime: &MarketRegime) -> HashMap<String, f64> {
        for persona in &self.personas {
            let raw = relevance(persona, regime);
            debug!(persona = %persona.name, raw, "regime relevance");
            self.weights.insert(persona.name.clone(), raw);
        }

        let total: f64 = self.weights.values().sum();
        if total > 0.0 {
            for weight in self.weights.values_mut() {
                *weight /= total;
            }
        }
        self.weights.clone()
    }
}

/// Raw relevance multiplier for one persona under a regime
///
/// Starts at 1.0, applies the factor tables in a fixed order (volatility,
/// trend, interest rates, outlook, compound horizon adjustments), and
/// clamps the final product to [0.5, 2.0]. Neutral regime dimensions
/// contribute a 1.0 factor.
pub fn relevance(persona: &Persona, regime: &MarketRegime) -> f64 {
    let mut weight: f64 = 1.0;

    // Volatility x risk tolerance
    weight *= match (regime.volatility, persona.traits.risk_tolerance) {
        (Volatility::High, RiskTolerance::Low) => 1.5,
        (Volatility::High, RiskTolerance::Medium) => 1.2,
        (Volatility::High, RiskTolerance::High) => 0.8,
        (Volatility::Low, RiskTolerance::Low) => 0.8,
        (Volatility::Low, RiskTolerance::Medium) => 1.0,
        (Volatility::Low, RiskTolerance::High) => 1.3,
        (Volatility::Medium, _) => 1.0,
    };

    // Market trend
    match regime.trend {
        Trend::Bullish => {
            if persona.has_focus(tags::GROWTH) {
                weight *= 1.3;
            }
            if persona.has_strategy(tags::MOMENTUM) {
                weight *= 1.2;
            }
        }
        Trend::Bearish => {
            if persona.has_focus(tags::VALUE) {
                weight *= 1.4;
            }
            if persona.has_strategy(tags::DEFENSIVE) {
                weight *= 1.3;
            }
        }
        Trend::Neutral => {}
    }

    // Interest rate environment
    match regime.interest_rates {
        InterestRates::Rising => {
            if persona.has_focus(tags::INCOME) {
                weight *= 0.8;
            }
            if persona.has_focus(tags::GROWTH) {
                weight *= 1.2;
            }
        }
        InterestRates::Falling => {
            if persona.has_focus(tags::INCOME) {
                weight *= 1.3;
            }
            if persona.has_focus(tags::BONDS) {
                weight *= 1.2;
            }
        }
        InterestRates::Stable => {}
    }

    // Economic outlook
    match regime.economic_outlook {
        EconomicOutlook::Expanding => {
            if persona.has_focus(tags::CYCLICAL) {
                weight *= 1.3;
            }
        }
        EconomicOutlook::Contracting => {
            if persona.has_strategy(tags::DEFENSIVE) {
                weight *= 1.4;
            }
            if persona.has_focus(tags::VALUE) {
                weight *= 1.2;
            }
        }
        EconomicOutlook::Stable => {}
    }

    // Compound horizon adjustments
    if persona.traits.time_horizon == TimeHorizon::Long
        && regime.economic_outlook == EconomicOutlook::Contracting
    {
        weight *= 1.2;
    } else if persona.traits.time_horizon == TimeHorizon::Short
        && regime.volatility == Volatility::High
    {
        weight *= 0.8;
    }

    weight.clamp(MULTIPLIER_FLOOR, MULTIPLIER_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{default_personas, PersonaTraits};

    fn growth_persona(risk: RiskTolerance) -> Persona {
        Persona::new(
            "Growth Seeker",
            PersonaTraits {
                risk_tolerance: risk,
                time_horizon: TimeHorizon::Medium,
            },
            &[],
            &[tags::GROWTH],
        )
    }

    #[test]
    fn test_weights_sum_to_one_for_any_regime() {
        let regimes = [
            MarketRegime::neutral(),
            MarketRegime {
                volatility: Volatility::High,
                trend: Trend::Bearish,
                interest_rates: InterestRates::Rising,
                economic_outlook: EconomicOutlook::Contracting,
            },
            MarketRegime {
                volatility: Volatility::Low,
                trend: Trend::Bullish,
                interest_rates: InterestRates::Falling,
                economic_outlook: EconomicOutlook::Expanding,
            },
        ];
        for regime in regimes {
            let mut system = AdaptiveWeightingSystem::new(default_personas());
            let weights = system.update_weights(&regime);
            let total: f64 = weights.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "regime {regime:?}");
        }
    }

    #[test]
    fn test_raw_multiplier_stays_in_bounds() {
        let extreme = MarketRegime {
            volatility: Volatility::High,
            trend: Trend::Bearish,
            interest_rates: InterestRates::Falling,
            economic_outlook: EconomicOutlook::Contracting,
        };
        for persona in default_personas() {
            let raw = relevance(&persona, &extreme);
            assert!((MULTIPLIER_FLOOR..=MULTIPLIER_CEILING).contains(&raw));
        }
    }

    #[test]
    fn test_conservative_growth_persona_in_volatile_bull_market() {
        // volatility high x risk Low = 1.5, growth focus in bullish = 1.3
        let regime = MarketRegime {
            volatility: Volatility::High,
            trend: Trend::Bullish,
            ..MarketRegime::neutral()
        };
        let persona = growth_persona(RiskTolerance::Low);
        let raw = relevance(&persona, &regime);
        assert!((raw - 1.95).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_regime_contributes_unit_factors() {
        let persona = growth_persona(RiskTolerance::Medium);
        let raw = relevance(&persona, &MarketRegime::neutral());
        assert!((raw - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_applies_once_after_all_factors() {
        // Defensive value persona in a bearish contraction: 1.4 * 1.3
        // (trend) * 1.4 * 1.2 (outlook) * 1.2 (long horizon) = 3.67,
        // clamped to the 2.0 ceiling rather than clamped per factor.
        let persona = Persona::new(
            "Deep Value",
            PersonaTraits {
                risk_tolerance: RiskTolerance::Medium,
                time_horizon: TimeHorizon::Long,
            },
            &[tags::DEFENSIVE],
            &[tags::VALUE],
        );
        let regime = MarketRegime {
            trend: Trend::Bearish,
            economic_outlook: EconomicOutlook::Contracting,
            ..MarketRegime::neutral()
        };
        assert!((relevance(&persona, &regime) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_replaces_stored_table() {
        let mut system = AdaptiveWeightingSystem::new(default_personas());
        let before = system.weights().clone();
        let regime = MarketRegime {
            volatility: Volatility::High,
            trend: Trend::Bearish,
            ..MarketRegime::neutral()
        };
        let after = system.update_weights(&regime);
        assert_eq!(system.weights(), &after);
        assert_ne!(before, after);
    }
}
