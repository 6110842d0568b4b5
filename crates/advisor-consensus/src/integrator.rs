//! Weighted integration of persona opinions

use crate::result::{ConsensusOutcome, ConsensusResult, NoConsensusReason, OpinionContribution};
use advisor_core::{round2, Action, ActionScores, MarketRegime, PersonaOpinion};
use advisor_personas::AdaptiveWeightingSystem;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Minimum normalized score for Buy or Sell to stand as the decision.
pub const CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Fallback weight for opinions from personas the weighting system does
/// not track.
const DEFAULT_WEIGHT: f64 = 1.0;

/// Combines persona opinions into a single recommendation.
///
/// Persona weights are refreshed from the market regime before every
/// integration, so back-to-back calls under different conditions see
/// different weight tables.
pub struct ConsensusIntegrator {
    weighting: AdaptiveWeightingSystem,
}

impl ConsensusIntegrator {
    pub fn new(weighting: AdaptiveWeightingSystem) -> Self {
        Self { weighting }
    }

    /// Integrate `opinions` under the given market regime.
    ///
    /// Returns [`ConsensusOutcome::NoConsensus`] when the regime is
    /// missing, no usable opinions remain, or the weighted confidences
    /// sum to zero. Never errors; an unusable input set is a reportable
    /// outcome, not a failure.
    pub fn integrate(
        &mut self,
        opinions: &[PersonaOpinion],
        regime: Option<&MarketRegime>,
    ) -> ConsensusOutcome {
        let Some(regime) = regime else {
            warn!("consensus requested without market conditions");
            return ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::MissingRegime,
            };
        };
        if opinions.is_empty() {
            return ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::NoOpinions,
            };
        }

        let weights = self.weighting.update_weights(regime);

        let mut scores = ActionScores::default();
        let mut total_confidence = 0.0;
        let mut contributions = Vec::with_capacity(opinions.len());
        for opinion in opinions {
            if !opinion.confidence.is_finite() {
                warn!(agent = %opinion.agent, "skipping opinion with non-finite confidence");
                continue;
            }
            let confidence = opinion.confidence.clamp(0.0, 1.0);
            let weight = weights
                .get(&opinion.agent)
                .copied()
                .unwrap_or(DEFAULT_WEIGHT);
            let weighted_confidence = confidence * weight;
            scores.add(opinion.decision, weighted_confidence);
            total_confidence += weighted_confidence;
            contributions.push(OpinionContribution {
                agent: opinion.agent.clone(),
                decision: opinion.decision,
                confidence: round2(confidence),
                weight: round2(weight),
                weighted_confidence: round2(weighted_confidence),
                reasoning: opinion.reasoning.clone(),
            });
        }

        if contributions.is_empty() {
            return ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::NoOpinions,
            };
        }
        if total_confidence <= 0.0 {
            return ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::ZeroConfidence,
            };
        }

        scores.normalize_by(total_confidence);

        contributions.sort_by(|a, b| {
            b.weighted_confidence
                .partial_cmp(&a.weighted_confidence)
                .unwrap_or(Ordering::Equal)
        });

        let (decision, confidence) = decide(&scores);
        debug!(
            %decision,
            confidence,
            total_confidence,
            "consensus formed across {} opinions",
            contributions.len()
        );

        ConsensusOutcome::Consensus(ConsensusResult {
            decision,
            confidence,
            breakdown: scores,
            total_confidence,
            weights_used: weights,
            contributions,
        })
    }
}

/// Pick the final action from normalized scores.
///
/// Buy and Sell must clear [`CONFIDENCE_THRESHOLD`]; otherwise the
/// decision falls back to Hold with confidence covering everything the
/// active sides did not claim.
fn decide(scores: &ActionScores) -> (Action, f64) {
    let (leading, score) = scores.leading();
    if matches!(leading, Action::Buy | Action::Sell) && score >= CONFIDENCE_THRESHOLD {
        (leading, score)
    } else {
        (Action::Hold, 1.0 - (scores.buy + scores.sell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{Action, MarketRegime};
    use advisor_personas::{default_personas, AdaptiveWeightingSystem};

    fn opinion(agent: &str, decision: Action, confidence: f64) -> PersonaOpinion {
        PersonaOpinion::new(agent, decision, confidence, format!("{agent} reasoning"))
    }

    // Personas unknown to the weighting system all fall back to the same
    // default weight, which keeps the test arithmetic flat.
    fn uniform_integrator() -> ConsensusIntegrator {
        ConsensusIntegrator::new(AdaptiveWeightingSystem::new(Vec::new()))
    }

    #[test]
    fn conflicting_opinions_split_and_buy_wins_the_tie() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("a", Action::Buy, 0.9),
            opinion("b", Action::Sell, 0.9),
            opinion("c", Action::Hold, 0.2),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        assert_eq!(result.decision, Action::Buy);
        assert!((result.breakdown.buy - 0.45).abs() < 1e-9);
        assert!((result.breakdown.sell - 0.45).abs() < 1e-9);
        assert!((result.breakdown.hold - 0.10).abs() < 1e-9);
        assert!((result.confidence - 0.45).abs() < 1e-9);
        assert!((result.total_confidence - 2.0).abs() < 1e-9);
    }

    #[test]
    fn single_confident_hold_dominates() {
        let mut integrator = uniform_integrator();
        let opinions = vec![opinion("solo", Action::Hold, 1.0)];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        assert_eq!(result.decision, Action::Hold);
        assert!((result.confidence - 1.0).abs() < 1e-9);
        assert!((result.breakdown.hold - 1.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_sums_to_one() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("a", Action::Buy, 0.7),
            opinion("b", Action::Buy, 0.55),
            opinion("c", Action::Sell, 0.3),
            opinion("d", Action::Hold, 0.8),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        assert!((result.breakdown.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contributions_sorted_by_weighted_confidence() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("low", Action::Hold, 0.2),
            opinion("high", Action::Buy, 0.9),
            opinion("mid", Action::Sell, 0.5),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        let order: Vec<&str> = result
            .contributions
            .iter()
            .map(|c| c.agent.as_str())
            .collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("wild", Action::Buy, 3.5),
            opinion("calm", Action::Sell, -0.4),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        // Clamped to 1.0 and 0.0, so Buy takes everything.
        assert_eq!(result.decision, Action::Buy);
        assert!((result.breakdown.buy - 1.0).abs() < 1e-9);
        assert!((result.total_confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_opinions_report_no_opinions() {
        let mut integrator = uniform_integrator();
        let outcome = integrator.integrate(&[], Some(&MarketRegime::neutral()));
        assert_eq!(
            outcome,
            ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::NoOpinions,
            }
        );
    }

    #[test]
    fn all_zero_confidence_reports_zero_confidence() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("a", Action::Buy, 0.0),
            opinion("b", Action::Sell, 0.0),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        assert_eq!(
            outcome,
            ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::ZeroConfidence,
            }
        );
    }

    #[test]
    fn missing_regime_reports_missing_regime() {
        let mut integrator = uniform_integrator();
        let opinions = vec![opinion("a", Action::Buy, 0.9)];
        let outcome = integrator.integrate(&opinions, None);
        assert_eq!(
            outcome,
            ConsensusOutcome::NoConsensus {
                reason: NoConsensusReason::MissingRegime,
            }
        );
    }

    #[test]
    fn non_finite_confidence_is_skipped() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("nan", Action::Sell, f64::NAN),
            opinion("ok", Action::Buy, 0.8),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        assert_eq!(result.contributions.len(), 1);
        assert_eq!(result.decision, Action::Buy);
    }

    #[test]
    fn adaptive_weights_tilt_the_outcome() {
        let mut integrator = ConsensusIntegrator::new(AdaptiveWeightingSystem::new(
            default_personas(),
        ));
        // A bearish regime favors the value-focused persona, so its Sell
        // opinion outweighs the momentum trader's equally confident Buy.
        let regime = MarketRegime {
            trend: advisor_core::Trend::Bearish,
            ..MarketRegime::neutral()
        };
        let opinions = vec![
            opinion("Value Investor", Action::Sell, 0.8),
            opinion("Momentum Trader", Action::Buy, 0.8),
        ];
        let outcome = integrator.integrate(&opinions, Some(&regime));
        let result = outcome.result().expect("consensus");
        assert_eq!(result.decision, Action::Sell);
        assert!(result.breakdown.sell > result.breakdown.buy);
    }

    #[test]
    fn low_scores_fall_back_to_hold() {
        let mut integrator = uniform_integrator();
        // Buy and Sell each land at 0.35 of the total, under the 0.4
        // threshold, so the outcome degrades to Hold.
        let opinions = vec![
            opinion("a", Action::Buy, 0.35),
            opinion("b", Action::Sell, 0.35),
            opinion("c", Action::Hold, 0.30),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let result = outcome.result().expect("consensus");
        assert_eq!(result.decision, Action::Hold);
        assert!((result.confidence - 0.30).abs() < 1e-9);
    }

    #[test]
    fn summary_names_every_contributor() {
        let mut integrator = uniform_integrator();
        let opinions = vec![
            opinion("a", Action::Buy, 0.9),
            opinion("b", Action::Hold, 0.4),
        ];
        let outcome = integrator.integrate(&opinions, Some(&MarketRegime::neutral()));
        let summary = outcome.summary();
        assert!(summary.contains("a (Buy"));
        assert!(summary.contains("b (Hold"));
        assert!(summary.contains("confidence"));
    }
}
