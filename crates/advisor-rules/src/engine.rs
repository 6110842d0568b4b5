//! The weighted rules engine

use crate::verdict::{ActionAssessment, Recommendation, RuleVerdict};
use advisor_core::action::round2;
use advisor_core::{Action, ActionScores, Error, MarketFacts, Result};
use tracing::debug;

/// Default minimum normalized score required to accept a non-Hold decision
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Tolerance for treating rule weights as already normalized
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// One rule's vote
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: Action,
    /// Raw confidence in [0, 1], before exponential compression
    pub confidence: f64,
    pub reasoning: String,
}

impl Signal {
    pub fn new(action: Action, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            action,
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

/// A pure rule function over the frozen facts snapshot
///
/// A missing required fact is a hard failure: the lookup error propagates
/// out of `evaluate`, it is never papered over with a default.
pub type RuleFn = fn(&MarketFacts) -> Result<Signal>;

/// A named rule paired with its static weight and metric keys
#[derive(Debug, Clone)]
pub struct WeightedRule {
    name: &'static str,
    weight: f64,
    /// Fact keys quoted in the reasoning text for this rule
    metrics: &'static [&'static str],
    rule: RuleFn,
}

impl WeightedRule {
    pub fn new(
        name: &'static str,
        weight: f64,
        metrics: &'static [&'static str],
        rule: RuleFn,
    ) -> Self {
        Self {
            name,
            weight,
            metrics,
            rule,
        }
    }

    /// The rule's name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The rule's weight after engine-level normalization
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Format the metric values this rule read, for the reasoning text
    fn metric_line(&self, facts: &MarketFacts) -> String {
        let present: Vec<String> = self
            .metrics
            .iter()
            .copied()
            .filter_map(|key| {
                facts.indicators.get(key).map(|value| match value {
                    advisor_core::FactValue::Number(n) => format!("{key}: {n}"),
                    advisor_core::FactValue::Text(s) => format!("{key}: {s}"),
                })
            })
            .collect();
        if present.is_empty() {
            "Metric not available".to_string()
        } else {
            present.join(", ")
        }
    }
}

/// Stateless engine holding a fixed rule/weight table
///
/// Construction validates that the weights sum to 1.0 (within `1e-9`) and
/// proportionally rescales them when they do not. Rescaling is idempotent
/// and preserves the relative ordering of weights.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    rules: Vec<WeightedRule>,
}

impl RulesEngine {
    /// Build an engine from an ordered rule table
    pub fn new(mut rules: Vec<WeightedRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::InvalidInput("rule table is empty".to_string()));
        }
        if rules.iter().any(|r| r.weight <= 0.0) {
            return Err(Error::InvalidInput(
                "rule weights must be positive".to_string(),
            ));
        }
        let total: f64 = rules.iter().map(|r| r.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            debug!(total, "rescaling rule weights to sum to 1");
            for rule in &mut rules {
                rule.weight /= total;
            }
        }
        Ok(Self { rules })
    }

    /// Build an engine with the built-in rule set
    pub fn with_default_rules() -> Result<Self> {
        Self::new(crate::builtin::default_rules())
    }

    /// The normalized rule table
    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    /// Run every rule and return the normalized per-action buckets
    ///
    /// These are the scores before the Hold-threshold override. Whenever
    /// at least one rule fired, the three buckets sum to 1.
    pub fn weighted_scores(&self, facts: &MarketFacts) -> Result<ActionScores> {
        let (scores, _) = self.score_with_reasoning(facts)?;
        Ok(scores)
    }

    /// Evaluate the facts snapshot into a scored recommendation
    ///
    /// Pure and deterministic: identical facts produce an identical
    /// verdict. A rule missing a required fact fails the whole evaluation.
    pub fn evaluate(&self, facts: &MarketFacts, threshold: f64) -> Result<RuleVerdict> {
        let (mut scores, reasoning) = self.score_with_reasoning(facts)?;

        let (mut action, leading_score) = scores.leading();
        if leading_score < threshold {
            // Explicit override, not a blend: Hold's displayed score becomes
            // the mass not claimed by Buy or Sell, without renormalizing.
            action = Action::Hold;
            scores.hold = 1.0 - (scores.buy + scores.sell);
        }
        let confidence = scores.get(action);

        let [buy_reasons, sell_reasons, hold_reasons] = reasoning;
        let displayed = scores.rounded();
        Ok(RuleVerdict {
            buy: ActionAssessment {
                score: displayed.buy,
                reasoning: buy_reasons.join("\n\n"),
            },
            sell: ActionAssessment {
                score: displayed.sell,
                reasoning: sell_reasons.join("\n\n"),
            },
            hold: ActionAssessment {
                score: displayed.hold,
                reasoning: hold_reasons.join("\n\n"),
            },
            recommendation: Recommendation {
                action,
                confidence: round2(confidence),
                threshold_used: threshold,
            },
        })
    }

    fn score_with_reasoning(
        &self,
        facts: &MarketFacts,
    ) -> Result<(ActionScores, [Vec<String>; 3])> {
        let mut scores = ActionScores::default();
        let mut reasoning: [Vec<String>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for rule in &self.rules {
            let signal = (rule.rule)(facts)?;
            // Compress low-confidence votes harder than high-confidence
            // ones; exp(c - 1) is monotonic, strictly positive, and 1 at
            // full confidence.
            let compressed = (signal.confidence - 1.0).exp();
            scores.add(signal.action, rule.weight * compressed);

            let slot = match signal.action {
                Action::Buy => 0,
                Action::Sell => 1,
                Action::Hold => 2,
            };
            reasoning[slot].push(format!(
                "Rule: {}\nMetric: {}\nCondition: {}\nConfidence: {}",
                rule.name,
                rule.metric_line(facts),
                signal.reasoning,
                signal.confidence
            ));
        }

        let total = scores.total();
        if total > 0.0 {
            scores.normalize_by(total);
        }
        Ok((scores, reasoning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::facts::keys;
    use advisor_core::FactMap;

    fn pe_only(facts: &MarketFacts) -> Result<Signal> {
        let pe = facts.indicators.number(keys::PE_RATIO)?;
        if pe < 15.0 {
            Ok(Signal::new(Action::Buy, 1.0, format!("Low P/E of {pe}")))
        } else {
            Ok(Signal::new(Action::Hold, 0.5, format!("P/E of {pe}")))
        }
    }

    fn trend_only(facts: &MarketFacts) -> Result<Signal> {
        let trend = facts.indicators.number(keys::PRICE_TREND)?;
        if trend > 0.1 {
            Ok(Signal::new(Action::Buy, 1.0, format!("Trend {trend}")))
        } else {
            Ok(Signal::new(Action::Sell, 1.0, format!("Trend {trend}")))
        }
    }

    fn volatility_only(facts: &MarketFacts) -> Result<Signal> {
        let vol = facts.indicators.number(keys::VOLATILITY)?;
        if vol < 0.1 {
            Ok(Signal::new(Action::Buy, 0.8, format!("Low volatility {vol}")))
        } else {
            Ok(Signal::new(Action::Sell, 0.8, format!("High volatility {vol}")))
        }
    }

    fn three_rule_engine() -> RulesEngine {
        RulesEngine::new(vec![
            WeightedRule::new("pe_ratio", 0.3, &[keys::PE_RATIO], pe_only),
            WeightedRule::new("trend", 0.4, &[keys::PRICE_TREND], trend_only),
            WeightedRule::new("volatility", 0.3, &[keys::VOLATILITY], volatility_only),
        ])
        .unwrap()
    }

    fn bullish_facts() -> MarketFacts {
        MarketFacts {
            indicators: FactMap::new()
                .with(keys::PE_RATIO, 10.0)
                .with(keys::PRICE_TREND, 0.2)
                .with(keys::VOLATILITY, 0.05),
            sentiment: advisor_core::SentimentSummary::default(),
        }
    }

    #[test]
    fn test_weights_normalize_on_construction() {
        let engine = RulesEngine::new(vec![
            WeightedRule::new("a", 3.0, &[], pe_only),
            WeightedRule::new("b", 1.0, &[], trend_only),
        ])
        .unwrap();
        let total: f64 = engine.rules().iter().map(WeightedRule::weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // Relative ordering preserved
        assert!(engine.rules()[0].weight() > engine.rules()[1].weight());
        assert!((engine.rules()[0].weight() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_normalization_idempotent() {
        let engine = RulesEngine::new(vec![
            WeightedRule::new("a", 0.25, &[], pe_only),
            WeightedRule::new("b", 0.75, &[], trend_only),
        ])
        .unwrap();
        assert!((engine.rules()[0].weight() - 0.25).abs() < 1e-12);
        assert!((engine.rules()[1].weight() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let err = RulesEngine::new(vec![WeightedRule::new("a", 0.0, &[], pe_only)]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_scores_sum_to_one_before_override() {
        let engine = three_rule_engine();
        let scores = engine.weighted_scores(&bullish_facts()).unwrap();
        assert!((scores.total() - 1.0).abs() < 1e-6);
        for action in Action::ALL {
            let score = scores.get(action);
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_all_buy_signals_recommend_buy() {
        // P/E 10, trend +0.2, volatility 0.05: every rule votes Buy
        let engine = three_rule_engine();
        let verdict = engine.evaluate(&bullish_facts(), DEFAULT_THRESHOLD).unwrap();
        assert_eq!(verdict.recommendation.action, Action::Buy);
        assert!(verdict.recommendation.confidence > 0.5);
        assert!((verdict.recommendation.threshold_used - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let engine = three_rule_engine();
        let facts = bullish_facts();
        let first = engine.evaluate(&facts, DEFAULT_THRESHOLD).unwrap();
        let second = engine.evaluate(&facts, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_fact_propagates() {
        let engine = three_rule_engine();
        let facts = MarketFacts {
            indicators: FactMap::new().with(keys::PE_RATIO, 10.0),
            sentiment: advisor_core::SentimentSummary::default(),
        };
        let err = engine.evaluate(&facts, DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Error::MissingFact(_)));
    }

    #[test]
    fn test_hold_override_below_threshold() {
        // Split vote: pe says Buy (weight 0.3, conf 1.0), trend says Sell
        // (0.4, 1.0), volatility says Sell (0.3, 0.8). With a high threshold
        // the leading score misses it and the verdict reverts to Hold.
        let engine = three_rule_engine();
        let facts = MarketFacts {
            indicators: FactMap::new()
                .with(keys::PE_RATIO, 10.0)
                .with(keys::PRICE_TREND, -0.2)
                .with(keys::VOLATILITY, 0.3),
            sentiment: advisor_core::SentimentSummary::default(),
        };
        let verdict = engine.evaluate(&facts, 0.9).unwrap();
        assert_eq!(verdict.recommendation.action, Action::Hold);
        // Hold's displayed score is 1 - (buy + sell), not renormalized
        let expected = 1.0 - (verdict.buy.score + verdict.sell.score);
        assert!((verdict.hold.score - expected).abs() < 0.02);
    }

    #[test]
    fn test_reasoning_mentions_rule_and_metric() {
        let engine = three_rule_engine();
        let verdict = engine.evaluate(&bullish_facts(), DEFAULT_THRESHOLD).unwrap();
        assert!(verdict.buy.reasoning.contains("Rule: pe_ratio"));
        assert!(verdict.buy.reasoning.contains("P/E Ratio: 10"));
        assert!(verdict.buy.reasoning.contains("Condition:"));
    }
}
