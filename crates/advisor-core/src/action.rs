//! The Buy/Sell/Hold action vocabulary and per-action score table

use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading recommendation
///
/// `ALL` lists the actions in tie-break priority order: when two actions
/// carry exactly equal scores, the earlier one wins (Buy > Sell > Hold).
/// This priority is a deliberate, documented choice and is relied upon by
/// [`ActionScores::leading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// All actions in tie-break priority order
    pub const ALL: [Action; 3] = [Action::Buy, Action::Sell, Action::Hold];

    /// Parse an action from a case-insensitive string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(Action::Buy),
            "sell" => Some(Action::Sell),
            "hold" => Some(Action::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "Buy"),
            Action::Sell => write!(f, "Sell"),
            Action::Hold => write!(f, "Hold"),
        }
    }
}

/// One accumulated score per action (a weighted bucket table)
///
/// Used by both the rule engine and the consensus integrator. The two keep
/// separate normalization and Hold-override semantics; this type only holds
/// the bucket arithmetic they share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionScores {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl ActionScores {
    /// Get the score for one action
    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::Buy => self.buy,
            Action::Sell => self.sell,
            Action::Hold => self.hold,
        }
    }

    /// Add to the score for one action
    pub fn add(&mut self, action: Action, amount: f64) {
        match action {
            Action::Buy => self.buy += amount,
            Action::Sell => self.sell += amount,
            Action::Hold => self.hold += amount,
        }
    }

    /// Set the score for one action
    pub fn set(&mut self, action: Action, value: f64) {
        match action {
            Action::Buy => self.buy = value,
            Action::Sell => self.sell = value,
            Action::Hold => self.hold = value,
        }
    }

    /// Sum of the three bucket totals
    pub fn total(&self) -> f64 {
        self.buy + self.sell + self.hold
    }

    /// Divide every bucket by the given total
    ///
    /// Callers are expected to skip normalization when the total is zero;
    /// a non-positive divisor leaves the table unchanged.
    pub fn normalize_by(&mut self, total: f64) {
        if total > 0.0 {
            self.buy /= total;
            self.sell /= total;
            self.hold /= total;
        }
    }

    /// The highest-scoring action and its score
    ///
    /// Ties resolve by the fixed Buy > Sell > Hold priority: a later action
    /// only wins with a strictly greater score.
    pub fn leading(&self) -> (Action, f64) {
        let mut best = Action::Buy;
        let mut best_score = self.buy;
        for action in [Action::Sell, Action::Hold] {
            let score = self.get(action);
            if score > best_score {
                best = action;
                best_score = score;
            }
        }
        (best, best_score)
    }

    /// Round every bucket to two decimals for display
    pub fn rounded(&self) -> Self {
        Self {
            buy: round2(self.buy),
            sell: round2(self.sell),
            hold: round2(self.hold),
        }
    }
}

/// Round a value to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Action::parse("Buy"), Some(Action::Buy));
        assert_eq!(Action::parse(" sell "), Some(Action::Sell));
        assert_eq!(Action::parse("HOLD"), Some(Action::Hold));
        assert_eq!(Action::parse("short"), None);
    }

    #[test]
    fn test_leading_picks_max() {
        let scores = ActionScores {
            buy: 0.2,
            sell: 0.5,
            hold: 0.3,
        };
        assert_eq!(scores.leading(), (Action::Sell, 0.5));
    }

    #[test]
    fn test_leading_tie_priority() {
        // Exact ties resolve Buy > Sell > Hold
        let scores = ActionScores {
            buy: 0.45,
            sell: 0.45,
            hold: 0.10,
        };
        assert_eq!(scores.leading().0, Action::Buy);

        let scores = ActionScores {
            buy: 0.1,
            sell: 0.45,
            hold: 0.45,
        };
        assert_eq!(scores.leading().0, Action::Sell);
    }

    #[test]
    fn test_normalize_by() {
        let mut scores = ActionScores {
            buy: 2.0,
            sell: 1.0,
            hold: 1.0,
        };
        scores.normalize_by(scores.total());
        assert!((scores.total() - 1.0).abs() < 1e-9);
        assert!((scores.buy - 0.5).abs() < 1e-9);

        // Zero total leaves buckets untouched
        let mut zero = ActionScores::default();
        zero.normalize_by(zero.total());
        assert_eq!(zero, ActionScores::default());
    }

    #[test]
    fn test_round2() {
        assert!((round2(0.456) - 0.46).abs() < 1e-12);
        assert!((round2(0.454) - 0.45).abs() < 1e-12);
    }
}
