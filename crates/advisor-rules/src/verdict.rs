//! The rule engine's scored output

use advisor_core::{Action, ActionScores};
use serde::{Deserialize, Serialize};

/// Score and concatenated reasoning for one action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionAssessment {
    /// Normalized score in [0, 1], rounded to two decimals for display
    pub score: f64,
    /// Reasoning lines from every rule that voted for this action
    pub reasoning: String,
}

/// The engine's recommended action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    /// Normalized score of the recommended action
    pub confidence: f64,
    /// The decision threshold the recommendation was made against
    pub threshold_used: f64,
}

/// Full output of one rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub buy: ActionAssessment,
    pub sell: ActionAssessment,
    pub hold: ActionAssessment,
    pub recommendation: Recommendation,
}

impl RuleVerdict {
    /// The assessment for one action
    pub fn assessment(&self, action: Action) -> &ActionAssessment {
        match action {
            Action::Buy => &self.buy,
            Action::Sell => &self.sell,
            Action::Hold => &self.hold,
        }
    }

    /// The three displayed scores as a bucket table
    pub fn scores(&self) -> ActionScores {
        ActionScores {
            buy: self.buy.score,
            sell: self.sell.score,
            hold: self.hold.score,
        }
    }

    /// Render the verdict as a prompt-friendly block of text
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for action in Action::ALL {
            let assessment = self.assessment(action);
            out.push_str(&format!("{action}: score {:.2}\n", assessment.score));
        }
        out.push_str(&format!(
            "Recommendation: {} (confidence {:.2}, threshold {:.2})\n",
            self.recommendation.action,
            self.recommendation.confidence,
            self.recommendation.threshold_used
        ));
        out
    }
}
