//! Consensus outcome types

use advisor_core::{Action, ActionScores};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One opinion's contribution to the consensus, display-rounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpinionContribution {
    pub agent: String,
    pub decision: Action,
    /// Clamped confidence, rounded to two decimals
    pub confidence: f64,
    /// The persona weight applied, rounded to two decimals
    pub weight: f64,
    /// `confidence x weight`, rounded to two decimals
    pub weighted_confidence: f64,
    pub reasoning: String,
}

/// Why no consensus could be formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoConsensusReason {
    /// The opinion collection was empty or held no usable entries
    NoOpinions,
    /// Market conditions were never collected
    MissingRegime,
    /// Total weighted confidence was zero or negative
    ZeroConfidence,
}

impl fmt::Display for NoConsensusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoConsensusReason::NoOpinions => write!(f, "no analyses provided"),
            NoConsensusReason::MissingRegime => write!(f, "no market conditions provided"),
            NoConsensusReason::ZeroConfidence => write!(f, "insufficient confidence in analyses"),
        }
    }
}

/// A formed consensus
///
/// `breakdown` and `confidence` keep full precision so downstream
/// arithmetic stays exact; the per-opinion contributions are rounded for
/// display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// The final decision
    pub decision: Action,
    /// The normalized score of the final decision
    pub confidence: f64,
    /// Normalized per-action weighted scores
    pub breakdown: ActionScores,
    /// Sum of weighted confidences across all usable opinions
    pub total_confidence: f64,
    /// The persona weight table used for this integration
    pub weights_used: HashMap<String, f64>,
    /// Contributions sorted by descending weighted confidence; ties keep
    /// arrival order, which carries no meaning across runs
    pub contributions: Vec<OpinionContribution>,
}

/// Result of one integration attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsensusOutcome {
    /// A decision was formed
    Consensus(ConsensusResult),
    /// No recommendation is available
    NoConsensus { reason: NoConsensusReason },
}

impl ConsensusOutcome {
    /// The formed consensus, if any
    pub fn result(&self) -> Option<&ConsensusResult> {
        match self {
            ConsensusOutcome::Consensus(result) => Some(result),
            ConsensusOutcome::NoConsensus { .. } => None,
        }
    }

    /// Whether a decision was formed
    pub fn is_consensus(&self) -> bool {
        matches!(self, ConsensusOutcome::Consensus(_))
    }

    /// Render a human-readable summary, including the no-consensus reason
    pub fn summary(&self) -> String {
        match self {
            ConsensusOutcome::Consensus(result) => {
                let mut out = format!(
                    "Decision based on adaptive weighting of the agent personas: {} with confidence {:.2}\nIntegrated Analysis Summary:\n",
                    result.decision, result.confidence
                );
                for (idx, contribution) in result.contributions.iter().enumerate() {
                    out.push_str(&format!(
                        "{}. {} ({}, weighted confidence: {:.2}):\n   {}\n",
                        idx + 1,
                        contribution.agent,
                        contribution.decision,
                        contribution.weighted_confidence,
                        contribution.reasoning
                    ));
                }
                out
            }
            ConsensusOutcome::NoConsensus { reason } => {
                format!("no recommendation - reason: {reason}")
            }
        }
    }
}
