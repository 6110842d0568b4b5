//! Persona opinions

use crate::Action;
use serde::{Deserialize, Serialize};

/// One persona's verdict on a ticker
///
/// Each persona contributes at most one opinion per run. Opinions are
/// appended to a shared collection whose ordering carries no meaning:
/// persona stages complete in whatever order the scheduler lands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaOpinion {
    /// Name of the persona that produced this opinion
    pub agent: String,
    /// The recommended action
    pub decision: Action,
    /// Confidence in the decision, in [0, 1]
    pub confidence: f64,
    /// Free-form explanation
    pub reasoning: String,
}

impl PersonaOpinion {
    pub fn new(
        agent: impl Into<String>,
        decision: Action,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            decision,
            confidence,
            reasoning: reasoning.into(),
        }
    }
}
