//! The persona capability boundary
//!
//! The aggregation core never talks to a language model directly; it hands
//! a [`PersonaContext`] to whatever implements [`PersonaCapability`]. The
//! deterministic [`StubCapability`] serves offline runs and tests; the
//! live implementation lives in [`crate::openai`].

use crate::error::Result;
use crate::persona::Persona;
use advisor_core::{Action, PersonaOpinion};
use advisor_rules::RuleVerdict;
use async_trait::async_trait;

/// Reasoning returned by the stub capability, matching the tone of a
/// cautious analyst defaulting to Hold
const STUB_REASONING: &str = "Given the priority on capital preservation, the current \
financial position is not urgent enough to trigger a buy or sell action. The rule-based \
signals are mixed and price stability near the support level supports holding rather than \
making a hasty decision.";

/// Everything a persona gets to see before forming an opinion
#[derive(Debug, Clone)]
pub struct PersonaContext {
    /// The ticker under analysis
    pub ticker: String,
    /// The rule engine's verdict, rendered for the prompt
    pub rule_verdict: RuleVerdict,
    /// Selected market data lines (price, sentiment, indicators)
    pub market_data: String,
}

impl PersonaContext {
    /// Render the structured prompt for one persona
    ///
    /// Lists the persona's identity, traits, strategy, and focus, then the
    /// rule-based recommendation and collected market data, and asks for a
    /// `Decision / Confidence / Reasoning` response.
    pub fn render_prompt(&self, persona: &Persona) -> String {
        let traits = format!(
            "- risk_tolerance: {}\n- time_horizon: {}",
            persona.traits.risk_tolerance, persona.traits.time_horizon
        );
        let strategy = persona
            .strategy
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        let focus = persona
            .focus
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a {name}, an AI financial analyst with the following traits:\n\
             {traits}\n\n\
             Your investment strategy involves:\n{strategy}\n\n\
             You focus on the following key areas when analyzing stocks:\n{focus}\n\n\
             Rule-Based Recommendations for {ticker}:\n{rules}\n\
             Given the following market data:\n{market_data}\n\n\
             Analyze the data and provide your investment recommendation. Your response \
             should include:\n\
             1. Your decision (Buy, Sell, or Hold)\n\
             2. Your confidence level in this decision (0-1)\n\
             3. A brief explanation of your reasoning\n\n\
             Response Format:\n\
             Decision: [Your decision]\n\
             Confidence: [Your confidence level]\n\
             Reasoning: [Your explanation]",
            name = persona.name,
            traits = traits,
            strategy = strategy,
            focus = focus,
            ticker = self.ticker,
            rules = self.rule_verdict.summary(),
            market_data = self.market_data,
        )
    }
}

/// An opaque decision-maker invoked once per persona per run
#[async_trait]
pub trait PersonaCapability: Send + Sync {
    /// Produce one opinion for the given persona and context
    async fn deliberate(&self, persona: &Persona, ctx: &PersonaContext) -> Result<PersonaOpinion>;

    /// Capability name, e.g. "stub" or "openai"
    fn name(&self) -> &str;
}

/// Deterministic capability for offline and test execution
///
/// Returns a fixed decision/confidence/reasoning triple without any
/// external call.
#[derive(Debug, Clone)]
pub struct StubCapability {
    decision: Action,
    confidence: f64,
    reasoning: String,
}

impl StubCapability {
    /// A stub answering with a fixed triple
    pub fn new(decision: Action, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            decision,
            confidence,
            reasoning: reasoning.into(),
        }
    }
}

impl Default for StubCapability {
    fn default() -> Self {
        Self::new(Action::Hold, 0.6, STUB_REASONING)
    }
}

#[async_trait]
impl PersonaCapability for StubCapability {
    async fn deliberate(&self, persona: &Persona, _ctx: &PersonaContext) -> Result<PersonaOpinion> {
        Ok(PersonaOpinion::new(
            persona.name.clone(),
            self.decision,
            self.confidence,
            self.reasoning.clone(),
        ))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
