//! The final narration boundary

use advisor_consensus::ConsensusOutcome;
use advisor_core::{Action, Error, MarketRegime, Result};
use advisor_personas::OpenAiCapability;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decision and confidence the stub reports when no consensus formed
const FALLBACK_DECISION: Action = Action::Hold;
const FALLBACK_CONFIDENCE: f64 = 0.75;

/// The report the pipeline hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPrediction {
    pub decision: Action,
    pub confidence: f64,
    pub reasoning: String,
    pub additional_insights: String,
}

/// Everything the narrator gets to see
#[derive(Debug, Clone)]
pub struct NarrationContext {
    /// Rendered market data block from the snapshot barrier
    pub market_data: String,
    pub regime: MarketRegime,
    pub consensus: ConsensusOutcome,
}

impl NarrationContext {
    /// Render the meta-analysis prompt for a live narrator
    pub fn render_prompt(&self) -> String {
        let conditions = format!(
            "- volatility: {:?}\n- trend: {:?}\n- interest_rates: {:?}\n- economic_outlook: {:?}",
            self.regime.volatility,
            self.regime.trend,
            self.regime.interest_rates,
            self.regime.economic_outlook
        );
        format!(
            "You are an expert financial meta-analyst. Your task is to analyze the \
             conclusions and reasonings of multiple financial agents, each with their own \
             expertise and perspective, and provide a final investment recommendation.\n\n\
             Market Data:\n{market_data}\n\n\
             Market Conditions:\n{conditions}\n\n\
             Weighted Agent Analyses Summary:\n{analyses}\n\n\
             Based on the above information, please provide:\n\
             1. A final investment decision (Buy, Sell, or Hold)\n\
             2. A confidence level for this decision (0-1)\n\
             3. A comprehensive reasoning for your decision, taking into account the \
             various perspectives and any conflicts or agreements between the agents\n\
             4. Any additional insights or considerations that might be valuable for the \
             investment decision\n\n\
             Your response should be structured as follows:\n\
             Decision: [Your decision]\n\
             Confidence: [Your confidence level]\n\
             Reasoning: [Your comprehensive reasoning]\n\
             Additional Insights: [Any extra valuable information]",
            market_data = self.market_data,
            conditions = conditions,
            analyses = self.consensus.summary(),
        )
    }
}

/// Produces the final narrated report
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, ctx: &NarrationContext) -> Result<FinalPrediction>;
}

/// Deterministic narrator for offline runs
///
/// Echoes the integrated decision with the consensus summary as reasoning;
/// without a consensus it reports a cautious Hold and carries the reason
/// forward as the insight.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubNarrator;

#[async_trait]
impl Narrator for StubNarrator {
    async fn narrate(&self, ctx: &NarrationContext) -> Result<FinalPrediction> {
        match ctx.consensus.result() {
            Some(result) => Ok(FinalPrediction {
                decision: result.decision,
                confidence: result.confidence,
                reasoning: ctx.consensus.summary(),
                additional_insights: format!(
                    "Total weighted confidence across personas: {:.2}",
                    result.total_confidence
                ),
            }),
            None => Ok(FinalPrediction {
                decision: FALLBACK_DECISION,
                confidence: FALLBACK_CONFIDENCE,
                reasoning: "The persona analyses did not produce a usable consensus."
                    .to_string(),
                additional_insights: ctx.consensus.summary(),
            }),
        }
    }
}

/// Live narrator backed by a chat-completions API
///
/// Sends the rendered meta-analysis prompt and parses the structured
/// `Decision / Confidence / Reasoning / Additional Insights` response.
pub struct OpenAiNarrator {
    client: OpenAiCapability,
}

impl OpenAiNarrator {
    pub fn new(client: OpenAiCapability) -> Self {
        Self { client }
    }

    /// Create a narrator from the `OPENAI_API_KEY`/`OPENAI_API_BASE`
    /// environment variables
    pub fn from_env() -> advisor_personas::Result<Self> {
        Ok(Self::new(OpenAiCapability::from_env()?))
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn narrate(&self, ctx: &NarrationContext) -> Result<FinalPrediction> {
        let prompt = ctx.render_prompt();
        debug!("requesting meta-analysis narration");
        let text = self.client.complete(prompt).await?;
        parse_narration(&text)
    }
}

/// Parse a structured narration response into a [`FinalPrediction`]
///
/// Tolerates markdown emphasis around the labels and bracketed values,
/// like the persona response parser. Decision and confidence are
/// mandatory; a missing insights section leaves the field empty.
pub fn parse_narration(text: &str) -> Result<FinalPrediction> {
    enum Section {
        None,
        Reasoning,
        Insights,
    }

    let mut decision: Option<Action> = None;
    let mut confidence: Option<f64> = None;
    let mut reasoning_lines: Vec<String> = Vec::new();
    let mut insight_lines: Vec<String> = Vec::new();
    let mut section = Section::None;

    for line in text.lines() {
        let stripped = line.trim().trim_matches('*').trim();
        if let Some(rest) = strip_label(stripped, "Decision:") {
            decision = Action::parse(rest.trim_matches(['[', ']']));
            section = Section::None;
        } else if let Some(rest) = strip_label(stripped, "Confidence:") {
            confidence = rest.trim_matches(['[', ']']).parse::<f64>().ok();
            section = Section::None;
        } else if let Some(rest) = strip_label(stripped, "Reasoning:") {
            reasoning_lines.push(rest.to_string());
            section = Section::Reasoning;
        } else if let Some(rest) = strip_label(stripped, "Additional Insights:") {
            insight_lines.push(rest.to_string());
            section = Section::Insights;
        } else if !stripped.is_empty() {
            match section {
                Section::Reasoning => reasoning_lines.push(stripped.to_string()),
                Section::Insights => insight_lines.push(stripped.to_string()),
                Section::None => {}
            }
        }
    }

    let decision = decision
        .ok_or_else(|| Error::Unavailable("narration carried no parseable decision".to_string()))?;
    let confidence = confidence.ok_or_else(|| {
        Error::Unavailable("narration carried no parseable confidence".to_string())
    })?;
    Ok(FinalPrediction {
        decision,
        confidence,
        reasoning: reasoning_lines.join(" "),
        additional_insights: insight_lines.join(" "),
    })
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    // get() keeps multibyte text near the label boundary from slicing
    // inside a character.
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim().trim_matches('*').trim())
    } else {
        None
    }
}
