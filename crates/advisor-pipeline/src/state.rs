//! The shared analysis record and its merge contract

use advisor_consensus::ConsensusOutcome;
use advisor_core::{FactMap, MarketFacts, MarketRegime, PersonaOpinion, SentimentSummary};
use advisor_graph::SharedState;
use advisor_providers::{PriceHistory, Quote, TickerInfo};
use advisor_rules::RuleVerdict;
use serde::{Deserialize, Serialize};

use crate::narrator::FinalPrediction;

/// Field declarations shared by the stages and the graph builder
pub mod fields {
    use advisor_graph::Field;

    pub const TICKER: Field = Field::overwrite("ticker");
    pub const QUOTE: Field = Field::overwrite("quote");
    pub const HISTORY: Field = Field::overwrite("history");
    pub const SENTIMENT: Field = Field::overwrite("sentiment");
    pub const FUNDAMENTALS: Field = Field::overwrite("fundamentals");
    pub const REGIME: Field = Field::overwrite("regime");
    pub const FACTS: Field = Field::overwrite("facts");
    pub const RULE_VERDICT: Field = Field::overwrite("rule_verdict");
    pub const SNAPSHOT: Field = Field::overwrite("snapshot");
    pub const OPINIONS: Field = Field::append("opinions");
    pub const CONSENSUS: Field = Field::overwrite("consensus");
    pub const FINAL_PREDICTION: Field = Field::overwrite("final_prediction");
}

/// One recorded stage failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: String,
    pub error: String,
}

/// The record the analysis graph executes over
///
/// Every `Option` field is an overwrite field with exactly one owning
/// stage; `None` means the owner has not run or failed. The two `Vec`
/// fields collect append contributions and are never rewritten.
#[derive(Debug, Clone, Default)]
pub struct AnalysisState {
    pub ticker: Option<TickerInfo>,
    pub quote: Option<Quote>,
    pub history: Option<PriceHistory>,
    pub sentiment: Option<SentimentSummary>,
    pub fundamentals: Option<FactMap>,
    pub regime: Option<MarketRegime>,
    pub facts: Option<MarketFacts>,
    pub rule_verdict: Option<RuleVerdict>,
    pub snapshot: Option<String>,
    pub opinions: Vec<PersonaOpinion>,
    pub consensus: Option<ConsensusOutcome>,
    pub final_prediction: Option<FinalPrediction>,
    pub failures: Vec<StageFailure>,
}

/// The delta a stage hands back to the executor
#[derive(Debug, Clone)]
pub enum StateUpdate {
    Ticker(TickerInfo),
    Quote(Quote),
    History(PriceHistory),
    Sentiment(SentimentSummary),
    Fundamentals(FactMap),
    Regime(MarketRegime),
    Indicators {
        facts: MarketFacts,
        verdict: RuleVerdict,
    },
    Snapshot(String),
    Opinion(PersonaOpinion),
    Consensus(ConsensusOutcome),
    FinalPrediction(FinalPrediction),
    Failed(StageFailure),
}

impl SharedState for AnalysisState {
    type Update = StateUpdate;

    fn merge(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Ticker(ticker) => self.ticker = Some(ticker),
            StateUpdate::Quote(quote) => self.quote = Some(quote),
            StateUpdate::History(history) => self.history = Some(history),
            StateUpdate::Sentiment(sentiment) => self.sentiment = Some(sentiment),
            StateUpdate::Fundamentals(fundamentals) => self.fundamentals = Some(fundamentals),
            StateUpdate::Regime(regime) => self.regime = Some(regime),
            StateUpdate::Indicators { facts, verdict } => {
                self.facts = Some(facts);
                self.rule_verdict = Some(verdict);
            }
            StateUpdate::Snapshot(snapshot) => self.snapshot = Some(snapshot),
            StateUpdate::Opinion(opinion) => self.opinions.push(opinion),
            StateUpdate::Consensus(outcome) => self.consensus = Some(outcome),
            StateUpdate::FinalPrediction(prediction) => self.final_prediction = Some(prediction),
            StateUpdate::Failed(failure) => self.failures.push(failure),
        }
    }

    fn failure(stage: &str, error: advisor_core::Error) -> StateUpdate {
        StateUpdate::Failed(StageFailure {
            stage: stage.to_string(),
            error: error.to_string(),
        })
    }
}
