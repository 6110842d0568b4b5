//! One stage type per node of the analysis graph

use crate::indicators;
use crate::narrator::{NarrationContext, Narrator};
use crate::state::{fields, AnalysisState, StateUpdate};
use advisor_consensus::ConsensusIntegrator;
use advisor_core::facts::keys;
use advisor_core::{Error, FactValue, MarketFacts, Result};
use advisor_graph::{Field, Stage};
use advisor_personas::{Persona, PersonaCapability, PersonaContext};
use advisor_providers::{
    FundamentalsProvider, HistoryProvider, QuoteProvider, RegimeProvider, SentimentProvider,
    TickerResolver,
};
use advisor_rules::RulesEngine;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

fn missing(field: &str) -> Error {
    Error::Unavailable(format!("{field} was never collected"))
}

/// Entry gate: resolves the query to a ticker symbol
pub struct TickerStage {
    resolver: Arc<dyn TickerResolver>,
    query: String,
}

impl TickerStage {
    pub fn new(resolver: Arc<dyn TickerResolver>, query: impl Into<String>) -> Self {
        Self {
            resolver,
            query: query.into(),
        }
    }
}

#[async_trait]
impl Stage<AnalysisState> for TickerStage {
    fn name(&self) -> &str {
        "ticker"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, _state: &AnalysisState) -> Result<StateUpdate> {
        let info = self.resolver.resolve(&self.query).await?;
        info!(symbol = %info.symbol, "resolved ticker");
        Ok(StateUpdate::Ticker(info))
    }
}

/// Collects the latest traded price
pub struct QuoteStage {
    provider: Arc<dyn QuoteProvider>,
}

impl QuoteStage {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage<AnalysisState> for QuoteStage {
    fn name(&self) -> &str {
        "quote"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::QUOTE]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let ticker = state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let quote = self.provider.quote(&ticker.symbol).await?;
        Ok(StateUpdate::Quote(quote))
    }
}

/// Collects recent daily price history
pub struct HistoryStage {
    provider: Arc<dyn HistoryProvider>,
}

impl HistoryStage {
    pub fn new(provider: Arc<dyn HistoryProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage<AnalysisState> for HistoryStage {
    fn name(&self) -> &str {
        "history"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::HISTORY]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let ticker = state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let history = self.provider.history(&ticker.symbol).await?;
        Ok(StateUpdate::History(history))
    }
}

/// Collects aggregated news sentiment
pub struct SentimentStage {
    provider: Arc<dyn SentimentProvider>,
}

impl SentimentStage {
    pub fn new(provider: Arc<dyn SentimentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage<AnalysisState> for SentimentStage {
    fn name(&self) -> &str {
        "sentiment"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::SENTIMENT]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let ticker = state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let sentiment = self.provider.sentiment(&ticker.symbol).await?;
        Ok(StateUpdate::Sentiment(sentiment))
    }
}

/// Collects fundamental indicators
pub struct FundamentalsStage {
    provider: Arc<dyn FundamentalsProvider>,
}

impl FundamentalsStage {
    pub fn new(provider: Arc<dyn FundamentalsProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage<AnalysisState> for FundamentalsStage {
    fn name(&self) -> &str {
        "fundamentals"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::FUNDAMENTALS]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let ticker = state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let fundamentals = self.provider.fundamentals(&ticker.symbol).await?;
        Ok(StateUpdate::Fundamentals(fundamentals))
    }
}

/// Collects the broad market regime
pub struct RegimeStage {
    provider: Arc<dyn RegimeProvider>,
}

impl RegimeStage {
    pub fn new(provider: Arc<dyn RegimeProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Stage<AnalysisState> for RegimeStage {
    fn name(&self) -> &str {
        "regime"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::REGIME]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let regime = self.provider.regime().await?;
        Ok(StateUpdate::Regime(regime))
    }
}

/// Derives series statistics, assembles the facts snapshot, and runs the
/// weighted rules over it
pub struct IndicatorStage {
    engine: RulesEngine,
    threshold: f64,
}

impl IndicatorStage {
    pub fn new(engine: RulesEngine, threshold: f64) -> Self {
        Self { engine, threshold }
    }
}

#[async_trait]
impl Stage<AnalysisState> for IndicatorStage {
    fn name(&self) -> &str {
        "indicators"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::FACTS, fields::RULE_VERDICT]
    }

    fn reads(&self) -> Vec<Field> {
        vec![
            fields::QUOTE,
            fields::HISTORY,
            fields::SENTIMENT,
            fields::FUNDAMENTALS,
        ]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let quote = state.quote.as_ref().ok_or_else(|| missing("quote"))?;
        let history = state.history.as_ref().ok_or_else(|| missing("history"))?;
        let sentiment = state
            .sentiment
            .as_ref()
            .ok_or_else(|| missing("sentiment"))?;
        let fundamentals = state
            .fundamentals
            .as_ref()
            .ok_or_else(|| missing("fundamentals"))?;

        // Derived statistics overwrite any placeholder the fundamentals
        // source supplied under the same key.
        let mut indicators = fundamentals.clone();
        indicators.extend(indicators::derive(history)?);
        indicators.insert(keys::STOCK_PRICE, quote.price);

        let facts = MarketFacts::new(indicators, sentiment.clone());
        let verdict = self.engine.evaluate(&facts, self.threshold)?;
        info!(
            recommendation = %verdict.recommendation.action,
            confidence = verdict.recommendation.confidence,
            "rules evaluated"
        );
        Ok(StateUpdate::Indicators { facts, verdict })
    }
}

/// Barrier: freezes the collected data into a prompt-ready block
pub struct SnapshotStage;

#[async_trait]
impl Stage<AnalysisState> for SnapshotStage {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::SNAPSHOT]
    }

    fn reads(&self) -> Vec<Field> {
        vec![
            fields::QUOTE,
            fields::SENTIMENT,
            fields::FACTS,
            fields::RULE_VERDICT,
            fields::REGIME,
        ]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let facts = state.facts.as_ref().ok_or_else(|| missing("facts"))?;
        state.quote.as_ref().ok_or_else(|| missing("quote"))?;
        state
            .sentiment
            .as_ref()
            .ok_or_else(|| missing("sentiment"))?;
        state
            .rule_verdict
            .as_ref()
            .ok_or_else(|| missing("rule_verdict"))?;
        state.regime.as_ref().ok_or_else(|| missing("regime"))?;

        Ok(StateUpdate::Snapshot(render_market_data(facts)))
    }
}

/// Render the facts snapshot as sorted `- key: value` lines
fn render_market_data(facts: &MarketFacts) -> String {
    let mut lines: Vec<String> = facts
        .indicators
        .iter()
        .map(|(key, value)| match value {
            FactValue::Number(n) => format!("- {key}: {n}"),
            FactValue::Text(t) => format!("- {key}: {t}"),
        })
        .collect();
    lines.sort();
    lines.push(format!(
        "- News Sentiment: {:?} (average score {:.2})",
        facts.sentiment.label, facts.sentiment.average_score
    ));
    lines.join("\n")
}

/// One persona forming its opinion
pub struct PersonaStage {
    persona: Persona,
    capability: Arc<dyn PersonaCapability>,
}

impl PersonaStage {
    pub fn new(persona: Persona, capability: Arc<dyn PersonaCapability>) -> Self {
        Self {
            persona,
            capability,
        }
    }
}

#[async_trait]
impl Stage<AnalysisState> for PersonaStage {
    fn name(&self) -> &str {
        &self.persona.name
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::OPINIONS]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::TICKER, fields::SNAPSHOT, fields::RULE_VERDICT]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let ticker = state.ticker.as_ref().ok_or_else(|| missing("ticker"))?;
        let snapshot = state.snapshot.as_ref().ok_or_else(|| missing("snapshot"))?;
        let verdict = state
            .rule_verdict
            .as_ref()
            .ok_or_else(|| missing("rule_verdict"))?;

        let ctx = PersonaContext {
            ticker: ticker.symbol.clone(),
            rule_verdict: verdict.clone(),
            market_data: snapshot.clone(),
        };
        let opinion = self.capability.deliberate(&self.persona, &ctx).await?;
        info!(
            persona = %self.persona.name,
            decision = %opinion.decision,
            confidence = opinion.confidence,
            "persona deliberated"
        );
        Ok(StateUpdate::Opinion(opinion))
    }
}

/// Integrates the collected opinions under adaptive weights
pub struct IntegrationStage {
    integrator: Mutex<ConsensusIntegrator>,
}

impl IntegrationStage {
    pub fn new(integrator: ConsensusIntegrator) -> Self {
        Self {
            integrator: Mutex::new(integrator),
        }
    }
}

#[async_trait]
impl Stage<AnalysisState> for IntegrationStage {
    fn name(&self) -> &str {
        "integration"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::CONSENSUS]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::OPINIONS, fields::REGIME]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let mut integrator = self
            .integrator
            .lock()
            .map_err(|_| Error::Other("weighting state lock poisoned".to_string()))?;
        let outcome = integrator.integrate(&state.opinions, state.regime.as_ref());
        Ok(StateUpdate::Consensus(outcome))
    }
}

/// Terminal: narrates the final report
pub struct NarrationStage {
    narrator: Arc<dyn Narrator>,
}

impl NarrationStage {
    pub fn new(narrator: Arc<dyn Narrator>) -> Self {
        Self { narrator }
    }
}

#[async_trait]
impl Stage<AnalysisState> for NarrationStage {
    fn name(&self) -> &str {
        "narration"
    }

    fn writes(&self) -> Vec<Field> {
        vec![fields::FINAL_PREDICTION]
    }

    fn reads(&self) -> Vec<Field> {
        vec![fields::CONSENSUS, fields::SNAPSHOT, fields::REGIME]
    }

    async fn run(&self, state: &AnalysisState) -> Result<StateUpdate> {
        let consensus = state
            .consensus
            .as_ref()
            .ok_or_else(|| missing("consensus"))?;
        let snapshot = state.snapshot.as_ref().ok_or_else(|| missing("snapshot"))?;
        let regime = state.regime.as_ref().ok_or_else(|| missing("regime"))?;

        let ctx = NarrationContext {
            market_data: snapshot.clone(),
            regime: *regime,
            consensus: consensus.clone(),
        };
        let prediction = self.narrator.narrate(&ctx).await?;
        info!(
            decision = %prediction.decision,
            confidence = prediction.confidence,
            "final prediction narrated"
        );
        Ok(StateUpdate::FinalPrediction(prediction))
    }
}
