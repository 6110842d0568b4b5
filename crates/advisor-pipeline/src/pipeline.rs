//! Wiring for the full analysis graph

use crate::narrator::{Narrator, StubNarrator};
use crate::stages::{
    FundamentalsStage, HistoryStage, IndicatorStage, IntegrationStage, NarrationStage,
    PersonaStage, QuoteStage, RegimeStage, SentimentStage, SnapshotStage, TickerStage,
};
use crate::state::AnalysisState;
use advisor_consensus::ConsensusIntegrator;
use advisor_graph::{GraphError, StageGraph};
use advisor_personas::{
    default_personas, AdaptiveWeightingSystem, Persona, PersonaCapability, StubCapability,
};
use advisor_providers::{
    AlphaVantageClient, FundamentalsProvider, HistoryProvider, QuoteProvider, RegimeProvider,
    SentimentProvider, StaticMarketData, TickerResolver,
};
use advisor_rules::{RulesEngine, DEFAULT_THRESHOLD};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stage graph failed validation
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),

    /// The rule table failed validation
    #[error("rule table invalid: {0}")]
    Rules(#[from] advisor_core::Error),
}

/// The six data sources the collectors draw from
#[derive(Clone)]
pub struct AnalysisProviders {
    pub resolver: Arc<dyn TickerResolver>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub history: Arc<dyn HistoryProvider>,
    pub sentiment: Arc<dyn SentimentProvider>,
    pub fundamentals: Arc<dyn FundamentalsProvider>,
    pub regime: Arc<dyn RegimeProvider>,
}

impl AnalysisProviders {
    /// All six fields served from one canned dataset
    pub fn offline() -> Self {
        Self::from_static(StaticMarketData::new())
    }

    /// All six fields served from the given canned dataset
    pub fn from_static(data: StaticMarketData) -> Self {
        let shared = Arc::new(data);
        Self {
            resolver: shared.clone(),
            quotes: shared.clone(),
            history: shared.clone(),
            sentiment: shared.clone(),
            fundamentals: shared.clone(),
            regime: shared,
        }
    }

    /// Live collection through Alpha Vantage
    ///
    /// Alpha Vantage has no macro regime endpoint, so the regime comes from
    /// the given fallback source (typically a configured
    /// [`StaticMarketData`]).
    pub fn alpha_vantage(client: AlphaVantageClient, regime: Arc<dyn RegimeProvider>) -> Self {
        let shared = Arc::new(client);
        Self {
            resolver: shared.clone(),
            quotes: shared.clone(),
            history: shared.clone(),
            sentiment: shared.clone(),
            fundamentals: shared,
            regime,
        }
    }
}

/// Everything needed to assemble one analysis run
pub struct PipelineConfig {
    pub providers: AnalysisProviders,
    pub personas: Vec<Persona>,
    pub capability: Arc<dyn PersonaCapability>,
    pub narrator: Arc<dyn Narrator>,
    /// Decision threshold handed to the rule engine
    pub threshold: f64,
}

impl PipelineConfig {
    /// Fully deterministic configuration: canned data, stub personas, stub
    /// narrator
    pub fn offline() -> Self {
        Self {
            providers: AnalysisProviders::offline(),
            personas: default_personas(),
            capability: Arc::new(StubCapability::default()),
            narrator: Arc::new(StubNarrator),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Build the analysis graph for one ticker query
///
/// The layout mirrors the data flow: the ticker gate fans out to five
/// parallel collectors, price-shaped data funnels through the indicator
/// stage into the snapshot barrier, every persona deliberates off the same
/// snapshot, and integration plus narration close the run.
pub fn build_analysis_graph(
    config: &PipelineConfig,
    query: &str,
) -> Result<StageGraph<AnalysisState>, PipelineError> {
    let engine = RulesEngine::with_default_rules()?;
    let integrator = ConsensusIntegrator::new(AdaptiveWeightingSystem::new(
        config.personas.clone(),
    ));

    let mut builder = StageGraph::builder()
        .add_stage(Arc::new(TickerStage::new(
            config.providers.resolver.clone(),
            query,
        )))
        .add_stage(Arc::new(QuoteStage::new(config.providers.quotes.clone())))
        .add_stage(Arc::new(HistoryStage::new(config.providers.history.clone())))
        .add_stage(Arc::new(SentimentStage::new(
            config.providers.sentiment.clone(),
        )))
        .add_stage(Arc::new(FundamentalsStage::new(
            config.providers.fundamentals.clone(),
        )))
        .add_stage(Arc::new(RegimeStage::new(config.providers.regime.clone())))
        .add_stage(Arc::new(IndicatorStage::new(engine, config.threshold)))
        .add_stage(Arc::new(SnapshotStage))
        .add_stage(Arc::new(IntegrationStage::new(integrator)))
        .add_stage(Arc::new(NarrationStage::new(config.narrator.clone())))
        .edge("ticker", "quote")
        .edge("ticker", "history")
        .edge("ticker", "sentiment")
        .edge("ticker", "fundamentals")
        .edge("ticker", "regime")
        .edge("quote", "indicators")
        .edge("history", "indicators")
        .edge("sentiment", "indicators")
        .edge("fundamentals", "indicators")
        .edge("indicators", "snapshot")
        .edge("regime", "snapshot")
        .edge("integration", "narration");

    for persona in &config.personas {
        let name = persona.name.clone();
        builder = builder
            .add_stage(Arc::new(PersonaStage::new(
                persona.clone(),
                config.capability.clone(),
            )))
            .edge("snapshot", name.clone())
            .edge(name, "integration");
    }

    Ok(builder.build()?)
}

/// Convenience wrapper: build the graph and run it to completion
pub async fn run_analysis(
    config: &PipelineConfig,
    query: &str,
) -> Result<AnalysisState, PipelineError> {
    let graph = build_analysis_graph(config, query)?;
    Ok(graph.run(AnalysisState::default()).await?)
}
