//! Command-line interface for advisor-rs

use advisor_consensus::ConsensusOutcome;
use advisor_personas::{default_personas, OpenAiCapability};
use advisor_pipeline::{
    run_analysis, AnalysisProviders, AnalysisState, FinalPrediction, OpenAiNarrator,
    PipelineConfig, StageFailure,
};
use advisor_providers::{AlphaVantageClient, StaticMarketData};
use advisor_rules::{RuleVerdict, DEFAULT_THRESHOLD};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Buy/Sell/Hold decision aggregation for stock tickers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis pipeline for one ticker
    Analyze {
        /// Ticker symbol or company name to analyze
        ticker: String,

        /// Use canned data and stub personas instead of live services
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Decision threshold for the rule engine
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Everything the run produced, in one serializable report
#[derive(Debug, Serialize)]
struct AnalysisReport {
    ticker: Option<String>,
    price: Option<f64>,
    rule_verdict: Option<RuleVerdict>,
    opinions: Vec<advisor_core::PersonaOpinion>,
    consensus: Option<ConsensusOutcome>,
    final_prediction: Option<FinalPrediction>,
    failures: Vec<StageFailure>,
}

impl AnalysisReport {
    fn from_state(state: AnalysisState) -> Self {
        Self {
            ticker: state.ticker.map(|t| t.symbol),
            price: state.quote.map(|q| q.price),
            rule_verdict: state.rule_verdict,
            opinions: state.opinions,
            consensus: state.consensus,
            final_prediction: state.final_prediction,
            failures: state.failures,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    advisor_utils::init_tracing();

    let args = Args::parse();
    match args.command {
        Command::Analyze {
            ticker,
            offline,
            format,
            threshold,
        } => analyze(&ticker, offline, format, threshold).await,
    }
}

async fn analyze(ticker: &str, offline: bool, format: Format, threshold: f64) -> anyhow::Result<()> {
    let mut config = if offline {
        info!("running offline with canned data");
        PipelineConfig::offline()
    } else {
        live_config()?
    };
    config.threshold = threshold;

    let state = run_analysis(&config, ticker).await?;
    let report = AnalysisReport::from_state(state);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_report(&report),
    }
    Ok(())
}

fn live_config() -> anyhow::Result<PipelineConfig> {
    let market = AlphaVantageClient::from_env()
        .context("live mode needs an Alpha Vantage API key (or pass --offline)")?;
    let capability = OpenAiCapability::from_env()
        .context("live mode needs an OpenAI API key (or pass --offline)")?;
    let narrator = OpenAiNarrator::from_env()
        .context("live mode needs an OpenAI API key (or pass --offline)")?;

    Ok(PipelineConfig {
        // No live macro feed; the regime falls back to neutral canned data.
        providers: AnalysisProviders::alpha_vantage(market, Arc::new(StaticMarketData::new())),
        personas: default_personas(),
        capability: Arc::new(capability),
        narrator: Arc::new(narrator),
        threshold: DEFAULT_THRESHOLD,
    })
}

fn print_report(report: &AnalysisReport) {
    if let Some(ticker) = &report.ticker {
        println!("Ticker: {ticker}");
    }
    if let Some(price) = report.price {
        println!("Price: {price:.2}");
    }
    if let Some(verdict) = &report.rule_verdict {
        println!("\nRule engine:");
        print!("{}", verdict.summary());
    }
    if !report.opinions.is_empty() {
        println!("\nPersona opinions:");
        for opinion in &report.opinions {
            println!(
                "  {} -> {} (confidence {:.2})",
                opinion.agent, opinion.decision, opinion.confidence
            );
        }
    }
    if let Some(outcome) = &report.consensus {
        println!("\nConsensus:");
        println!("{}", outcome.summary());
    }
    if let Some(prediction) = &report.final_prediction {
        println!("Final prediction: {} (confidence {:.2})", prediction.decision, prediction.confidence);
        println!("{}", prediction.reasoning);
    }
    if !report.failures.is_empty() {
        println!("\nStage failures:");
        for failure in &report.failures {
            println!("  {}: {}", failure.stage, failure.error);
        }
    }
}
