//! Provider traits, one per collected field
//!
//! The pipeline depends on these traits rather than concrete clients, so an
//! offline run swaps in [`crate::StaticMarketData`] without touching any
//! stage code. Every method returns [`crate::error::Result`]; a failure
//! surfaces to the pipeline as the field being unavailable.

use crate::error::Result;
use crate::types::{PriceHistory, Quote, TickerInfo};
use advisor_core::{FactMap, MarketRegime, SentimentSummary};
use async_trait::async_trait;

/// Resolves a free-form company query to a ticker symbol
#[async_trait]
pub trait TickerResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<TickerInfo>;
}

/// Supplies the latest traded price
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, ticker: &str) -> Result<Quote>;
}

/// Supplies recent daily price history
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn history(&self, ticker: &str) -> Result<PriceHistory>;
}

/// Supplies aggregated news sentiment
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn sentiment(&self, ticker: &str) -> Result<SentimentSummary>;
}

/// Supplies fundamental indicators keyed by fact name
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fundamentals(&self, ticker: &str) -> Result<FactMap>;
}

/// Supplies the broad market regime
#[async_trait]
pub trait RegimeProvider: Send + Sync {
    async fn regime(&self) -> Result<MarketRegime>;
}
