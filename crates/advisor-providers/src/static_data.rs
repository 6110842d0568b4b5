//! Canned market data for offline runs and tests

use crate::error::{ProviderError, Result};
use crate::traits::{
    FundamentalsProvider, HistoryProvider, QuoteProvider, RegimeProvider, SentimentProvider,
    TickerResolver,
};
use crate::types::{DailyBar, PriceHistory, Quote, TickerInfo};
use advisor_core::facts::keys;
use advisor_core::{FactMap, MarketRegime, SentimentLabel, SentimentSummary};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

const HISTORY_DAYS: i64 = 30;

/// A deterministic in-memory data source implementing every provider trait.
///
/// The default dataset describes a mildly bullish stock: a gentle uptrend
/// over thirty days, healthy fundamentals, and positive sentiment. Setters
/// let tests bend individual fields without rebuilding the rest.
#[derive(Debug, Clone)]
pub struct StaticMarketData {
    price: f64,
    bars: Vec<DailyBar>,
    sentiment: SentimentSummary,
    fundamentals: FactMap,
    regime: MarketRegime,
}

impl Default for StaticMarketData {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default();
        let bars = (0..HISTORY_DAYS)
            .map(|day| DailyBar {
                date: start + Duration::days(day),
                close: 100.0 + 0.4 * day as f64 + 0.3 * (day % 5) as f64,
                volume: 1_000_000 + 10_000 * day as u64,
            })
            .collect();

        let fundamentals = FactMap::default()
            .with(keys::PE_RATIO, 14.0)
            .with(keys::PROFIT_MARGIN, 18.0)
            .with(keys::SHORT_TERM_MA, 110.0)
            .with(keys::LONG_TERM_MA, 104.0)
            .with(keys::AVERAGE_VOLUME, 1_100_000.0)
            .with(keys::CURRENT_VOLUME, 1_250_000.0)
            .with(keys::OPERATING_CASH_FLOW, 25_000_000.0)
            .with(keys::FREE_CASH_FLOW, 12_000_000.0)
            .with(keys::CASH_FLOW_INVESTING, -8_000_000.0)
            .with(keys::CASH_FLOW_FINANCING, -3_000_000.0)
            .with(keys::NET_CHANGE_IN_CASH, 14_000_000.0);

        Self {
            price: 112.4,
            bars,
            sentiment: SentimentSummary {
                label: SentimentLabel::Positive,
                average_score: 0.4,
            },
            fundamentals,
            regime: MarketRegime::neutral(),
        }
    }
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_bars(mut self, bars: Vec<DailyBar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentSummary) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: FactMap) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn with_regime(mut self, regime: MarketRegime) -> Self {
        self.regime = regime;
        self
    }
}

#[async_trait]
impl TickerResolver for StaticMarketData {
    async fn resolve(&self, query: &str) -> Result<TickerInfo> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::InvalidTicker(query.to_string()));
        }
        // Offline mode treats the query itself as the symbol.
        Ok(TickerInfo::new(trimmed, trimmed.to_uppercase()))
    }
}

#[async_trait]
impl QuoteProvider for StaticMarketData {
    async fn quote(&self, ticker: &str) -> Result<Quote> {
        Ok(Quote {
            ticker: ticker.to_string(),
            price: self.price,
            as_of: Utc::now(),
        })
    }
}

#[async_trait]
impl HistoryProvider for StaticMarketData {
    async fn history(&self, ticker: &str) -> Result<PriceHistory> {
        if self.bars.is_empty() {
            return Err(ProviderError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "no canned history".to_string(),
            });
        }
        Ok(PriceHistory::new(ticker, self.bars.clone()))
    }
}

#[async_trait]
impl SentimentProvider for StaticMarketData {
    async fn sentiment(&self, _ticker: &str) -> Result<SentimentSummary> {
        Ok(self.sentiment.clone())
    }
}

#[async_trait]
impl FundamentalsProvider for StaticMarketData {
    async fn fundamentals(&self, _ticker: &str) -> Result<FactMap> {
        Ok(self.fundamentals.clone())
    }
}

#[async_trait]
impl RegimeProvider for StaticMarketData {
    async fn regime(&self) -> Result<MarketRegime> {
        Ok(self.regime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_dataset_is_coherent() {
        let data = StaticMarketData::new();

        let history = data.history("AAPL").await.expect("history");
        assert_eq!(history.len(), HISTORY_DAYS as usize);
        // The canned series trends upward.
        assert!(history.bars.last().map(|b| b.close) > history.bars.first().map(|b| b.close));

        let facts = data.fundamentals("AAPL").await.expect("fundamentals");
        assert!(facts.contains(keys::PE_RATIO));
        assert!(facts.contains(keys::NET_CHANGE_IN_CASH));
    }

    #[tokio::test]
    async fn test_resolver_uppercases_the_query() {
        let data = StaticMarketData::new();
        let info = data.resolve("aapl").await.expect("resolve");
        assert_eq!(info.symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_resolver_rejects_empty_query() {
        let data = StaticMarketData::new();
        assert!(matches!(
            data.resolve("  ").await,
            Err(ProviderError::InvalidTicker(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_bars_are_unavailable() {
        let data = StaticMarketData::new().with_bars(Vec::new());
        assert!(matches!(
            data.history("AAPL").await,
            Err(ProviderError::DataUnavailable { .. })
        ));
    }
}
