//! Alpha Vantage API client

use crate::error::{ProviderError, Result};
use crate::traits::{
    FundamentalsProvider, HistoryProvider, QuoteProvider, SentimentProvider, TickerResolver,
};
use crate::types::{DailyBar, PriceHistory, Quote, TickerInfo};
use advisor_core::facts::keys;
use advisor_core::{FactMap, SentimentLabel, SentimentSummary};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Days of daily history handed to the indicator stage
const HISTORY_WINDOW: usize = 30;

/// Alpha Vantage API client
///
/// Covers the endpoints the analysis pipeline collects from: global quote,
/// daily time series, company overview plus cash flow for fundamentals,
/// symbol search for ticker resolution, and news sentiment.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create from the ALPHA_VANTAGE_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            ProviderError::Config(
                "ALPHA_VANTAGE_API_KEY environment variable not set".to_string(),
            )
        })?;
        Ok(Self::new(api_key))
    }

    /// Issue one query and surface API-level error payloads
    async fn fetch(&self, function: &str, extra: &[(&str, &str)]) -> Result<Value> {
        let mut params = HashMap::new();
        params.insert("function", function);
        for (key, value) in extra {
            params.insert(key, value);
        }
        params.insert("apikey", &self.api_key);

        debug!(function, "querying Alpha Vantage");
        let response = self.client.get(BASE_URL).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        if let Some(error) = data.get("Error Message") {
            return Err(ProviderError::Api(error.to_string()));
        }
        if data.get("Note").is_some() {
            return Err(ProviderError::RateLimitExceeded {
                provider: "Alpha Vantage".to_string(),
            });
        }
        Ok(data)
    }
}

#[async_trait]
impl TickerResolver for AlphaVantageClient {
    async fn resolve(&self, query: &str) -> Result<TickerInfo> {
        let data = self.fetch("SYMBOL_SEARCH", &[("keywords", query)]).await?;
        parse_best_match(query, &data)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn quote(&self, ticker: &str) -> Result<Quote> {
        let data = self.fetch("GLOBAL_QUOTE", &[("symbol", ticker)]).await?;
        parse_quote(ticker, &data)
    }
}

#[async_trait]
impl HistoryProvider for AlphaVantageClient {
    async fn history(&self, ticker: &str) -> Result<PriceHistory> {
        let data = self
            .fetch(
                "TIME_SERIES_DAILY",
                &[("symbol", ticker), ("outputsize", "compact")],
            )
            .await?;
        parse_daily_series(ticker, &data)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn fundamentals(&self, ticker: &str) -> Result<FactMap> {
        let overview = self.fetch("OVERVIEW", &[("symbol", ticker)]).await?;
        if overview.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(ProviderError::InvalidTicker(ticker.to_string()));
        }
        let cash_flow = self.fetch("CASH_FLOW", &[("symbol", ticker)]).await?;
        Ok(parse_fundamentals(&overview, &cash_flow))
    }
}

#[async_trait]
impl SentimentProvider for AlphaVantageClient {
    async fn sentiment(&self, ticker: &str) -> Result<SentimentSummary> {
        let data = self
            .fetch("NEWS_SENTIMENT", &[("tickers", ticker)])
            .await?;
        parse_sentiment(ticker, &data)
    }
}

fn parse_best_match(query: &str, data: &Value) -> Result<TickerInfo> {
    let matches = data
        .get("bestMatches")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidTicker(query.to_string()))?;
    let best = matches
        .first()
        .ok_or_else(|| ProviderError::InvalidTicker(query.to_string()))?;

    let symbol = best
        .get("1. symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Api("symbol missing from search match".to_string()))?;
    let name = best
        .get("2. name")
        .and_then(Value::as_str)
        .unwrap_or(symbol);
    Ok(TickerInfo::new(name, symbol))
}

fn parse_quote(ticker: &str, data: &Value) -> Result<Quote> {
    let price = data
        .get("Global Quote")
        .and_then(|quote| quote.get("05. price"))
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| ProviderError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "no global quote".to_string(),
        })?;

    Ok(Quote {
        ticker: ticker.to_string(),
        price,
        as_of: Utc::now(),
    })
}

fn parse_daily_series(ticker: &str, data: &Value) -> Result<PriceHistory> {
    let series = data
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "no daily time series".to_string(),
        })?;

    let mut bars: Vec<DailyBar> = Vec::with_capacity(series.len());
    for (date, values) in series {
        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };
        let close = values["4. close"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0.0);
        let volume = values["5. volume"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);
        bars.push(DailyBar {
            date,
            close,
            volume,
        });
    }

    bars.sort_by_key(|bar| bar.date);
    if bars.len() > HISTORY_WINDOW {
        bars.drain(..bars.len() - HISTORY_WINDOW);
    }
    if bars.is_empty() {
        return Err(ProviderError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "daily time series was empty".to_string(),
        });
    }
    Ok(PriceHistory::new(ticker, bars))
}

fn parse_fundamentals(overview: &Value, cash_flow: &Value) -> FactMap {
    let mut facts = FactMap::new();

    if let Some(pe) = number_field(overview, "PERatio") {
        facts.insert(keys::PE_RATIO, pe);
    }
    // The overview reports margin as a fraction; the rules read percent.
    if let Some(margin) = number_field(overview, "ProfitMargin") {
        facts.insert(keys::PROFIT_MARGIN, margin * 100.0);
    }
    if let Some(ma) = number_field(overview, "50DayMovingAverage") {
        facts.insert(keys::SHORT_TERM_MA, ma);
    }
    if let Some(ma) = number_field(overview, "200DayMovingAverage") {
        facts.insert(keys::LONG_TERM_MA, ma);
    }

    if let Some(report) = cash_flow
        .get("quarterlyReports")
        .and_then(Value::as_array)
        .and_then(|reports| reports.first())
    {
        let operating = number_field(report, "operatingCashflow").unwrap_or(0.0);
        let capex = number_field(report, "capitalExpenditures").unwrap_or(0.0);
        let investing = number_field(report, "cashflowFromInvestment").unwrap_or(0.0);
        let financing = number_field(report, "cashflowFromFinancing").unwrap_or(0.0);

        facts.insert(keys::OPERATING_CASH_FLOW, operating);
        facts.insert(keys::FREE_CASH_FLOW, operating - capex);
        facts.insert(keys::CASH_FLOW_INVESTING, investing);
        facts.insert(keys::CASH_FLOW_FINANCING, financing);
        facts.insert(keys::NET_CHANGE_IN_CASH, operating + investing + financing);
    }

    facts
}

fn parse_sentiment(ticker: &str, data: &Value) -> Result<SentimentSummary> {
    let feed = data
        .get("feed")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "no news feed".to_string(),
        })?;

    let scores: Vec<f64> = feed
        .iter()
        .filter_map(|item| item.get("overall_sentiment_score"))
        .filter_map(Value::as_f64)
        .collect();
    if scores.is_empty() {
        return Ok(SentimentSummary::default());
    }

    let average_score = scores.iter().sum::<f64>() / scores.len() as f64;
    let label = if average_score > 0.15 {
        SentimentLabel::Positive
    } else if average_score < -0.15 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    Ok(SentimentSummary::new(label, average_score))
}

/// Read a field that Alpha Vantage reports as a numeric string
fn number_field(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
}
