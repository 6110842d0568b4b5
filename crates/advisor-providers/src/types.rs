//! Collected market data shapes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A resolved ticker symbol with its company name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub company_name: String,
    pub symbol: String,
}

impl TickerInfo {
    pub fn new(company_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Latest traded price for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub as_of: DateTime<Utc>,
}

/// One day of closing data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

/// Daily price history, ordered oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub bars: Vec<DailyBar>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Traded volumes in date order
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.volume as f64).collect()
    }
}
