//! The facts snapshot consumed by the rule engine
//!
//! A [`FactMap`] is a flat mapping from fact name to numeric or textual
//! value, assembled from fundamental indicators and derived series
//! statistics. Lookups fail hard: a rule that asks for an absent fact gets
//! [`Error::MissingFact`](crate::Error::MissingFact), never a default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known fact keys used by the built-in rules
pub mod keys {
    /// Price-to-earnings ratio
    pub const PE_RATIO: &str = "P/E Ratio";
    /// Short-term moving average of the closing price
    pub const SHORT_TERM_MA: &str = "Short-term MA";
    /// Long-term moving average of the closing price
    pub const LONG_TERM_MA: &str = "Long-term MA";
    /// Average daily trading volume
    pub const AVERAGE_VOLUME: &str = "Average Volume";
    /// Most recent daily trading volume
    pub const CURRENT_VOLUME: &str = "Current Volume";
    /// Annualized return volatility
    pub const VOLATILITY: &str = "Volatility";
    /// Latest traded price
    pub const STOCK_PRICE: &str = "stock_price";
    /// Average closing price over the collected series
    pub const AVERAGE_PRICE: &str = "Average Price";
    /// Net profit margin in percent
    pub const PROFIT_MARGIN: &str = "Profit Margin";
    /// Least-squares slope of the closing price series
    pub const PRICE_TREND: &str = "Price Trend";
    /// Series low, used as a support level
    pub const SUPPORT_LEVEL: &str = "Support Level";
    /// Series high, used as a resistance level
    pub const RESISTANCE_LEVEL: &str = "Resistance Level";
    /// Operating cash flow from the latest statement
    pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
    /// Free cash flow from the latest statement
    pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
    /// Cash flow from investing activities
    pub const CASH_FLOW_INVESTING: &str = "Cash Flow from Investing";
    /// Cash flow from financing activities
    pub const CASH_FLOW_FINANCING: &str = "Cash Flow from Financing";
    /// Net change in cash position
    pub const NET_CHANGE_IN_CASH: &str = "Net Change in Cash";
    /// Direction of traded volume over the series, as text
    pub const VOLUME_TREND: &str = "Volume Trend";
    /// Short-vs-long average price momentum, as text
    pub const PRICE_MOMENTUM: &str = "Price Momentum";
}

/// A single fact value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

/// Mapping from fact name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactMap {
    facts: HashMap<String, FactValue>,
}

impl FactMap {
    /// Create an empty fact map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact, replacing any previous value for the same name
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FactValue>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Absorb all facts from another map (other values override)
    pub fn extend(&mut self, other: FactMap) {
        self.facts.extend(other.facts);
    }

    /// Look up a raw fact value
    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    /// Look up a numeric fact, failing hard when absent or non-numeric
    pub fn number(&self, key: &str) -> Result<f64> {
        match self.facts.get(key) {
            Some(FactValue::Number(n)) => Ok(*n),
            Some(FactValue::Text(_)) => Err(Error::NonNumericFact(key.to_string())),
            None => Err(Error::MissingFact(key.to_string())),
        }
    }

    /// Look up a textual fact, failing hard when absent
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.facts.get(key) {
            Some(FactValue::Text(s)) => Ok(s.as_str()),
            Some(FactValue::Number(_)) => Err(Error::InvalidInput(format!(
                "fact is numeric, expected text: {key}"
            ))),
            None => Err(Error::MissingFact(key.to_string())),
        }
    }

    /// Check whether a fact is present
    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    /// Number of facts in the map
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate over all facts
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.facts.iter()
    }
}

/// Overall news sentiment label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// Aggregated news sentiment for a ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Overall sentiment direction
    pub label: SentimentLabel,
    /// Mean sentiment score across scanned articles, in [-1, 1]
    pub average_score: f64,
}

impl SentimentSummary {
    pub fn new(label: SentimentLabel, average_score: f64) -> Self {
        Self {
            label,
            average_score,
        }
    }
}

/// The full facts snapshot handed to the rule engine
///
/// Frozen once the collection barrier passes; the engine reads it,
/// never writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFacts {
    /// Named numeric/categorical indicators
    pub indicators: FactMap,
    /// Aggregated news sentiment
    pub sentiment: SentimentSummary,
}

impl MarketFacts {
    pub fn new(indicators: FactMap, sentiment: SentimentSummary) -> Self {
        Self {
            indicators,
            sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_lookup() {
        let facts = FactMap::new().with(keys::PE_RATIO, 14.2);
        assert!((facts.number(keys::PE_RATIO).unwrap() - 14.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_fact_is_hard_failure() {
        let facts = FactMap::new();
        let err = facts.number(keys::PE_RATIO).unwrap_err();
        assert!(matches!(err, Error::MissingFact(_)));
    }

    #[test]
    fn test_non_numeric_fact() {
        let facts = FactMap::new().with("sector", "Technology");
        let err = facts.number("sector").unwrap_err();
        assert!(matches!(err, Error::NonNumericFact(_)));
        assert_eq!(facts.text("sector").unwrap(), "Technology");
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = FactMap::new().with(keys::STOCK_PRICE, 100.0);
        let update = FactMap::new().with(keys::STOCK_PRICE, 101.5);
        base.extend(update);
        assert!((base.number(keys::STOCK_PRICE).unwrap() - 101.5).abs() < 1e-12);
    }

    #[test]
    fn test_sentiment_default_is_neutral() {
        let sentiment = SentimentSummary::default();
        assert_eq!(sentiment.label, SentimentLabel::Neutral);
        assert!(sentiment.average_score.abs() < 1e-12);
    }
}
