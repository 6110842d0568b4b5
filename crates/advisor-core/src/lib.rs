//! Core data model for advisor-rs
//!
//! This crate defines the types shared across the decision pipeline: the
//! Buy/Sell/Hold action vocabulary, the facts snapshot consumed by the rule
//! engine, the market regime descriptor used for adaptive persona weighting,
//! persona opinions, and the common error type.

pub mod action;
pub mod error;
pub mod facts;
pub mod opinion;
pub mod regime;

pub use action::{round2, Action, ActionScores};
pub use error::{Error, Result};
pub use facts::{FactMap, FactValue, MarketFacts, SentimentLabel, SentimentSummary};
pub use opinion::PersonaOpinion;
pub use regime::{EconomicOutlook, InterestRates, MarketRegime, Trend, Volatility};
