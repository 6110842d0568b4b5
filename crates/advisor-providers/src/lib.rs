//! Market data providers for advisor-rs
//!
//! The pipeline collects its inputs through the async traits defined here,
//! one per collected field. Two implementations ship with the crate: a
//! canned [`StaticMarketData`] source for offline runs and tests, and an
//! [`AlphaVantageClient`] backed by the Alpha Vantage HTTP API.

pub mod alpha_vantage;
pub mod error;
pub mod static_data;
pub mod traits;
pub mod types;

pub use alpha_vantage::AlphaVantageClient;
pub use error::{ProviderError, Result};
pub use static_data::StaticMarketData;
pub use traits::{
    FundamentalsProvider, HistoryProvider, QuoteProvider, RegimeProvider, SentimentProvider,
    TickerResolver,
};
pub use types::{DailyBar, PriceHistory, Quote, TickerInfo};
