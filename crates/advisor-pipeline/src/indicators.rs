//! Series statistics derived from daily price history
//!
//! These are the facts the built-in rules read that no provider supplies
//! directly: trend slope, volatility, support and resistance, average
//! price, and the categorical volume trend and price momentum.

use advisor_core::facts::keys;
use advisor_core::{Error, FactMap, Result};
use advisor_providers::PriceHistory;

/// Days of closing prices in the momentum short window
const MOMENTUM_WINDOW: usize = 5;

/// Derive the historical-analysis facts from a price series
///
/// Requires at least two bars; a trend slope over fewer points is
/// meaningless.
pub fn derive(history: &PriceHistory) -> Result<FactMap> {
    if history.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "price history needs at least 2 bars, got {}",
            history.len()
        )));
    }

    let prices = history.closes();
    let volumes = history.volumes();

    let mut facts = FactMap::new();
    facts.insert(keys::PRICE_TREND, trend_slope(&prices));
    facts.insert(keys::VOLATILITY, std_deviation(&prices));
    facts.insert(keys::SUPPORT_LEVEL, series_min(&prices));
    facts.insert(keys::RESISTANCE_LEVEL, series_max(&prices));
    facts.insert(keys::AVERAGE_PRICE, mean(&prices));
    facts.insert(keys::VOLUME_TREND, volume_trend(&volumes));
    facts.insert(keys::PRICE_MOMENTUM, price_momentum(&prices));
    Ok(facts)
}

/// Least-squares slope of the series against its index
fn trend_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Population standard deviation
fn std_deviation(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn series_min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn series_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Compare average volume across the two halves of the series
fn volume_trend(volumes: &[f64]) -> &'static str {
    let half = volumes.len() / 2;
    let first = mean(&volumes[..half.max(1)]);
    let second = mean(&volumes[half..]);
    if second > first * 1.1 {
        "increasing"
    } else if second < first * 0.9 {
        "decreasing"
    } else {
        "stable"
    }
}

/// Compare the recent short-window average price to the whole series
fn price_momentum(prices: &[f64]) -> &'static str {
    let window = prices.len().min(MOMENTUM_WINDOW);
    let short_term = mean(&prices[prices.len() - window..]);
    let long_term = mean(prices);
    if short_term > long_term * 1.05 {
        "strong positive"
    } else if short_term > long_term {
        "positive"
    } else if short_term < long_term * 0.95 {
        "strong negative"
    } else if short_term < long_term {
        "negative"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_providers::DailyBar;
    use chrono::NaiveDate;

    fn history(closes: &[f64], volumes: &[u64]) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| DailyBar {
                date: start + chrono::Duration::days(i as i64),
                close,
                volume,
            })
            .collect();
        PriceHistory::new("AAPL", bars)
    }

    #[test]
    fn test_rising_series_has_positive_trend() {
        let history = history(&[100.0, 102.0, 104.0, 106.0], &[1_000; 4]);
        let facts = derive(&history).expect("facts");

        // Perfectly linear series, slope is exactly the step.
        assert!((facts.number(keys::PRICE_TREND).unwrap() - 2.0).abs() < 1e-9);
        assert!((facts.number(keys::SUPPORT_LEVEL).unwrap() - 100.0).abs() < 1e-9);
        assert!((facts.number(keys::RESISTANCE_LEVEL).unwrap() - 106.0).abs() < 1e-9);
        assert!((facts.number(keys::AVERAGE_PRICE).unwrap() - 103.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_has_zero_volatility() {
        let history = history(&[50.0, 50.0, 50.0], &[1_000, 1_000, 1_000]);
        let facts = derive(&history).expect("facts");

        assert!(facts.number(keys::VOLATILITY).unwrap().abs() < 1e-12);
        assert!((facts.number(keys::PRICE_TREND).unwrap()).abs() < 1e-12);
        assert_eq!(facts.text(keys::PRICE_MOMENTUM).unwrap(), "neutral");
    }

    #[test]
    fn test_volume_trend_buckets() {
        let rising = history(&[1.0, 1.0, 1.0, 1.0], &[1_000, 1_000, 2_000, 2_000]);
        let facts = derive(&rising).expect("facts");
        assert_eq!(facts.text(keys::VOLUME_TREND).unwrap(), "increasing");

        let falling = history(&[1.0, 1.0, 1.0, 1.0], &[2_000, 2_000, 1_000, 1_000]);
        let facts = derive(&falling).expect("facts");
        assert_eq!(facts.text(keys::VOLUME_TREND).unwrap(), "decreasing");
    }

    #[test]
    fn test_too_short_series_is_rejected() {
        let single = history(&[100.0], &[1_000]);
        assert!(matches!(derive(&single), Err(Error::InvalidInput(_))));
    }
}
