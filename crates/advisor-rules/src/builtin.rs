//! Built-in rule set
//!
//! The default table covers valuation, trend, volume, volatility,
//! sentiment, and cash-flow signals. Raw weights sum past 1.0 on purpose;
//! the engine rescales them proportionally at construction.

use crate::engine::{Signal, WeightedRule};
use advisor_core::facts::keys;
use advisor_core::{Action, MarketFacts, Result, SentimentLabel};

/// The default weighted rule table
pub fn default_rules() -> Vec<WeightedRule> {
    vec![
        WeightedRule::new("pe_ratio", 0.2, &[keys::PE_RATIO], pe_ratio),
        WeightedRule::new(
            "moving_average",
            0.3,
            &[keys::SHORT_TERM_MA, keys::LONG_TERM_MA],
            moving_average,
        ),
        WeightedRule::new(
            "volume_spike",
            0.15,
            &[keys::CURRENT_VOLUME, keys::AVERAGE_VOLUME],
            volume_spike,
        ),
        WeightedRule::new("profit_margin", 0.1, &[keys::PROFIT_MARGIN], profit_margin),
        WeightedRule::new("price_trend", 0.15, &[keys::PRICE_TREND], price_trend),
        WeightedRule::new(
            "support_resistance",
            0.15,
            &[keys::STOCK_PRICE, keys::SUPPORT_LEVEL, keys::RESISTANCE_LEVEL],
            support_resistance,
        ),
        WeightedRule::new("news_sentiment", 0.2, &[], news_sentiment),
        WeightedRule::new("volatility", 0.1, &[keys::VOLATILITY], volatility),
        WeightedRule::new(
            "current_price",
            0.1,
            &[keys::STOCK_PRICE, keys::AVERAGE_PRICE],
            current_price,
        ),
        WeightedRule::new(
            "operating_cash_flow",
            0.1,
            &[keys::OPERATING_CASH_FLOW],
            operating_cash_flow,
        ),
        WeightedRule::new(
            "free_cash_flow",
            0.1,
            &[keys::FREE_CASH_FLOW],
            free_cash_flow,
        ),
        WeightedRule::new(
            "cash_flow_from_investing",
            0.1,
            &[keys::CASH_FLOW_INVESTING],
            cash_flow_from_investing,
        ),
        WeightedRule::new(
            "cash_flow_from_financing",
            0.1,
            &[keys::CASH_FLOW_FINANCING],
            cash_flow_from_financing,
        ),
        WeightedRule::new(
            "net_change_in_cash",
            0.1,
            &[keys::NET_CHANGE_IN_CASH],
            net_change_in_cash,
        ),
    ]
}

fn pe_ratio(facts: &MarketFacts) -> Result<Signal> {
    let pe = facts.indicators.number(keys::PE_RATIO)?;
    if pe < 15.0 {
        Ok(Signal::new(
            Action::Buy,
            1.0,
            format!("Low P/E Ratio of {pe} indicates undervaluation."),
        ))
    } else if pe > 30.0 {
        Ok(Signal::new(
            Action::Sell,
            1.0,
            format!("High P/E Ratio of {pe} indicates overvaluation."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("P/E Ratio of {pe} is within normal range."),
        ))
    }
}

fn moving_average(facts: &MarketFacts) -> Result<Signal> {
    let short_ma = facts.indicators.number(keys::SHORT_TERM_MA)?;
    let long_ma = facts.indicators.number(keys::LONG_TERM_MA)?;
    let difference = (short_ma - long_ma) / long_ma;
    if difference > 0.05 {
        Ok(Signal::new(
            Action::Buy,
            1.0,
            format!("Short-term MA ({short_ma}) is above Long-term MA ({long_ma})."),
        ))
    } else if difference < -0.05 {
        Ok(Signal::new(
            Action::Sell,
            1.0,
            format!("Short-term MA ({short_ma}) is below Long-term MA ({long_ma})."),
        ))
    } else {
        Ok(Signal::new(Action::Hold, 0.5, "Moving Averages are neutral."))
    }
}

fn volume_spike(facts: &MarketFacts) -> Result<Signal> {
    let avg_volume = facts.indicators.number(keys::AVERAGE_VOLUME)?;
    let current_volume = facts.indicators.number(keys::CURRENT_VOLUME)?;
    if current_volume > 1.5 * avg_volume {
        Ok(Signal::new(
            Action::Buy,
            1.0,
            format!("Significant volume increase (Current: {current_volume}, Average: {avg_volume})."),
        ))
    } else if current_volume < 0.5 * avg_volume {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("Significant volume decrease (Current: {current_volume}, Average: {avg_volume})."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.3,
            format!("Normal trading volume (Current: {current_volume}, Average: {avg_volume})."),
        ))
    }
}

fn volatility(facts: &MarketFacts) -> Result<Signal> {
    let volatility = facts.indicators.number(keys::VOLATILITY)?;
    if volatility > 0.2 {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("High volatility of {volatility}."),
        ))
    } else if volatility < 0.1 {
        Ok(Signal::new(
            Action::Buy,
            0.8,
            format!("Low volatility of {volatility}."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Moderate volatility of {volatility}."),
        ))
    }
}

fn current_price(facts: &MarketFacts) -> Result<Signal> {
    let current_price = facts.indicators.number(keys::STOCK_PRICE)?;
    let average_price = facts.indicators.number(keys::AVERAGE_PRICE)?;
    if current_price < average_price * 0.9 {
        Ok(Signal::new(
            Action::Buy,
            0.7,
            format!(
                "Current price ({current_price}) is significantly lower than average price ({average_price})."
            ),
        ))
    } else if current_price > average_price * 1.1 {
        Ok(Signal::new(
            Action::Sell,
            0.7,
            format!(
                "Current price ({current_price}) is significantly higher than average price ({average_price})."
            ),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Current price ({current_price}) is close to average price ({average_price})."),
        ))
    }
}

fn profit_margin(facts: &MarketFacts) -> Result<Signal> {
    let profit_margin = facts.indicators.number(keys::PROFIT_MARGIN)?;
    if profit_margin > 20.0 {
        Ok(Signal::new(
            Action::Buy,
            0.8,
            format!("High profit margin of {profit_margin}%."),
        ))
    } else if profit_margin < 5.0 {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("Low profit margin of {profit_margin}%."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.4,
            format!("Moderate profit margin of {profit_margin}%."),
        ))
    }
}

fn price_trend(facts: &MarketFacts) -> Result<Signal> {
    let trend = facts.indicators.number(keys::PRICE_TREND)?;
    if trend > 0.1 {
        Ok(Signal::new(
            Action::Buy,
            1.0,
            format!("Positive price trend of {trend}."),
        ))
    } else if trend < -0.1 {
        Ok(Signal::new(
            Action::Sell,
            1.0,
            format!("Negative price trend of {trend}."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral price trend of {trend}."),
        ))
    }
}

fn support_resistance(facts: &MarketFacts) -> Result<Signal> {
    let current_price = facts.indicators.number(keys::STOCK_PRICE)?;
    let support = facts.indicators.number(keys::SUPPORT_LEVEL)?;
    let resistance = facts.indicators.number(keys::RESISTANCE_LEVEL)?;
    if current_price < support * 1.05 {
        Ok(Signal::new(
            Action::Buy,
            0.8,
            format!("Current price ({current_price}) is near support level ({support})."),
        ))
    } else if current_price > resistance * 0.95 {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("Current price ({current_price}) is near resistance level ({resistance})."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!(
                "Current price ({current_price}) is between support ({support}) and resistance ({resistance})."
            ),
        ))
    }
}

fn news_sentiment(facts: &MarketFacts) -> Result<Signal> {
    let label = facts.sentiment.label;
    let average_score = facts.sentiment.average_score;
    match label {
        SentimentLabel::Positive => Ok(Signal::new(
            Action::Buy,
            1.0,
            format!("Positive sentiment with an average score of {average_score}."),
        )),
        SentimentLabel::Negative => Ok(Signal::new(
            Action::Sell,
            1.0,
            format!("Negative sentiment with an average score of {average_score}."),
        )),
        SentimentLabel::Neutral => Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral sentiment with an average score of {average_score}."),
        )),
    }
}

fn operating_cash_flow(facts: &MarketFacts) -> Result<Signal> {
    let ocf = facts.indicators.number(keys::OPERATING_CASH_FLOW)?;
    if ocf > 0.0 {
        Ok(Signal::new(
            Action::Buy,
            0.8,
            format!("Positive operating cash flow of {ocf}."),
        ))
    } else if ocf < 0.0 {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("Negative operating cash flow of {ocf}."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral operating cash flow of {ocf}."),
        ))
    }
}

fn free_cash_flow(facts: &MarketFacts) -> Result<Signal> {
    let fcf = facts.indicators.number(keys::FREE_CASH_FLOW)?;
    if fcf > 0.0 {
        Ok(Signal::new(
            Action::Buy,
            0.8,
            format!("Positive free cash flow of {fcf}."),
        ))
    } else if fcf < 0.0 {
        Ok(Signal::new(
            Action::Sell,
            0.8,
            format!("Negative free cash flow of {fcf}."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral free cash flow of {fcf}."),
        ))
    }
}

fn cash_flow_from_investing(facts: &MarketFacts) -> Result<Signal> {
    let cfi = facts.indicators.number(keys::CASH_FLOW_INVESTING)?;
    if cfi < 0.0 {
        Ok(Signal::new(
            Action::Buy,
            0.6,
            format!("Negative cash flow from investing ({cfi}), indicating investment in growth."),
        ))
    } else if cfi > 0.0 {
        Ok(Signal::new(
            Action::Sell,
            0.6,
            format!("Positive cash flow from investing ({cfi}), indicating divestment of assets."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral cash flow from investing ({cfi})."),
        ))
    }
}

fn cash_flow_from_financing(facts: &MarketFacts) -> Result<Signal> {
    let cff = facts.indicators.number(keys::CASH_FLOW_FINANCING)?;
    if cff > 0.0 {
        Ok(Signal::new(
            Action::Buy,
            0.6,
            format!("Positive cash flow from financing ({cff}), indicating raising capital."),
        ))
    } else if cff < 0.0 {
        Ok(Signal::new(
            Action::Sell,
            0.6,
            format!("Negative cash flow from financing ({cff}), indicating paying off debt."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral cash flow from financing ({cff})."),
        ))
    }
}

fn net_change_in_cash(facts: &MarketFacts) -> Result<Signal> {
    let net = facts.indicators.number(keys::NET_CHANGE_IN_CASH)?;
    if net > 0.0 {
        Ok(Signal::new(
            Action::Buy,
            0.7,
            format!("Positive net change in cash ({net})."),
        ))
    } else if net < 0.0 {
        Ok(Signal::new(
            Action::Sell,
            0.7,
            format!("Negative net change in cash ({net})."),
        ))
    } else {
        Ok(Signal::new(
            Action::Hold,
            0.5,
            format!("Neutral net change in cash ({net})."),
        ))
    }
}
