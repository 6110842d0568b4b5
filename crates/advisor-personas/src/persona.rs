//! Persona definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy and focus tags the adaptive weighting system reacts to
pub mod tags {
    pub const GROWTH: &str = "growth";
    pub const MOMENTUM: &str = "momentum";
    pub const VALUE: &str = "value";
    pub const DEFENSIVE: &str = "defensive";
    pub const INCOME: &str = "income";
    pub const BONDS: &str = "bonds";
    pub const CYCLICAL: &str = "cyclical";
}

/// How much risk a persona is willing to take
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTolerance::Low => write!(f, "Low"),
            RiskTolerance::Medium => write!(f, "Medium"),
            RiskTolerance::High => write!(f, "High"),
        }
    }
}

/// The investment horizon a persona reasons over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeHorizon::Short => write!(f, "Short"),
            TimeHorizon::Medium => write!(f, "Medium"),
            TimeHorizon::Long => write!(f, "Long"),
        }
    }
}

/// Static traits of a persona
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaTraits {
    pub risk_tolerance: RiskTolerance,
    pub time_horizon: TimeHorizon,
}

/// A named opinion source with fixed traits and tag sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub traits: PersonaTraits,
    /// Strategy tags, e.g. "momentum" or "defensive"
    pub strategy: Vec<String>,
    /// Focus tags, e.g. "growth" or "value"
    pub focus: Vec<String>,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        traits: PersonaTraits,
        strategy: &[&str],
        focus: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            traits,
            strategy: strategy.iter().map(ToString::to_string).collect(),
            focus: focus.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether the persona carries a strategy tag
    pub fn has_strategy(&self, tag: &str) -> bool {
        self.strategy.iter().any(|s| s == tag)
    }

    /// Whether the persona carries a focus tag
    pub fn has_focus(&self, tag: &str) -> bool {
        self.focus.iter().any(|f| f == tag)
    }
}

/// The four default personas
pub fn default_personas() -> Vec<Persona> {
    vec![
        Persona::new(
            "Value Investor",
            PersonaTraits {
                risk_tolerance: RiskTolerance::Low,
                time_horizon: TimeHorizon::Long,
            },
            &[tags::VALUE, tags::DEFENSIVE],
            &[tags::VALUE, tags::INCOME],
        ),
        Persona::new(
            "Momentum Trader",
            PersonaTraits {
                risk_tolerance: RiskTolerance::High,
                time_horizon: TimeHorizon::Short,
            },
            &[tags::MOMENTUM],
            &[tags::GROWTH, tags::MOMENTUM],
        ),
        Persona::new(
            "Sector Specialist",
            PersonaTraits {
                risk_tolerance: RiskTolerance::Medium,
                time_horizon: TimeHorizon::Medium,
            },
            &[tags::MOMENTUM, tags::VALUE],
            &[tags::CYCLICAL, tags::GROWTH],
        ),
        Persona::new(
            "Global Macro Strategist",
            PersonaTraits {
                risk_tolerance: RiskTolerance::Medium,
                time_horizon: TimeHorizon::Long,
            },
            &[tags::DEFENSIVE],
            &[tags::BONDS, tags::INCOME],
        ),
    ]
}
