//! Persona opinion sources for advisor-rs
//!
//! A persona is a named, opinionated analyst with static traits (risk
//! tolerance, time horizon) and strategy/focus tag sets. Each persona
//! produces one decision+confidence+reasoning opinion per run through the
//! [`PersonaCapability`] boundary, which is either a live
//! OpenAI-compatible call or the deterministic stub used for offline and
//! test execution. The adaptive weighting system re-weights persona
//! opinions for the prevailing market regime before consensus.

pub mod capability;
pub mod error;
pub mod openai;
pub mod persona;
pub mod weighting;

pub use capability::{PersonaCapability, PersonaContext, StubCapability};
pub use error::{CapabilityError, Result};
pub use openai::{OpenAiCapability, OpenAiConfig};
pub use persona::{default_personas, Persona, PersonaTraits, RiskTolerance, TimeHorizon};
pub use weighting::AdaptiveWeightingSystem;
