//! Consensus integration for advisor-rs
//!
//! Combines many weighted persona opinions into one decision. Invalid
//! input never raises: an empty opinion list, a missing regime, or zero
//! total confidence each produce an explicitly marked no-consensus
//! outcome that callers treat as "no recommendation available".

pub mod integrator;
pub mod result;

pub use integrator::{ConsensusIntegrator, CONFIDENCE_THRESHOLD};
pub use result::{ConsensusOutcome, ConsensusResult, NoConsensusReason, OpinionContribution};
