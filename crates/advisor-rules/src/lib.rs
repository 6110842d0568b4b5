//! Weighted rule evaluation engine for advisor-rs
//!
//! The engine holds an ordered table of named, weighted rules. Each rule is
//! a pure function from a facts snapshot to a `(action, confidence,
//! reasoning)` signal; evaluation compresses confidences through
//! `exp(c - 1)`, accumulates weighted contributions into per-action
//! buckets, normalizes, and applies a Hold override when the leading score
//! falls below the decision threshold.

pub mod builtin;
pub mod engine;
pub mod verdict;

pub use engine::{RulesEngine, Signal, WeightedRule, DEFAULT_THRESHOLD};
pub use verdict::{ActionAssessment, Recommendation, RuleVerdict};
