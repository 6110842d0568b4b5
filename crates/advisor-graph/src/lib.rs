//! Stage graph execution for advisor-rs
//!
//! This crate provides the execution model for the decision pipeline: a
//! directed acyclic graph of named stages over one shared, evolving state
//! record. Each stage declares the fields it reads and writes together with
//! a merge policy per written field (overwrite vs. append), the builder
//! validates the declarations at construction time, and the executor runs
//! every dependency-free stage concurrently while applying merges serially
//! between awaits, so the shared record never needs a lock.

pub mod graph;
pub mod stage;

pub use graph::{GraphBuilder, GraphError, StageGraph};
pub use stage::{Field, MergePolicy, SharedState, Stage};
