//! The wired stock analysis workflow
//!
//! This crate assembles the full decision pipeline on top of the stage
//! graph: a ticker resolution gate fans out to five parallel collectors,
//! the indicator stage folds the collected data into a facts snapshot and
//! runs the weighted rules, a snapshot barrier freezes the record, the
//! personas deliberate concurrently, and the consensus integrator plus the
//! narrator close the run with a final prediction.

pub mod indicators;
pub mod narrator;
pub mod pipeline;
pub mod stages;
pub mod state;

pub use narrator::{FinalPrediction, NarrationContext, Narrator, OpenAiNarrator, StubNarrator};
pub use pipeline::{
    build_analysis_graph, run_analysis, AnalysisProviders, PipelineConfig, PipelineError,
};
pub use state::{AnalysisState, StageFailure, StateUpdate};
