//! Stage trait and field declarations

use advisor_core::Result;
use async_trait::async_trait;

/// How a stage's output is combined into the shared state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// The stage owns the field exclusively; later writes replace earlier ones
    Overwrite,
    /// The stage contributes zero-or-one element to a shared collection;
    /// contributions union commutatively and are never removed or edited
    Append,
}

/// A named field of the shared state with its merge policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    name: &'static str,
    policy: MergePolicy,
}

impl Field {
    /// Declare an overwrite field (exactly one owning stage)
    pub const fn overwrite(name: &'static str) -> Self {
        Self {
            name,
            policy: MergePolicy::Overwrite,
        }
    }

    /// Declare an append-collection field (any number of contributing stages)
    pub const fn append(name: &'static str) -> Self {
        Self {
            name,
            policy: MergePolicy::Append,
        }
    }

    /// The field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field's merge policy
    pub fn policy(&self) -> MergePolicy {
        self.policy
    }
}

/// The shared state record a graph executes over
///
/// Stages never mutate the state directly; they return an `Update` that the
/// executor merges in between awaits. `failure` converts a stage error into
/// an update so a failed stage surfaces as missing fields plus a recorded
/// failure, rather than aborting the whole run.
pub trait SharedState: Clone + Default + Send + Sync + 'static {
    /// The delta type stages produce
    type Update: Send + 'static;

    /// Apply one stage's output to the record
    fn merge(&mut self, update: Self::Update);

    /// Build the update recorded when a stage fails
    fn failure(stage: &str, error: advisor_core::Error) -> Self::Update;
}

/// A named unit of work in the graph
///
/// A stage may read only fields written by its (transitive) graph
/// predecessors; the builder enforces that `reads` is covered by the
/// predecessors' `writes` declarations. Suspension points are the external
/// calls a stage makes; the merge itself is synchronous.
#[async_trait]
pub trait Stage<S: SharedState>: Send + Sync {
    /// Unique stage name
    fn name(&self) -> &str;

    /// Fields this stage writes
    fn writes(&self) -> Vec<Field>;

    /// Fields this stage reads
    fn reads(&self) -> Vec<Field> {
        Vec::new()
    }

    /// Execute against a frozen snapshot of the shared state
    async fn run(&self, state: &S) -> Result<S::Update>;
}
