//! Graph construction, validation, and execution

use crate::stage::{MergePolicy, SharedState, Stage};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors raised while building or driving a stage graph
///
/// All field-ownership and dependency problems are construction-time
/// errors: a graph that builds successfully cannot race on an overwrite
/// field or read an unpopulated one at runtime.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two stages share a name
    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),

    /// An edge references a stage that was never added
    #[error("edge references unknown stage: {0}")]
    UnknownStage(String),

    /// A stage depends on itself, directly or through a cycle
    #[error("graph contains a cycle")]
    Cycle,

    /// The graph has no stages
    #[error("graph has no stages")]
    Empty,

    /// The graph must have exactly one stage with no predecessors
    #[error("graph must have exactly one entry stage, found {0}")]
    EntryCount(usize),

    /// The graph must have exactly one stage with no successors
    #[error("graph must have exactly one terminal stage, found {0}")]
    TerminalCount(usize),

    /// Two stages both claim ownership of one overwrite field
    #[error("overwrite field '{field}' claimed by both '{first}' and '{second}'")]
    OverwriteConflict {
        field: &'static str,
        first: String,
        second: String,
    },

    /// One field name declared with two different merge policies
    #[error("field '{field}' declared with conflicting merge policies")]
    PolicyConflict { field: &'static str },

    /// A stage reads a field its predecessors do not guarantee
    #[error("stage '{stage}' reads field '{field}' which is not guaranteed by its predecessors")]
    UnsatisfiedRead {
        stage: String,
        field: &'static str,
    },

    /// A spawned stage task panicked or was cancelled
    #[error("stage task failed to join: {0}")]
    Join(String),
}

/// Builder for [`StageGraph`]
pub struct GraphBuilder<S: SharedState> {
    stages: Vec<Arc<dyn Stage<S>>>,
    edges: Vec<(String, String)>,
}

impl<S: SharedState> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SharedState> GraphBuilder<S> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a stage to the graph
    pub fn add_stage(mut self, stage: Arc<dyn Stage<S>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Add a dependency edge: `to` runs only after `from` completed
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validate the declarations and produce an executable graph
    pub fn build(self) -> Result<StageGraph<S>, GraphError> {
        if self.stages.is_empty() {
            return Err(GraphError::Empty);
        }

        // Unique names
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name().to_string(), i).is_some() {
                return Err(GraphError::DuplicateStage(stage.name().to_string()));
            }
        }

        // Resolve edges, ignoring duplicates
        let n = self.stages.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for (from, to) in &self.edges {
            let from_ix = *index
                .get(from)
                .ok_or_else(|| GraphError::UnknownStage(from.clone()))?;
            let to_ix = *index
                .get(to)
                .ok_or_else(|| GraphError::UnknownStage(to.clone()))?;
            if seen.insert((from_ix, to_ix)) {
                successors[from_ix].push(to_ix);
                predecessors[to_ix].push(from_ix);
            }
        }

        // Topological order (Kahn); leftover nodes mean a cycle
        let mut indegree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
        let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut topo: Vec<usize> = Vec::with_capacity(n);
        while let Some(node) = queue.pop() {
            topo.push(node);
            for &succ in &successors[node] {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    queue.push(succ);
                }
            }
        }
        if topo.len() != n {
            return Err(GraphError::Cycle);
        }

        // One entry, one terminal
        let entries = (0..n).filter(|&i| predecessors[i].is_empty()).count();
        if entries != 1 {
            return Err(GraphError::EntryCount(entries));
        }
        let terminals = (0..n).filter(|&i| successors[i].is_empty()).count();
        if terminals != 1 {
            return Err(GraphError::TerminalCount(terminals));
        }

        // Field ownership: one writer per overwrite field, one policy per name
        let mut owners: HashMap<&'static str, (usize, MergePolicy)> = HashMap::new();
        let mut append_writers: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            for field in stage.writes() {
                match owners.get(field.name()) {
                    None => {
                        owners.insert(field.name(), (i, field.policy()));
                    }
                    Some(&(first, policy)) => {
                        if policy != field.policy() {
                            return Err(GraphError::PolicyConflict { field: field.name() });
                        }
                        if policy == MergePolicy::Overwrite {
                            return Err(GraphError::OverwriteConflict {
                                field: field.name(),
                                first: self.stages[first].name().to_string(),
                                second: stage.name().to_string(),
                            });
                        }
                    }
                }
                if field.policy() == MergePolicy::Append {
                    append_writers.entry(field.name()).or_default().push(i);
                }
            }
        }

        // Reads must be guaranteed: every writer of a read field has to be a
        // transitive predecessor, so the field is fully populated before the
        // reader starts.
        let mut reachable: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        for &node in &topo {
            for &succ in &successors[node] {
                let mut upstream: HashSet<usize> = reachable[node].clone();
                upstream.insert(node);
                reachable[succ].extend(upstream);
            }
        }
        for (i, stage) in self.stages.iter().enumerate() {
            for field in stage.reads() {
                let satisfied = match field.policy() {
                    MergePolicy::Overwrite => owners
                        .get(field.name())
                        .is_some_and(|&(owner, _)| reachable[i].contains(&owner)),
                    MergePolicy::Append => append_writers
                        .get(field.name())
                        .is_some_and(|writers| writers.iter().all(|w| reachable[i].contains(w))),
                };
                if !satisfied {
                    return Err(GraphError::UnsatisfiedRead {
                        stage: stage.name().to_string(),
                        field: field.name(),
                    });
                }
            }
        }

        Ok(StageGraph {
            stages: self.stages,
            successors,
            base_indegree: predecessors.iter().map(Vec::len).collect(),
        })
    }
}

/// An executable, validated stage graph
///
/// Running the graph consumes an initial state and returns the final state
/// after the terminal stage completed. Stage failures never abort the run:
/// the failing stage's fields stay unwritten, a failure marker is merged,
/// and downstream stages are expected to short-circuit on the missing
/// fields.
pub struct StageGraph<S: SharedState> {
    stages: Vec<Arc<dyn Stage<S>>>,
    successors: Vec<Vec<usize>>,
    base_indegree: Vec<usize>,
}

// Stage trait objects carry no Debug bound, so the graph renders as its
// stage names and edge list.
impl<S: SharedState> fmt::Debug for StageGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        let edges: Vec<(&str, &str)> = self
            .successors
            .iter()
            .enumerate()
            .flat_map(|(from, succs)| {
                succs
                    .iter()
                    .map(move |&to| (self.stages[from].name(), self.stages[to].name()))
            })
            .collect();
        f.debug_struct("StageGraph")
            .field("stages", &names)
            .field("edges", &edges)
            .finish()
    }
}

impl<S: SharedState> StageGraph<S> {
    /// Create a new graph builder
    pub fn builder() -> GraphBuilder<S> {
        GraphBuilder::new()
    }

    /// Number of stages in the graph
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the graph has no stages (never true for a built graph)
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the graph to completion
    ///
    /// Stages with no unmet dependency execute concurrently on the tokio
    /// runtime; each receives a cloned snapshot of the state as of its
    /// start. Updates merge in completion order, which is safe because
    /// overwrite fields have one owner and append merges commute.
    pub async fn run(&self, initial: S) -> Result<S, GraphError> {
        let mut state = initial;
        let mut indegree = self.base_indegree.clone();
        let mut join_set: JoinSet<(usize, advisor_core::Result<S::Update>)> = JoinSet::new();

        for idx in 0..self.stages.len() {
            if indegree[idx] == 0 {
                self.spawn(idx, &state, &mut join_set);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            let (idx, outcome) = joined.map_err(|e| GraphError::Join(e.to_string()))?;
            let name = self.stages[idx].name();
            match outcome {
                Ok(update) => {
                    debug!(stage = name, "stage completed");
                    state.merge(update);
                }
                Err(error) => {
                    warn!(stage = name, %error, "stage failed, downstream will short-circuit");
                    state.merge(S::failure(name, error));
                }
            }
            for &succ in &self.successors[idx] {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    self.spawn(succ, &state, &mut join_set);
                }
            }
        }

        info!(stages = self.stages.len(), "graph run complete");
        Ok(state)
    }

    fn spawn(
        &self,
        idx: usize,
        state: &S,
        join_set: &mut JoinSet<(usize, advisor_core::Result<S::Update>)>,
    ) {
        let stage = Arc::clone(&self.stages[idx]);
        let snapshot = state.clone();
        debug!(stage = stage.name(), "stage started");
        join_set.spawn(async move { (idx, stage.run(&snapshot).await) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Field;
    use advisor_core::Error;
    use async_trait::async_trait;

    /// Minimal state for exercising the executor
    #[derive(Debug, Clone, Default)]
    struct TestState {
        values: HashMap<String, String>,
        notes: Vec<String>,
        failures: Vec<String>,
    }

    enum TestUpdate {
        Set(String, String),
        Note(String),
        Failed(String),
        Nothing,
    }

    impl SharedState for TestState {
        type Update = TestUpdate;

        fn merge(&mut self, update: TestUpdate) {
            match update {
                TestUpdate::Set(key, value) => {
                    self.values.insert(key, value);
                }
                TestUpdate::Note(note) => self.notes.push(note),
                TestUpdate::Failed(stage) => self.failures.push(stage),
                TestUpdate::Nothing => {}
            }
        }

        fn failure(stage: &str, _error: Error) -> TestUpdate {
            TestUpdate::Failed(stage.to_string())
        }
    }

    struct SetStage {
        name: &'static str,
        field: &'static str,
        value: &'static str,
        reads: Vec<Field>,
        fail: bool,
    }

    impl SetStage {
        fn new(name: &'static str, field: &'static str, value: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                field,
                value,
                reads: Vec::new(),
                fail: false,
            })
        }

        fn reading(name: &'static str, field: &'static str, reads: Vec<Field>) -> Arc<Self> {
            Arc::new(Self {
                name,
                field,
                value: "done",
                reads,
                fail: false,
            })
        }

        fn failing(name: &'static str, field: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                field,
                value: "",
                reads: Vec::new(),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Stage<TestState> for SetStage {
        fn name(&self) -> &str {
            self.name
        }

        fn writes(&self) -> Vec<Field> {
            vec![Field::overwrite(self.field)]
        }

        fn reads(&self) -> Vec<Field> {
            self.reads.clone()
        }

        async fn run(&self, _state: &TestState) -> advisor_core::Result<TestUpdate> {
            if self.fail {
                return Err(Error::Unavailable(format!("{} exploded", self.name)));
            }
            Ok(TestUpdate::Set(self.field.to_string(), self.value.to_string()))
        }
    }

    struct NoteStage {
        name: &'static str,
    }

    #[async_trait]
    impl Stage<TestState> for NoteStage {
        fn name(&self) -> &str {
            self.name
        }

        fn writes(&self) -> Vec<Field> {
            vec![Field::append("notes")]
        }

        async fn run(&self, _state: &TestState) -> advisor_core::Result<TestUpdate> {
            Ok(TestUpdate::Note(self.name.to_string()))
        }
    }

    struct SinkStage;

    #[async_trait]
    impl Stage<TestState> for SinkStage {
        fn name(&self) -> &str {
            "sink"
        }

        fn writes(&self) -> Vec<Field> {
            vec![Field::overwrite("sink")]
        }

        fn reads(&self) -> Vec<Field> {
            vec![Field::append("notes")]
        }

        async fn run(&self, _state: &TestState) -> advisor_core::Result<TestUpdate> {
            Ok(TestUpdate::Nothing)
        }
    }

    #[tokio::test]
    async fn test_diamond_runs_all_stages() {
        let graph = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(SetStage::new("left", "b", "2"))
            .add_stage(SetStage::new("right", "c", "3"))
            .add_stage(SetStage::reading(
                "join",
                "d",
                vec![
                    Field::overwrite("b"),
                    Field::overwrite("c"),
                ],
            ))
            .edge("entry", "left")
            .edge("entry", "right")
            .edge("left", "join")
            .edge("right", "join")
            .build()
            .unwrap();

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.values.len(), 4);
        assert_eq!(state.values["d"], "done");
        assert!(state.failures.is_empty());
    }

    #[tokio::test]
    async fn test_append_contributions_all_land() {
        let graph = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(Arc::new(NoteStage { name: "n1" }))
            .add_stage(Arc::new(NoteStage { name: "n2" }))
            .add_stage(Arc::new(NoteStage { name: "n3" }))
            .add_stage(Arc::new(SinkStage))
            .edge("entry", "n1")
            .edge("entry", "n2")
            .edge("entry", "n3")
            .edge("n1", "sink")
            .edge("n2", "sink")
            .edge("n3", "sink")
            .build()
            .unwrap();

        let state = graph.run(TestState::default()).await.unwrap();
        let mut notes = state.notes.clone();
        notes.sort();
        assert_eq!(notes, vec!["n1", "n2", "n3"]);
    }

    #[tokio::test]
    async fn test_failed_stage_records_failure_and_run_completes() {
        let graph = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(SetStage::failing("boom", "b"))
            .add_stage(SetStage::new("tail", "c", "3"))
            .edge("entry", "boom")
            .edge("boom", "tail")
            .build()
            .unwrap();

        let state = graph.run(TestState::default()).await.unwrap();
        assert_eq!(state.failures, vec!["boom"]);
        // The failed stage's field is missing; the rest still ran
        assert!(!state.values.contains_key("b"));
        assert_eq!(state.values["c"], "3");
    }

    #[test]
    fn test_debug_lists_stages_and_edges() {
        let graph = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(SetStage::new("tail", "b", "2"))
            .edge("entry", "tail")
            .build()
            .unwrap();
        let rendered = format!("{graph:?}");
        assert!(rendered.contains("entry"));
        assert!(rendered.contains("tail"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = StageGraph::builder()
            .add_stage(SetStage::new("same", "a", "1"))
            .add_stage(SetStage::new("same", "b", "2"))
            .edge("same", "same")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateStage(_)));
    }

    #[test]
    fn test_rejects_cycle() {
        let err = StageGraph::builder()
            .add_stage(SetStage::new("entry", "x", "0"))
            .add_stage(SetStage::new("a", "a", "1"))
            .add_stage(SetStage::new("b", "b", "2"))
            .edge("entry", "a")
            .edge("a", "b")
            .edge("b", "a")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle));
    }

    #[test]
    fn test_rejects_two_owners_of_overwrite_field() {
        let err = StageGraph::builder()
            .add_stage(SetStage::new("first", "shared", "1"))
            .add_stage(SetStage::new("second", "shared", "2"))
            .edge("first", "second")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::OverwriteConflict { .. }));
    }

    #[test]
    fn test_rejects_multiple_entries() {
        let err = StageGraph::builder()
            .add_stage(SetStage::new("a", "a", "1"))
            .add_stage(SetStage::new("b", "b", "2"))
            .add_stage(SetStage::new("c", "c", "3"))
            .edge("a", "c")
            .edge("b", "c")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::EntryCount(2)));
    }

    #[test]
    fn test_rejects_read_not_guaranteed() {
        // "join" reads field "b" but only depends on the stage writing "a"
        let err = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(SetStage::new("side", "b", "2"))
            .add_stage(SetStage::reading(
                "join",
                "c",
                vec![Field::overwrite("b")],
            ))
            .edge("entry", "side")
            .edge("entry", "join")
            .edge("side", "terminal")
            .edge("join", "terminal")
            .add_stage(SetStage::new("terminal", "t", "4"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnsatisfiedRead { .. }));
    }

    #[test]
    fn test_rejects_append_read_before_all_writers() {
        // "sink" reads the notes collection but one contributor is not a
        // predecessor, so the collection is not guaranteed complete
        let err = StageGraph::builder()
            .add_stage(SetStage::new("entry", "a", "1"))
            .add_stage(Arc::new(NoteStage { name: "n1" }))
            .add_stage(Arc::new(NoteStage { name: "n2" }))
            .add_stage(Arc::new(SinkStage))
            .add_stage(SetStage::new("terminal", "t", "4"))
            .edge("entry", "n1")
            .edge("entry", "n2")
            .edge("n1", "sink")
            .edge("sink", "terminal")
            .edge("n2", "terminal")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnsatisfiedRead { .. }));
    }
}
