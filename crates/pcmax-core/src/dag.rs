//! Weighted task graph with source/sink augmentation
//!
//! Tasks live in a contiguous table and reference each other by dense
//! integer identifier; predecessor and successor lists are plain index
//! sequences, never ownership edges. The graph is mutable while vertices
//! are inserted and frozen once [`TaskGraph::build`] runs.

use fixedbitset::FixedBitSet;

use crate::TaskId;

/// Per-task record: processing time, adjacency, critical-path level.
#[derive(Debug, Clone)]
struct Node {
    weight: u32,
    preds: Vec<TaskId>,
    succs: Vec<TaskId>,
    level: u32,
}

impl Node {
    fn new(weight: u32) -> Self {
        Self {
            weight,
            preds: Vec::new(),
            succs: Vec::new(),
            level: 0,
        }
    }
}

/// A weighted directed acyclic task graph.
///
/// A fresh graph holds only the zero-weight source (id `0`). Inserted
/// tasks that declare no dependencies are rewired as successors of the
/// source; [`build`](Self::build) appends a zero-weight sink below every
/// task that still has no successor and computes critical-path levels.
///
/// Edges always point from a lower identifier to a higher one, so cycles
/// cannot be constructed through this API.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<Node>,
    built: bool,
}

impl TaskGraph {
    /// Create an empty graph containing only the source task.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(0)],
            built: false,
        }
    }

    /// Append a task with the given processing time and dependencies.
    ///
    /// An empty `deps` slice roots the task at the source. Returns the
    /// new task's identifier.
    ///
    /// # Panics
    ///
    /// Panics if the graph is already built or if a dependency does not
    /// exist yet.
    pub fn vertex(&mut self, weight: u32, deps: &[TaskId]) -> TaskId {
        assert!(!self.built, "vertex insertion after build");
        let id = self.nodes.len();
        let source = [self.source()];
        let deps = if deps.is_empty() { &source[..] } else { deps };
        let mut node = Node::new(weight);
        for &dep in deps {
            assert!(dep < id, "dependency {dep} does not exist");
            node.preds.push(dep);
            self.nodes[dep].succs.push(id);
        }
        self.nodes.push(node);
        id
    }

    /// Freeze the graph: append the sink below every task without a
    /// successor and compute critical-path levels. Idempotent.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        let exits: Vec<TaskId> = (0..self.nodes.len())
            .filter(|&id| self.nodes[id].succs.is_empty())
            .collect();
        self.vertex(0, &exits);
        self.compute_levels();
        self.built = true;
    }

    /// Reverse topological relaxation seeded at the sink.
    ///
    /// A task is finalized once every successor carries a final level;
    /// each task is finalized exactly once, so worklist order is
    /// irrelevant.
    fn compute_levels(&mut self) {
        let sink = self.nodes.len() - 1;
        let mut finalized = FixedBitSet::with_capacity(self.nodes.len());
        let mut worklist = vec![sink];
        self.nodes[sink].level = 0;
        finalized.insert(sink);
        while let Some(id) = worklist.pop() {
            for i in 0..self.nodes[id].preds.len() {
                let pred = self.nodes[id].preds[i];
                if finalized.contains(pred) {
                    continue;
                }
                let mut max_level = 0;
                let mut complete = true;
                for j in 0..self.nodes[pred].succs.len() {
                    let succ = self.nodes[pred].succs[j];
                    if !finalized.contains(succ) {
                        complete = false;
                        break;
                    }
                    max_level = max_level.max(self.nodes[succ].level);
                }
                if complete {
                    self.nodes[pred].level = self.nodes[pred].weight + max_level;
                    finalized.insert(pred);
                    worklist.push(pred);
                }
            }
        }
    }

    /// Number of tasks, including source and (after build) sink.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A graph always contains at least the source.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether [`build`](Self::build) has run.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Identifier of the unique source task.
    pub fn source(&self) -> TaskId {
        0
    }

    /// Identifier of the unique sink task.
    pub fn sink(&self) -> TaskId {
        self.nodes.len() - 1
    }

    /// Processing time of a task.
    pub fn weight(&self, id: TaskId) -> u32 {
        self.nodes[id].weight
    }

    /// Critical-path distance from a task to the sink, inclusive of the
    /// task's own weight.
    pub fn level(&self, id: TaskId) -> u32 {
        self.nodes[id].level
    }

    /// Direct predecessors of a task.
    pub fn preds(&self, id: TaskId) -> &[TaskId] {
        &self.nodes[id].preds
    }

    /// Direct successors of a task.
    pub fn succs(&self, id: TaskId) -> &[TaskId] {
        &self.nodes[id].succs
    }

    /// Critical-path length of the whole graph: `level(source)`. A
    /// trivial lower bound on the makespan for any machine count.
    pub fn critical_path(&self) -> u32 {
        self.level(self.source())
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// The eleven-task graph used throughout the crate's tests:
    ///
    /// ```text
    /// a --> b         i
    ///        \       / \
    ///         e --> f   j --> k
    ///        /       \ /
    /// c --> d   g --> h
    /// ```
    pub(crate) fn diamond_graph() -> (TaskGraph, Vec<TaskId>) {
        let mut graph = TaskGraph::new();
        let a = graph.vertex(1, &[]);
        let b = graph.vertex(2, &[a]);
        let c = graph.vertex(3, &[]);
        let d = graph.vertex(4, &[c]);
        let e = graph.vertex(5, &[b, d]);
        let f = graph.vertex(6, &[e]);
        let g = graph.vertex(7, &[]);
        let h = graph.vertex(8, &[f, g]);
        let i = graph.vertex(9, &[f]);
        let j = graph.vertex(10, &[h, i]);
        let k = graph.vertex(11, &[j]);
        graph.build();
        (graph, vec![a, b, c, d, e, f, g, h, i, j, k])
    }

    #[test]
    fn build_augments_with_source_and_sink() {
        let (graph, tasks) = diamond_graph();
        assert_eq!(graph.len(), 13);
        assert_eq!(graph.source(), 0);
        assert_eq!(graph.sink(), 12);
        assert_eq!(graph.weight(graph.source()), 0);
        assert_eq!(graph.weight(graph.sink()), 0);
        assert_eq!(graph.weight(tasks[4]), 5);

        // a, c and g declared no dependencies, so the source feeds them.
        assert_eq!(graph.succs(graph.source()).len(), 3);
        assert!(graph.preds(graph.source()).is_empty());
        // only k had no successors at build time
        assert_eq!(graph.preds(graph.sink()), &[tasks[10]]);
        assert!(graph.succs(graph.sink()).is_empty());
    }

    #[test]
    fn levels_follow_the_critical_path() {
        let (graph, tasks) = diamond_graph();
        assert_eq!(graph.level(graph.sink()), 0);
        assert_eq!(graph.critical_path(), 48);
        assert_eq!(graph.level(tasks[6]), 36);

        // level(x) = weight(x) + max level over successors
        for id in 0..graph.len() {
            if id == graph.sink() {
                continue;
            }
            let succ_max = graph
                .succs(id)
                .iter()
                .map(|&s| graph.level(s))
                .max()
                .unwrap();
            assert_eq!(graph.level(id), graph.weight(id) + succ_max);
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        let (graph, tasks) = diamond_graph();
        let f = tasks[5];
        let h = tasks[7];
        assert_eq!(graph.succs(f).len(), 2);
        assert!(graph.succs(f).contains(&h));
        assert!(graph.succs(f).contains(&tasks[8]));
        assert_eq!(graph.preds(h).len(), 2);
        assert!(graph.preds(h).contains(&f));
        assert!(graph.preds(h).contains(&tasks[6]));
    }

    #[test]
    fn build_is_idempotent() {
        let (mut graph, _) = diamond_graph();
        let size = graph.len();
        let levels: Vec<u32> = (0..size).map(|id| graph.level(id)).collect();
        graph.build();
        assert_eq!(graph.len(), size);
        let again: Vec<u32> = (0..size).map(|id| graph.level(id)).collect();
        assert_eq!(levels, again);
    }

    #[test]
    fn lone_task_hangs_between_source_and_sink() {
        let mut graph = TaskGraph::new();
        let t = graph.vertex(4, &[]);
        graph.build();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.preds(t), &[graph.source()]);
        assert_eq!(graph.succs(t), &[graph.sink()]);
        assert_eq!(graph.critical_path(), 4);
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn unknown_dependency_is_fatal() {
        let mut graph = TaskGraph::new();
        graph.vertex(1, &[7]);
    }

    #[test]
    #[should_panic(expected = "after build")]
    fn insertion_after_build_is_fatal() {
        let mut graph = TaskGraph::new();
        graph.vertex(1, &[]);
        graph.build();
        graph.vertex(1, &[]);
    }
}
