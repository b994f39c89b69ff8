//! Depth-first branch-and-bound over topological prefix extensions
//!
//! The driver owns one mutable [`Schedule`] and a ready-set bitmap. At
//! each depth it expands the ready tasks in decreasing critical-path
//! level (ties by ascending identifier, for reproducibility), pushes
//! each candidate, recurses, and backtracks. Before every descent a
//! configurable lower bound is consulted; a bound at or above the
//! incumbent prunes the subtree.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::bounds::{fernandez_bound, fujita_bound};
use crate::dag::TaskGraph;
use crate::schedule::Schedule;
use crate::TaskId;

/// Runtime failure of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The configured wall-clock deadline passed before the search
    /// finished; partial results are discarded.
    #[error("search deadline exceeded")]
    DeadlineExceeded,
}

/// Lower bound consulted before each recursive descent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundMode {
    /// No pruning beyond complete-schedule comparison.
    None,
    /// Fernandez work-density bound; cheaper per node.
    #[default]
    Fernandez,
    /// Iterative Fujita machine-bound search; tighter on wide graphs.
    FujitaIterative,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Number of identical machines, at least one.
    pub machines: u32,
    /// Lower-bound engine.
    pub bound: BoundMode,
    /// Wall-clock budget; `None` searches to completion.
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn new(machines: u32) -> Self {
        Self {
            machines,
            bound: BoundMode::default(),
            timeout: None,
        }
    }
}

/// Find the optimal list-scheduled makespan of `graph` on `machines`
/// identical machines with the default bound.
///
/// # Panics
///
/// Panics if the graph is not built or `machines` is zero.
pub fn bbsearch(
    graph: &TaskGraph,
    machines: u32,
    timeout: Option<Duration>,
) -> Result<u32, SearchError> {
    bbsearch_with(
        graph,
        &SearchOptions {
            machines,
            bound: BoundMode::default(),
            timeout,
        },
    )
}

/// [`bbsearch`] with explicit bound selection and deadline.
pub fn bbsearch_with(graph: &TaskGraph, options: &SearchOptions) -> Result<u32, SearchError> {
    assert!(graph.is_built(), "search requires a built graph");
    let started = Instant::now();
    let mut schedule = Schedule::new(graph, options.machines);
    schedule.push(graph.source());
    let mut ready = FixedBitSet::with_capacity(graph.len());
    for &succ in graph.succs(graph.source()) {
        ready.insert(succ);
    }
    let mut searcher = Searcher {
        bound: options.bound,
        deadline: options.timeout.map(|budget| started + budget),
        visited: 0,
        pruned: 0,
    };
    debug!(
        tasks = graph.len(),
        machines = options.machines,
        bound = ?options.bound,
        critical_path = graph.critical_path(),
        "starting branch-and-bound"
    );
    let outcome = searcher.run(&mut schedule, &mut ready, u32::MAX);
    debug!(
        visited = searcher.visited,
        pruned = searcher.pruned,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search finished"
    );
    outcome
}

/// Per-search context: deadline and statistics threaded through the
/// recursion, keeping `bbsearch` reentrant across graphs.
struct Searcher {
    bound: BoundMode,
    deadline: Option<Instant>,
    visited: u64,
    pruned: u64,
}

impl Searcher {
    fn run(
        &mut self,
        schedule: &mut Schedule<'_>,
        ready: &mut FixedBitSet,
        mut best: u32,
    ) -> Result<u32, SearchError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SearchError::DeadlineExceeded);
            }
        }
        self.visited += 1;
        schedule.evaluate(None);
        if schedule.is_complete() {
            return Ok(best.min(schedule.length()));
        }
        let lower = match self.bound {
            BoundMode::None => 0,
            BoundMode::Fernandez => fernandez_bound(schedule),
            BoundMode::FujitaIterative => fujita_bound(schedule),
        };
        if lower >= best {
            self.pruned += 1;
            return Ok(best);
        }

        let graph = schedule.graph();
        let mut branches: Vec<TaskId> = ready.ones().collect();
        branches.sort_unstable_by_key(|&task| (Reverse(graph.level(task)), task));
        let mut woken: Vec<TaskId> = Vec::new();
        for &task in &branches {
            schedule.push(task);
            for &succ in graph.succs(task) {
                if graph.preds(succ).iter().all(|&p| schedule.contains(p)) {
                    ready.insert(succ);
                    woken.push(succ);
                }
            }
            ready.set(task, false);

            let outcome = self.run(schedule, ready, best);

            ready.insert(task);
            for succ in woken.drain(..) {
                ready.set(succ, false);
            }
            schedule.pop();
            best = best.min(outcome?);
        }
        Ok(best)
    }
}
