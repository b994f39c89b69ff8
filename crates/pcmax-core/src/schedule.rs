//! Partial schedules and the list-scheduling evaluator
//!
//! A [`Schedule`] holds an ordered prefix of tasks attached to a built
//! [`TaskGraph`] and a machine count. [`Schedule::evaluate`] recomputes
//! the derived state: the list-scheduled makespan, the earliest finish
//! (`min_end`) each task can achieve given the prefix, and the latest
//! start (`max_start`) each task may take without stretching a target
//! horizon. The bound engines in [`crate::bounds`] consume that state.

use fixedbitset::FixedBitSet;

use crate::dag::TaskGraph;
use crate::TaskId;

/// An ordered prefix of tasks together with its evaluator state.
///
/// Scratch buffers are sized once from the graph and reused across
/// evaluations; the search driver pushes and pops tasks millions of
/// times over a single schedule.
#[derive(Debug, Clone)]
pub struct Schedule<'g> {
    graph: &'g TaskGraph,
    machines: u32,
    order: Vec<TaskId>,
    contains: FixedBitSet,
    length: u32,
    /// Finish time per task from the last evaluation; meaningful for
    /// scheduled tasks only.
    finish: Vec<u32>,
    min_end: Vec<u32>,
    max_start: Vec<u32>,
    assignment: Vec<u32>,
    machine_free: Vec<u32>,
}

impl<'g> Schedule<'g> {
    /// Create an empty schedule on `machines` identical machines.
    ///
    /// # Panics
    ///
    /// Panics if the graph is not built or `machines` is zero.
    pub fn new(graph: &'g TaskGraph, machines: u32) -> Self {
        assert!(graph.is_built(), "schedule requires a built graph");
        assert!(machines > 0, "at least one machine is required");
        let n = graph.len();
        Self {
            graph,
            machines,
            order: Vec::with_capacity(n),
            contains: FixedBitSet::with_capacity(n),
            length: 0,
            finish: vec![0; n],
            min_end: vec![0; n],
            max_start: vec![0; n],
            assignment: vec![u32::MAX; n],
            machine_free: vec![0; machines as usize],
        }
    }

    /// The graph this schedule is attached to.
    pub fn graph(&self) -> &'g TaskGraph {
        self.graph
    }

    /// Machine count.
    pub fn machines(&self) -> u32 {
        self.machines
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether every task of the graph is scheduled.
    pub fn is_complete(&self) -> bool {
        self.order.len() == self.graph.len()
    }

    /// The scheduled prefix in order.
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Whether a task is part of the prefix.
    pub fn contains(&self, task: TaskId) -> bool {
        assert!(task < self.graph.len(), "task {task} out of range");
        self.contains.contains(task)
    }

    /// Append a task to the prefix.
    ///
    /// # Panics
    ///
    /// Panics if the task is out of range or already scheduled.
    pub fn push(&mut self, task: TaskId) {
        assert!(task < self.graph.len(), "task {task} out of range");
        assert!(!self.contains.contains(task), "task {task} already scheduled");
        self.contains.insert(task);
        self.order.push(task);
    }

    /// Remove and return the most recently appended task.
    ///
    /// # Panics
    ///
    /// Panics if the schedule is empty.
    pub fn pop(&mut self) -> TaskId {
        let task = self.order.pop().expect("pop on an empty schedule");
        self.contains.set(task, false);
        task
    }

    /// Whether every scheduled task appears after all its predecessors.
    pub fn is_valid(&self) -> bool {
        let mut seen = FixedBitSet::with_capacity(self.graph.len());
        for &task in &self.order {
            if self.graph.preds(task).iter().any(|&p| !seen.contains(p)) {
                return false;
            }
            seen.insert(task);
        }
        true
    }

    /// List-scheduled makespan of the prefix from the last evaluation.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Earliest finish time of a task given the prefix, from the last
    /// evaluation. For scheduled tasks this is the actual finish time.
    pub fn min_end(&self, task: TaskId) -> u32 {
        self.min_end[task]
    }

    /// Latest start time of a task under the evaluation horizon, from
    /// the last evaluation.
    pub fn max_start(&self, task: TaskId) -> u32 {
        self.max_start[task]
    }

    /// Recompute the makespan and both propagations.
    ///
    /// `horizon` is the target total time for the backward pass; `None`
    /// uses the critical-path length. A horizon below the critical path
    /// is a programmer error.
    pub fn evaluate(&mut self, horizon: Option<u32>) {
        let total_time = horizon.unwrap_or_else(|| self.graph.critical_path());
        assert!(
            total_time >= self.graph.critical_path(),
            "horizon below the critical path"
        );
        self.length = self.dispatch();
        self.propagate_max_starts(total_time);
        self.propagate_min_ends();
    }

    /// Greedy list scheduling of the prefix, in sequence.
    ///
    /// Each task goes to the earliest-free machine (lowest index on
    /// ties) unless its latest-finishing predecessor gates it past that
    /// machine's free time; then it starts on the predecessor's machine
    /// at the predecessor's finish. That placement rule is part of the
    /// evaluator contract: it decides which orderings are optimal.
    fn dispatch(&mut self) -> u32 {
        let graph = self.graph;
        self.finish.fill(0);
        self.assignment.fill(u32::MAX);
        self.machine_free.fill(0);
        for &task in &self.order {
            let mut machine = 0;
            let mut start = self.machine_free[0];
            for (m, &free) in self.machine_free.iter().enumerate().skip(1) {
                if free < start {
                    machine = m;
                    start = free;
                }
            }
            let mut gate = 0;
            let mut gate_machine = 0;
            for &pred in graph.preds(task) {
                if self.finish[pred] > gate {
                    gate = self.finish[pred];
                    gate_machine = self.assignment[pred] as usize;
                }
            }
            if gate > start {
                machine = gate_machine;
                start = gate;
            }
            let end = start + graph.weight(task);
            self.assignment[task] = machine as u32;
            self.finish[task] = end;
            self.machine_free[machine] = end;
        }
        self.machine_free.iter().copied().max().unwrap_or(0)
    }

    /// Forward worklist pass: earliest finish per task.
    ///
    /// Scheduled tasks seed the worklist with their actual finish times;
    /// an unscheduled task is finalized once every predecessor is, at
    /// `weight + max` over predecessor finishes.
    fn propagate_min_ends(&mut self) {
        let graph = self.graph;
        self.min_end.fill(0);
        let mut finalized = FixedBitSet::with_capacity(graph.len());
        let mut worklist = Vec::with_capacity(graph.len());
        for &task in &self.order {
            self.min_end[task] = self.finish[task];
            finalized.insert(task);
            worklist.push(task);
        }
        while let Some(id) = worklist.pop() {
            for &succ in graph.succs(id) {
                if finalized.contains(succ) {
                    continue;
                }
                let mut max_end = 0;
                let mut complete = true;
                for &pred in graph.preds(succ) {
                    if !finalized.contains(pred) {
                        complete = false;
                        break;
                    }
                    max_end = max_end.max(self.min_end[pred]);
                }
                if complete {
                    self.min_end[succ] = graph.weight(succ) + max_end;
                    finalized.insert(succ);
                    worklist.push(succ);
                }
            }
        }
    }

    /// Backward worklist pass from the sink: latest start per task.
    ///
    /// Scheduled tasks are pinned at their actual start; the sink is
    /// pinned at the horizon. An unscheduled task is finalized once
    /// every successor is, at `min` over successor starts minus its own
    /// weight, clamped to the horizon. Afterwards every value shifts by
    /// `horizon - critical_path` so interval coordinates align with the
    /// horizon rather than the critical-path length.
    fn propagate_max_starts(&mut self, total_time: u32) {
        let graph = self.graph;
        self.max_start.fill(0);
        let mut finalized = FixedBitSet::with_capacity(graph.len());
        let mut worklist = Vec::with_capacity(graph.len());
        for &task in &self.order {
            self.max_start[task] = self.finish[task] - graph.weight(task);
            finalized.insert(task);
        }
        let sink = graph.sink();
        self.max_start[sink] = total_time;
        finalized.insert(sink);
        worklist.push(sink);
        while let Some(id) = worklist.pop() {
            for &pred in graph.preds(id) {
                if finalized.contains(pred) {
                    continue;
                }
                let mut min_start = u32::MAX;
                let mut complete = true;
                for &succ in graph.succs(pred) {
                    if !finalized.contains(succ) {
                        complete = false;
                        break;
                    }
                    min_start = min_start.min(self.max_start[succ]);
                }
                if complete {
                    self.max_start[pred] =
                        min_start.saturating_sub(graph.weight(pred)).min(total_time);
                    finalized.insert(pred);
                    worklist.push(pred);
                }
            }
        }
        let shift = total_time - graph.critical_path();
        if shift > 0 {
            for value in &mut self.max_start {
                *value += shift;
            }
        }
    }
}
