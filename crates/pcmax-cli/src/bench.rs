//! Synthetic instance generators for benchmarking
//!
//! These generators build graphs programmatically without parsing, so
//! the solver can be timed in isolation. All shapes are deterministic;
//! "random" fan-in derives from the task index, keeping runs
//! reproducible without an RNG dependency.

use std::time::{Duration, Instant};

use clap::ValueEnum;

use pcmax_core::{bbsearch, SearchError, TaskGraph, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Topology {
    /// Linear chain: a single critical path, one topological order
    Chain,
    /// One fan-out task, `count` parallel tasks, one fan-in task
    Diamond,
    /// Layered DAG with index-derived cross-layer dependencies
    Web,
}

/// Build a synthetic graph of roughly `count` tasks.
pub fn generate(topology: Topology, count: usize) -> TaskGraph {
    match topology {
        Topology::Chain => generate_chain(count),
        Topology::Diamond => generate_diamond(count),
        Topology::Web => generate_web(count),
    }
}

fn generate_chain(count: usize) -> TaskGraph {
    let mut graph = TaskGraph::new();
    let mut previous: Option<TaskId> = None;
    for index in 0..count {
        let deps: Vec<TaskId> = previous.into_iter().collect();
        previous = Some(graph.vertex((index % 5 + 1) as u32, &deps));
    }
    graph.build();
    graph
}

fn generate_diamond(count: usize) -> TaskGraph {
    let mut graph = TaskGraph::new();
    let head = graph.vertex(1, &[]);
    let middle: Vec<TaskId> = (0..count)
        .map(|index| graph.vertex((index % 3 + 1) as u32, &[head]))
        .collect();
    graph.vertex(1, &middle);
    graph.build();
    graph
}

fn generate_web(count: usize) -> TaskGraph {
    let mut graph = TaskGraph::new();
    let layer_size = (count as f64).sqrt().ceil() as usize;
    let mut previous: Vec<TaskId> = Vec::new();
    let mut current: Vec<TaskId> = Vec::new();
    for index in 0..count {
        let mut deps: Vec<TaskId> = Vec::new();
        if !previous.is_empty() {
            // one to three dependencies into the previous layer
            for pick in 0..=(index % 3) {
                deps.push(previous[(index * 7 + pick * 3) % previous.len()]);
            }
            deps.sort_unstable();
            deps.dedup();
        }
        let id = graph.vertex((index % 9 + 1) as u32, &deps);
        current.push(id);
        if current.len() == layer_size {
            previous = std::mem::take(&mut current);
        }
    }
    graph.build();
    graph
}

/// Time `bbsearch` on the requested topology and print a result table.
pub fn run(topology: Topology, count: usize, machines: u32, timeout: Duration, series: bool) {
    let sizes: Vec<usize> = if series {
        (1..=4).map(|step| count * step / 4).filter(|&n| n > 0).collect()
    } else {
        vec![count]
    };

    println!(
        "{:>8}  {:>6}  {:>9}  {:>9}  {:>10}  {}",
        "tasks", "m", "crit", "makespan", "elapsed", "status"
    );
    for size in sizes {
        let graph = generate(topology, size);
        let started = Instant::now();
        let outcome = bbsearch(&graph, machines, Some(timeout));
        let elapsed = started.elapsed();
        let (makespan, status) = match outcome {
            Ok(makespan) => (makespan.to_string(), "OPTIMAL"),
            Err(SearchError::DeadlineExceeded) => ("-".to_string(), "TIMEOUT"),
        };
        println!(
            "{:>8}  {:>6}  {:>9}  {:>9}  {:>8.1}ms  {}",
            size,
            machines,
            graph.critical_path(),
            makespan,
            elapsed.as_secs_f64() * 1000.0,
            status
        );
    }
}
