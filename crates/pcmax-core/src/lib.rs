//! # pcmax-core
//!
//! Exact solver core for the precedence-constrained multiprocessor
//! scheduling problem (P|prec|Cmax): given a weighted task DAG and `m`
//! identical machines, find the task ordering whose list-scheduled
//! makespan is minimum.
//!
//! This crate provides:
//! - [`TaskGraph`]: the weighted DAG with source/sink augmentation and
//!   critical-path levels
//! - [`Schedule`]: a partial task ordering with its list-scheduling
//!   evaluator and earliest-finish / latest-start propagations
//! - Bound engines: [`fernandez_bound`], [`machine_bound`], [`fujita_bound`]
//! - [`bbsearch`]: the depth-first branch-and-bound driver
//!
//! ## Example
//!
//! ```rust
//! use pcmax_core::{bbsearch, TaskGraph};
//!
//! let mut graph = TaskGraph::new();
//! let design = graph.vertex(5, &[]);
//! let _implement = graph.vertex(2, &[design]);
//! graph.build();
//!
//! // A two-task chain keeps one machine busy for seven units no matter
//! // how many machines are available.
//! assert_eq!(bbsearch(&graph, 2, None).unwrap(), 7);
//! ```

pub mod bounds;
pub mod dag;
pub mod schedule;
pub mod search;

pub use bounds::{fernandez_bound, fujita_bound, machine_bound};
pub use dag::TaskGraph;
pub use schedule::Schedule;
pub use search::{bbsearch, bbsearch_with, BoundMode, SearchError, SearchOptions};

/// Dense task identifier.
///
/// Identifiers are assigned in insertion order: the automatic source is
/// `0`, user tasks follow, and the automatic sink is `graph.len() - 1`
/// once the graph is built.
pub type TaskId = usize;
