//! # pcmax-parser
//!
//! Parser for Patterson `.rcp` scheduling instances.
//!
//! The format is a whitespace-separated integer stream; line breaks are
//! conventional, not significant:
//!
//! ```text
//! n_jobs n_resources
//! <n_resources renewable capacities>
//! per job: duration  <n_resources demands>  n_successors  <successors>
//! ```
//!
//! Successors are 1-based job numbers and must be strictly greater than
//! the job that lists them (the standard topological numbering of
//! Patterson files). Resource demands are read but not retained: the
//! solver schedules on identical machines, so only the precedence
//! structure and durations matter. Jobs map one-to-one onto graph
//! identifiers (`job j` becomes task `j`; task `0` is the automatic
//! source).
//!
//! ## Example
//!
//! ```rust
//! use pcmax_parser::parse_str;
//!
//! let instance = parse_str("2 1  4  5 1 1 2  3 1 0").unwrap();
//! assert_eq!(instance.graph.len(), 4); // source, two jobs, sink
//! assert_eq!(instance.graph.critical_path(), 8);
//! ```

use std::path::Path;

use thiserror::Error;

use pcmax_core::{TaskGraph, TaskId};

/// Parsing error
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token {index}: expected {expected}, found {found:?}")]
    Syntax {
        index: usize,
        expected: &'static str,
        found: Option<String>,
    },

    #[error("job {job} lists successor {successor}, but the instance has {jobs} jobs")]
    UnknownJob {
        job: usize,
        successor: usize,
        jobs: usize,
    },

    #[error("job {job} lists itself as a successor")]
    SelfDependency { job: usize },

    #[error("job {job} lists successor {successor} with a lower number; jobs must be numbered topologically")]
    BackwardEdge { job: usize, successor: usize },
}

/// A parsed instance: the built task graph plus the renewable-resource
/// capacities the file declares (informational only).
#[derive(Debug)]
pub struct Instance {
    pub capacities: Vec<u32>,
    pub graph: TaskGraph,
}

impl Instance {
    /// Number of jobs the file declared, excluding source and sink.
    pub fn jobs(&self) -> usize {
        self.graph.len() - 2
    }
}

/// Integer token cursor with position tracking for error reporting.
struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
    index: usize,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            iter: input.split_whitespace(),
            index: 0,
        }
    }

    fn next_u32(&mut self, expected: &'static str) -> Result<u32, ParseError> {
        let index = self.index;
        self.index += 1;
        let token = self.iter.next().ok_or(ParseError::Syntax {
            index,
            expected,
            found: None,
        })?;
        token.parse().map_err(|_| ParseError::Syntax {
            index,
            expected,
            found: Some(token.to_string()),
        })
    }

    fn next_usize(&mut self, expected: &'static str) -> Result<usize, ParseError> {
        self.next_u32(expected).map(|value| value as usize)
    }
}

struct JobRecord {
    duration: u32,
    successors: Vec<usize>,
}

/// Parse an instance from a string.
pub fn parse_str(input: &str) -> Result<Instance, ParseError> {
    let mut tokens = Tokens::new(input);
    let jobs = tokens.next_usize("job count")?;
    let resources = tokens.next_usize("resource count")?;
    let mut capacities = Vec::with_capacity(resources);
    for _ in 0..resources {
        capacities.push(tokens.next_u32("resource capacity")?);
    }

    let mut records = Vec::with_capacity(jobs);
    for job in 1..=jobs {
        let duration = tokens.next_u32("job duration")?;
        for _ in 0..resources {
            tokens.next_u32("resource demand")?;
        }
        let count = tokens.next_usize("successor count")?;
        let mut successors = Vec::with_capacity(count);
        for _ in 0..count {
            let successor = tokens.next_usize("successor id")?;
            if successor == job {
                return Err(ParseError::SelfDependency { job });
            }
            if successor == 0 || successor > jobs {
                return Err(ParseError::UnknownJob {
                    job,
                    successor,
                    jobs,
                });
            }
            if successor < job {
                return Err(ParseError::BackwardEdge { job, successor });
            }
            successors.push(successor);
        }
        records.push(JobRecord {
            duration,
            successors,
        });
    }

    // invert the successor lists: the graph API takes predecessors
    let mut preds: Vec<Vec<TaskId>> = vec![Vec::new(); jobs + 1];
    for (offset, record) in records.iter().enumerate() {
        let job = offset + 1;
        for &successor in &record.successors {
            preds[successor].push(job);
        }
    }

    let mut graph = TaskGraph::new();
    for (offset, record) in records.iter().enumerate() {
        let id = graph.vertex(record.duration, &preds[offset + 1]);
        debug_assert_eq!(id, offset + 1);
    }
    graph.build();

    Ok(Instance { capacities, graph })
}

/// Parse an instance file from a path.
pub fn parse_file(path: &Path) -> Result<Instance, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_str(&content)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Five jobs; jobs 1 and 2 have no predecessors, jobs 3, 4 and 5
    /// have no successors.
    const FIVE_JOBS: &str = "\
5 1
4
3  1  1  4
8  1  2  3 5
10 1  0
2  1  0
10 1  0
";

    #[test]
    fn parses_the_five_job_instance() {
        let instance = parse_str(FIVE_JOBS).unwrap();
        let graph = &instance.graph;

        assert_eq!(instance.jobs(), 5);
        assert_eq!(instance.capacities, vec![4]);
        assert_eq!(graph.len(), 7);

        assert_eq!(graph.weight(1), 3);
        assert_eq!(graph.weight(2), 8);
        assert_eq!(graph.weight(3), 10);
        assert_eq!(graph.weight(4), 2);
        assert_eq!(graph.weight(5), 10);

        // jobs without predecessors hang off the source
        let mut roots = graph.succs(graph.source()).to_vec();
        roots.sort_unstable();
        assert_eq!(roots, vec![1, 2]);

        // jobs without successors feed the sink
        let mut exits = graph.preds(graph.sink()).to_vec();
        exits.sort_unstable();
        assert_eq!(exits, vec![3, 4, 5]);

        assert_eq!(graph.preds(3), &[2]);
        assert_eq!(graph.preds(4), &[1]);
    }

    #[test]
    fn line_structure_is_not_significant() {
        let flattened = FIVE_JOBS.split_whitespace().collect::<Vec<_>>().join(" ");
        let instance = parse_str(&flattened).unwrap();
        assert_eq!(instance.graph.len(), 7);
        assert_eq!(instance.graph.critical_path(), 18);
    }

    #[test]
    fn truncated_input_names_the_missing_token() {
        let err = parse_str("3 1 4 5 1 1").unwrap_err();
        match err {
            ParseError::Syntax {
                expected, found, ..
            } => {
                assert_eq!(expected, "successor id");
                assert_eq!(found, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_token_is_a_syntax_error() {
        let err = parse_str("two 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Syntax {
                index: 0,
                expected: "job count",
                ..
            }
        ));
    }

    #[test]
    fn successor_out_of_range_is_rejected() {
        let err = parse_str("1 0 2 1 9").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownJob {
                job: 1,
                successor: 9,
                jobs: 1
            }
        ));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let err = parse_str("1 0 2 1 1").unwrap_err();
        assert!(matches!(err, ParseError::SelfDependency { job: 1 }));
    }

    #[test]
    fn backward_edge_is_rejected() {
        let err = parse_str("2 0  5 0  3 1 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::BackwardEdge {
                job: 2,
                successor: 1
            }
        ));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = parse_file(Path::new("no/such/instance.rcp")).unwrap_err();
        assert!(err.to_string().contains("no/such/instance.rcp"));
    }
}
