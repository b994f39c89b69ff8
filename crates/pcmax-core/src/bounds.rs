//! Lower-bound engines over the evaluator state
//!
//! Both bounds reason about work density: between two time coordinates
//! `(ci, cj)` every task whose execution window intersects the open
//! interval must run some mandatory slice of work there. Packing `W`
//! units of mandatory work onto `m` machines inside a span of `cj - ci`
//! yields the Fernandez makespan bound; dividing by the span instead
//! yields the Fujita bound on the machine count needed to meet a
//! horizon.
//!
//! References:
//!   - Fernandez & Bussell (1973) "Bounds on the number of processors
//!     and time for multiprocessor optimal schedules"
//!   - Fujita (2011), lower bounds for makespan minimization on
//!     identical machines with precedence constraints

use crate::schedule::Schedule;

/// Deduplicated, ascending list of every `max_start` / `min_end` value.
///
/// Consecutive pair iteration over this list drives both bounds; the
/// ascending order makes every visited pair `(ci, cj)` a proper
/// interval with `ci < cj`.
fn coordinate_list(schedule: &Schedule<'_>) -> Vec<u32> {
    let n = schedule.graph().len();
    let mut coords = Vec::with_capacity(2 * n);
    for task in 0..n {
        coords.push(schedule.max_start(task));
        coords.push(schedule.min_end(task));
    }
    coords.sort_unstable();
    coords.dedup();
    coords
}

/// Mandatory work inside the open interval `(ci, cj)`.
///
/// A task contributes iff its window intersects the interval
/// (`max_start < cj` and `min_end > ci`); the contribution is capped by
/// the interval span, the task weight, and the window overlap on either
/// side.
fn work_density(schedule: &Schedule<'_>, ci: u32, cj: u32) -> u64 {
    let graph = schedule.graph();
    let mut density = 0;
    for task in 0..graph.len() {
        let max_start = schedule.max_start(task);
        let min_end = schedule.min_end(task);
        if max_start < cj && min_end > ci {
            let slice = (min_end - ci)
                .min(graph.weight(task))
                .min(cj - max_start)
                .min(cj - ci);
            density += u64::from(slice);
        }
    }
    density
}

/// Fernandez lower bound on any completion time consistent with the
/// schedule's current evaluator state.
///
/// For every coordinate pair, `q = ceil(W / m) - (cj - ci)` measures how
/// far the mandatory work overflows the interval; the bound adds the
/// worst overflow (if positive) to the critical-path length.
pub fn fernandez_bound(schedule: &Schedule<'_>) -> u32 {
    let machines = u64::from(schedule.machines());
    let coords = coordinate_list(schedule);
    let mut overflow: i64 = 0;
    for i in 0..coords.len() {
        for j in i + 1..coords.len() {
            let (ci, cj) = (coords[i], coords[j]);
            let work = work_density(schedule, ci, cj);
            let q = work.div_ceil(machines) as i64 - i64::from(cj - ci);
            overflow = overflow.max(q);
        }
    }
    schedule.graph().critical_path() + overflow as u32
}

/// Fujita bound: the minimum machine count sufficient to finish within
/// the horizon the schedule was last evaluated with.
pub fn machine_bound(schedule: &Schedule<'_>) -> u32 {
    let coords = coordinate_list(schedule);
    let mut machines: u64 = 0;
    for i in 0..coords.len() {
        for j in i + 1..coords.len() {
            let (ci, cj) = (coords[i], coords[j]);
            let work = work_density(schedule, ci, cj);
            machines = machines.max(work.div_ceil(u64::from(cj - ci)));
        }
    }
    machines as u32
}

/// Iterative Fujita lower bound on the schedule's completion time.
///
/// Doubles a horizon increment until [`machine_bound`] fits the
/// schedule's machine count, then binary-searches the last doubling
/// window for the smallest admissible horizon. Re-evaluates the
/// schedule at every probe; the caller re-evaluates afterwards if it
/// needs state at a different horizon.
pub fn fujita_bound(schedule: &mut Schedule<'_>) -> u32 {
    let crit = schedule.graph().critical_path();
    let mut delta: u32 = 1;
    loop {
        let horizon = crit.checked_add(delta).expect("fujita horizon overflow");
        schedule.evaluate(Some(horizon));
        if machine_bound(schedule) <= schedule.machines() {
            break;
        }
        delta = delta.checked_mul(2).expect("fujita horizon overflow");
    }
    let mut low = crit + delta / 2;
    let mut high = crit + delta;
    let mut best = high;
    loop {
        let mid = low + (high - low) / 2;
        if mid == low {
            break;
        }
        schedule.evaluate(Some(mid));
        if machine_bound(schedule) <= schedule.machines() {
            high = mid;
            best = best.min(mid);
        } else {
            low = mid;
        }
    }
    best
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dag::tests::diamond_graph;
    use crate::dag::TaskGraph;
    use crate::schedule::Schedule;

    /// Six independent tasks straight under the source: one five and
    /// five twos.
    pub(crate) fn five_then_twos() -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.vertex(5, &[]);
        for _ in 0..5 {
            graph.vertex(2, &[]);
        }
        graph.build();
        graph
    }

    #[test]
    fn fernandez_bound_on_independent_tasks() {
        let graph = five_then_twos();
        let mut schedule = Schedule::new(&graph, 2);
        schedule.push(graph.source());
        schedule.evaluate(None);
        assert_eq!(fernandez_bound(&schedule), 8);
    }

    #[test]
    fn fernandez_never_drops_below_the_critical_path() {
        let (graph, tasks) = diamond_graph();
        let mut schedule = Schedule::new(&graph, 2);
        schedule.push(graph.source());
        schedule.push(tasks[2]);
        schedule.evaluate(None);
        assert!(fernandez_bound(&schedule) >= graph.critical_path());
    }

    #[test]
    fn machine_bound_at_the_critical_path_horizon() {
        let graph = five_then_twos();
        let mut schedule = Schedule::new(&graph, 2);
        schedule.push(graph.source());
        schedule.evaluate(None);
        // fifteen units of work cannot fit into a five-unit horizon on
        // fewer than three machines
        assert_eq!(machine_bound(&schedule), 3);
    }

    #[test]
    fn fujita_bound_tightens_with_fewer_machines() {
        let graph = five_then_twos();

        let mut two = Schedule::new(&graph, 2);
        two.push(graph.source());
        two.evaluate(None);
        assert_eq!(fujita_bound(&mut two), 7);

        let mut three = Schedule::new(&graph, 3);
        three.push(graph.source());
        three.evaluate(None);
        assert_eq!(fujita_bound(&mut three), 6);
    }

    #[test]
    fn fujita_bound_exceeds_the_critical_path() {
        let (graph, _) = diamond_graph();
        let mut schedule = Schedule::new(&graph, 2);
        schedule.push(graph.source());
        schedule.evaluate(None);
        assert!(fujita_bound(&mut schedule) >= graph.critical_path());
    }
}
