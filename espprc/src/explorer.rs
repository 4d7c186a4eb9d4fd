//! Bidirectional extension loop: pops an open label, extends it along
//! feasible edges, stores accepted children, and stops extending a label
//! once it is half-point-ready.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::{debug, trace};
use noisy_float::types::{n64, N64};

use crate::error::Result;
use crate::graph::{Direction, Graph};
use crate::label::{ExtendOutcome, Label};
use crate::label_store::{Insertion, LabelId, LabelStore};
use crate::lower_bound::LowerBoundOracle;

/// An external iteration-count or wall-clock bound on the search (§5). When
/// exhausted, `Explorer::run` stops and whatever best solution exists so far
/// is returned as non-optimal by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationBudget {
    pub max_iterations: Option<usize>,
    pub deadline: Option<Instant>,
}

impl IterationBudget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_iterations(n: usize) -> Self {
        IterationBudget {
            max_iterations: Some(n),
            deadline: None,
        }
    }

    pub fn timeout(duration: Duration) -> Self {
        IterationBudget {
            max_iterations: None,
            deadline: Some(Instant::now() + duration),
        }
    }

    fn exhausted(&self, iterations_run: usize) -> bool {
        if let Some(max) = self.max_iterations {
            if iterations_run >= max {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        false
    }
}

struct HeapEntry {
    cost: N64,
    id: LabelId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) surfaces the cheapest label.
        other.cost.cmp(&self.cost)
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Forward => 0,
        Direction::Backward => 1,
    }
}

/// Whether exploration ran to exhaustion or was cut off by the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exhausted,
    BudgetExceeded,
}

pub struct Explorer<'g, 'o> {
    graph: &'g Graph,
    oracle: &'o dyn LowerBoundOracle,
    store: LabelStore,
    queues: [BinaryHeap<HeapEntry>; 2],
}

impl<'g, 'o> Explorer<'g, 'o> {
    pub fn new(graph: &'g Graph, oracle: &'o dyn LowerBoundOracle) -> Self {
        let mut store = LabelStore::new(graph.num_nodes());
        let mut queues: [BinaryHeap<HeapEntry>; 2] = [BinaryHeap::new(), BinaryHeap::new()];

        for direction in [Direction::Forward, Direction::Backward] {
            let initial = Label::initial(graph, direction);
            let cost = n64(initial.cost);
            if let Insertion::Accepted(id) = store.insert(initial) {
                queues[dir_index(direction)].push(HeapEntry { cost, id });
            }
        }

        Explorer {
            graph,
            oracle,
            store,
            queues,
        }
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    fn pop_next(&mut self) -> Option<(usize, HeapEntry)> {
        let front = |q: &BinaryHeap<HeapEntry>| q.peek().map(|e| e.cost);
        let dir = match (front(&self.queues[0]), front(&self.queues[1])) {
            (Some(f), Some(b)) if f <= b => 0,
            (Some(_), Some(_)) => 1,
            (Some(_), None) => 0,
            (None, Some(_)) => 1,
            (None, None) => return None,
        };
        self.queues[dir].pop().map(|e| (dir, e))
    }

    /// Runs the main extension loop until both queues are empty or `budget`
    /// is exhausted. `ub` is the current upper bound used to prune
    /// extensions; callers tighten it externally (e.g. after concatenation
    /// finds a better tour) between calls, or pass an already-tight value.
    /// Returns `Err` if any extension overflows cost or resources, which
    /// aborts the search rather than silently dropping the offending label.
    pub fn run(&mut self, ub: f64, budget: IterationBudget) -> Result<RunOutcome> {
        let mut iterations = 0usize;

        while let Some((dir, entry)) = self.pop_next() {
            if budget.exhausted(iterations) {
                debug!("explorer stopped after {} iterations: budget exceeded", iterations);
                return Ok(RunOutcome::BudgetExceeded);
            }
            iterations += 1;

            let label = match self.store.get(entry.id) {
                Some(label) => label.clone(),
                None => continue, // tombstoned since being queued
            };
            if label.half_point {
                continue; // ready for concatenation, not extended further
            }

            let direction = label.direction;
            let edges: Vec<_> = self
                .graph
                .neighbors(label.vertex, direction)
                .iter()
                .copied()
                .filter(|&e| label.reachable[self.graph.other_endpoint(e, direction)])
                .collect();

            for edge_id in edges {
                match label.extend(self.graph, edge_id, ub, self.oracle)? {
                    ExtendOutcome::Infeasible | ExtendOutcome::PrunedByUb => continue,
                    ExtendOutcome::Accepted(child) => {
                        trace!(
                            "extended {:?} label to vertex {} (cost {})",
                            direction,
                            child.vertex,
                            child.cost
                        );
                        let half_point = child.half_point;
                        let cost = n64(child.cost);
                        if let Insertion::Accepted(id) = self.store.insert(child) {
                            if !half_point {
                                self.queues[dir].push(HeapEntry { cost, id });
                            }
                        }
                    }
                }
            }
        }

        Ok(RunOutcome::Exhausted)
    }

    /// Discards every stored label (and any queued reference to it) that
    /// can no longer beat `new_ub`.
    pub fn prune_by_ub(&mut self, new_ub: f64) {
        self.store.prune_by_ub(new_ub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::lower_bound::ZeroOracle;

    #[test]
    fn explorer_runs_to_exhaustion_on_a_tiny_graph() {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        b.add_edge(0, 1, -3.0, vec![1.0]).unwrap();
        b.add_edge(1, 0, 1.0, vec![1.0]).unwrap();
        let g = b.finish();

        let mut explorer = Explorer::new(&g, &ZeroOracle);
        let outcome = explorer.run(f64::INFINITY, IterationBudget::unbounded()).unwrap();
        assert_eq!(outcome, RunOutcome::Exhausted);

        let forward: Vec<_> = explorer.store().iterate(1, Direction::Forward).collect();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].cost, -3.0);
        assert!(forward[0].half_point);
    }

    #[test]
    fn iteration_budget_stops_the_loop_early() {
        let mut b = Graph::builder(4, 1, vec![10.0]).unwrap();
        for i in 0..4u32 {
            for j in 0..4u32 {
                if i != j {
                    b.add_edge(i as usize, j as usize, 1.0, vec![1.0]).unwrap();
                }
            }
        }
        let g = b.finish();
        let mut explorer = Explorer::new(&g, &ZeroOracle);
        let outcome = explorer
            .run(f64::INFINITY, IterationBudget::max_iterations(1))
            .unwrap();
        assert_eq!(outcome, RunOutcome::BudgetExceeded);
    }
}
