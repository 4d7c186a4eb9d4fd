//! Bidirectional-labeling solver for the Elementary Shortest Path Problem
//! with Resource Constraints (ESPPRC): minimum-cost elementary cycle through
//! vertex 0 respecting per-resource budgets.

pub mod concatenate;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod instance;
pub mod label;
pub mod label_store;
pub mod lower_bound;
pub mod oracle;
pub mod pricing;

use std::hash::{Hash, Hasher};

use log::info;

use concatenate::Concatenator;
use error::{Result, SolveError};
use explorer::{Explorer, IterationBudget};
use graph::Graph;
use lower_bound::LowerBoundOracle;

/// A complete elementary tour, or a best-effort one if the search was cut
/// off by `IterationBudget` before proving optimality.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub path: Vec<usize>,
    pub cost: f64,
    /// `(path length, low 64 bits, high 64 bits)` of a hash over `path`, so
    /// two equal-cost tours over different vertex sequences get distinct ids.
    pub id: (usize, u64, u64),
    pub optimal: bool,
}

impl Solution {
    fn new(path: Vec<usize>, cost: f64, optimal: bool) -> Solution {
        let mut hasher_lo = std::collections::hash_map::DefaultHasher::new();
        path.hash(&mut hasher_lo);
        let lo = hasher_lo.finish();

        let mut hasher_hi = std::collections::hash_map::DefaultHasher::new();
        lo.hash(&mut hasher_hi);
        path.len().hash(&mut hasher_hi);
        let hi = hasher_hi.finish();

        Solution {
            id: (path.len(), lo, hi),
            path,
            cost,
            optimal,
        }
    }
}

/// Runs the bidirectional labeling search to completion (or until `budget`
/// cuts it off) and returns the cheapest elementary tour found.
pub fn solve(
    graph: &Graph,
    oracle: &dyn LowerBoundOracle,
    budget: IterationBudget,
) -> Result<Solution> {
    let mut explorer = Explorer::new(graph, oracle);
    let concatenator = Concatenator::new(graph);

    let mut ub = f64::INFINITY;
    let mut best = None;

    let outcome = explorer.run(ub, budget)?;
    if let Some(solution) = concatenator.best_solution(explorer.store(), ub) {
        ub = solution.cost;
        best = Some(solution);
    }
    explorer.prune_by_ub(ub);

    info!(
        "solve finished: {:?}, best cost {:?}",
        outcome,
        best.as_ref().map(|s| s.cost)
    );

    let found = best.ok_or(SolveError::Infeasible)?;
    let exhausted = matches!(outcome, explorer::RunOutcome::Exhausted);
    Ok(Solution::new(found.path, found.cost, exhausted))
}
