//! Joins half-point-ready forward and backward labels into complete tours.
//!
//! For each vertex shared by a forward and a backward label list, candidates
//! are tried forward-cost-ascending against backward-cost-ascending (both
//! lists are already sorted that way by `LabelStore`) so the loop can break
//! out early the moment `F.cost + B.cost` can no longer beat the running
//! upper bound.

use crate::graph::{Direction, Graph};
use crate::label::Label;
use crate::label_store::LabelStore;

/// A complete elementary tour assembled from one forward and one backward
/// label meeting at a shared vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub path: Vec<usize>,
    pub cost: f64,
}

pub struct Concatenator<'g> {
    graph: &'g Graph,
}

impl<'g> Concatenator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Concatenator { graph }
    }

    /// Scans every non-source vertex for a feasible forward/backward join,
    /// keeping the cheapest. Vertex 0 is excluded: both label lists there
    /// hold only the trivial one-element initial label, which has no
    /// interior to join. `ub` bounds candidates the same way it bounds
    /// extension: a join costing `>= ub` is not an improvement and is
    /// skipped.
    pub fn best_solution(&self, store: &LabelStore, ub: f64) -> Option<Solution> {
        let mut best: Option<Solution> = None;
        let mut best_cost = ub;

        for vertex in 1..self.graph.num_nodes() {
            let forward: Vec<&Label> = store.iterate(vertex, Direction::Forward).collect();
            let backward: Vec<&Label> = store.iterate(vertex, Direction::Backward).collect();

            for f in &forward {
                if f.cost >= best_cost {
                    break; // forward list is cost-ascending: nothing cheaper follows
                }
                for b in &backward {
                    let joined_cost = f.cost + b.cost;
                    if joined_cost >= best_cost {
                        break; // backward list is cost-ascending: same argument
                    }
                    if let Some(path) = self.join(f, b) {
                        best_cost = joined_cost;
                        best = Some(Solution {
                            path,
                            cost: joined_cost,
                        });
                    }
                }
            }
        }

        best
    }

    /// Joins `f` (rooted at 0, walking forward) and `b` (rooted at 0, walking
    /// backward) at their shared vertex into one elementary cycle, or `None`
    /// if they share an interior vertex (non-elementary) or their halves
    /// can't be connected.
    fn join(&self, f: &Label, b: &Label) -> Option<Vec<usize>> {
        debug_assert_eq!(f.vertex, b.vertex);

        let res_max = self.graph.res_max();
        if f.resources
            .iter()
            .zip(b.resources.iter())
            .zip(res_max)
            .any(|((fr, br), max)| fr + br > *max)
        {
            return None;
        }

        let mut path = f.path.clone();
        path.extend(b.path.iter().rev().skip(1));

        // Both halves start at vertex 0 and meet at the joining vertex, so
        // the only vertex allowed to repeat is 0 itself, at the two ends.
        let interior = &path[1..path.len() - 1];
        let mut seen = std::collections::HashSet::with_capacity(interior.len());
        if !interior.iter().all(|v| seen.insert(*v)) {
            return None; // interior vertex shared: not elementary
        }

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::{Explorer, IterationBudget};
    use crate::lower_bound::ZeroOracle;

    #[test]
    fn two_node_negative_edge_graph_concatenates_to_minus_two() {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        b.add_edge(0, 1, -3.0, vec![1.0]).unwrap();
        b.add_edge(1, 0, 1.0, vec![1.0]).unwrap();
        let g = b.finish();

        let mut explorer = Explorer::new(&g, &ZeroOracle);
        explorer.run(f64::INFINITY, IterationBudget::unbounded()).unwrap();

        let concatenator = Concatenator::new(&g);
        let solution = concatenator
            .best_solution(explorer.store(), f64::INFINITY)
            .expect("expected a feasible tour");
        assert_eq!(solution.cost, -2.0);
        assert_eq!(solution.path, vec![0, 1, 0]);
    }

    #[test]
    fn tight_cycle_has_no_feasible_concatenation() {
        // Only one resource unit is ever available, but the round trip needs 2.
        let mut b = Graph::builder(3, 1, vec![1.0]).unwrap();
        b.add_edge(0, 1, 1.0, vec![1.0]).unwrap();
        b.add_edge(1, 2, 1.0, vec![1.0]).unwrap();
        b.add_edge(2, 0, 1.0, vec![1.0]).unwrap();
        let g = b.finish();

        let mut explorer = Explorer::new(&g, &ZeroOracle);
        explorer.run(f64::INFINITY, IterationBudget::unbounded()).unwrap();

        let concatenator = Concatenator::new(&g);
        assert!(concatenator
            .best_solution(explorer.store(), f64::INFINITY)
            .is_none());
    }

    #[test]
    fn shared_interior_vertex_is_rejected_as_non_elementary() {
        let g = Graph::builder(3, 1, vec![5.0]).unwrap().finish();
        let concatenator = Concatenator::new(&g);

        let f = Label {
            vertex: 2,
            path: vec![0, 1, 2],
            cost: 1.0,
            resources: vec![1.0],
            reachable: fixedbitset::FixedBitSet::with_capacity(3),
            half_point: true,
            direction: Direction::Forward,
            lb: 0.0,
        };
        let b = Label {
            vertex: 2,
            path: vec![0, 1, 2],
            cost: 1.0,
            resources: vec![1.0],
            reachable: fixedbitset::FixedBitSet::with_capacity(3),
            half_point: true,
            direction: Direction::Backward,
            lb: 0.0,
        };
        assert!(concatenator.join(&f, &b).is_none());
    }
}
