//! Immutable-once-extended partial path state.

use fixedbitset::FixedBitSet;

use crate::error::{Result, SolveError};
use crate::graph::{Direction, EdgeId, Graph};
use crate::lower_bound::LowerBoundOracle;

#[derive(Debug, Clone)]
pub struct Label {
    pub vertex: usize,
    pub path: Vec<usize>,
    pub cost: f64,
    pub resources: Vec<f64>,
    pub reachable: FixedBitSet,
    pub half_point: bool,
    pub direction: Direction,
    pub lb: f64,
}

/// Outcome of extending a label along one edge.
pub enum ExtendOutcome {
    /// Resource bounds were violated, or the edge would revisit a vertex.
    Infeasible,
    /// Feasible but `cost + LB > UB`: pruning still discards it.
    PrunedByUb,
    Accepted(Label),
}

impl Label {
    /// `path = [0]`, zero cost and resources, every other vertex reachable.
    pub fn initial(graph: &Graph, direction: Direction) -> Label {
        let mut reachable = FixedBitSet::with_capacity(graph.num_nodes());
        reachable.insert_range(..);
        reachable.set(0, false);
        Label {
            vertex: 0,
            path: vec![0],
            cost: 0.0,
            resources: vec![0.0; graph.num_res()],
            reachable,
            half_point: false,
            direction,
            lb: 0.0,
        }
    }

    /// Grows `self` along `edge_id`, which must be incident to `self.vertex`
    /// on the side matching `self.direction` and whose other endpoint
    /// `self.reachable` marks as still reachable.
    pub fn extend(
        &self,
        graph: &Graph,
        edge_id: EdgeId,
        ub: f64,
        oracle: &dyn LowerBoundOracle,
    ) -> Result<ExtendOutcome> {
        let edge = graph.edge(edge_id);
        let w = graph.other_endpoint(edge_id, self.direction);

        debug_assert!(
            match self.direction {
                Direction::Forward => edge.from == self.vertex,
                Direction::Backward => edge.to == self.vertex,
            },
            "edge is not incident to the label's current vertex"
        );
        debug_assert!(
            self.reachable[w],
            "extending into a vertex the label has already marked unreachable"
        );

        if w == self.vertex || self.path.contains(&w) {
            return Ok(ExtendOutcome::Infeasible);
        }

        let mut resources = self.resources.clone();
        for (acc, delta) in resources.iter_mut().zip(edge.resources.iter()) {
            *acc += delta;
        }
        if resources.iter().any(|r| !r.is_finite()) {
            return Err(SolveError::ResourceOverflow);
        }
        let res_max = graph.res_max();
        if resources.iter().zip(res_max).any(|(r, max)| r > max) {
            return Ok(ExtendOutcome::Infeasible);
        }

        let mut path = self.path.clone();
        path.push(w);

        let mut reachable = self.reachable.clone();
        reachable.set(w, false);

        // Any vertex u whose only remaining edge from w would overflow a
        // resource bound can never again be extended into: disable it now
        // so later dominance/LB computations see the tightened set.
        for &out_edge in graph.neighbors(w, self.direction) {
            let candidate = graph.edge(out_edge);
            let u = graph.other_endpoint(out_edge, self.direction);
            let overflows = resources
                .iter()
                .zip(candidate.resources.iter())
                .zip(res_max)
                .any(|((r, delta), max)| r + delta > *max);
            if overflows {
                reachable.set(u, false);
            }
        }

        let cost = self.cost + edge.cost;
        if !cost.is_finite() {
            return Err(SolveError::ResourceOverflow);
        }

        let mut half_point = self.half_point;
        if !half_point {
            half_point = resources
                .iter()
                .zip(res_max)
                .any(|(r, max)| *r >= max / 2.0);
        }
        // A label with nothing left it can reach is a dead end: it can
        // never cross the half-point by further extension, so treat it as
        // already there rather than stranding it in the open-queue forever.
        if !half_point && reachable.count_ones(..) == 0 {
            half_point = true;
        }

        let mut child = Label {
            vertex: w,
            path,
            cost,
            resources,
            reachable,
            half_point,
            direction: self.direction,
            lb: 0.0,
        };
        child.lb = oracle.bound(&child, graph);

        if child.cost + child.lb > ub {
            return Ok(ExtendOutcome::PrunedByUb);
        }

        Ok(ExtendOutcome::Accepted(child))
    }

    /// `self` dominates `rival` (same vertex and direction) iff self is no
    /// worse on cost, resources and reachability, with ties broken by
    /// insertion order — callers pass the earlier-inserted label as `self`.
    pub fn dominates(&self, rival: &Label) -> bool {
        debug_assert_eq!(self.vertex, rival.vertex);
        debug_assert_eq!(self.direction, rival.direction);

        if self.cost > rival.cost {
            return false;
        }
        if self
            .resources
            .iter()
            .zip(rival.resources.iter())
            .any(|(s, r)| s > r)
        {
            return false;
        }
        // self.reachable must be a superset of rival.reachable: every vertex
        // rival can still reach, self can too.
        rival.reachable.ones().all(|v| self.reachable.contains(v))
    }

    /// Eligible for immediate tour completion: backward label back at 0
    /// with a non-trivial path.
    pub fn is_terminal_at_source(&self) -> bool {
        self.vertex == 0 && self.path.len() > 1
    }
}
