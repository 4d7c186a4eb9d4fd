//! Directed multigraph with per-edge cost and resource consumption.
//!
//! Mirrors the layout of the original solver's `Graph`: edges are stored
//! once and referenced by id from both the outgoing and incoming adjacency
//! lists, a `predecessor` bitset gives O(1) neighbor tests, and `min_weight`
//! / `max_value` are derived statistics computed once after construction.

use fixedbitset::FixedBitSet;

use crate::error::{Result, SolveError};

/// Sentinel used when a vertex has no outgoing edges for a resource:
/// large enough that it never wins a `min` comparison against a real edge.
const NO_EDGE_SENTINEL: f64 = f64::INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn flip(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
    pub resources: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Graph {
    num_nodes: usize,
    num_res: usize,
    res_max: Vec<f64>,
    edges: Vec<Edge>,
    out: Vec<Vec<EdgeId>>,
    in_: Vec<Vec<EdgeId>>,
    predecessor: Vec<FixedBitSet>,
    /// `min_weight[v][k]`: cheapest resource-`k` consumption among `v`'s
    /// outgoing edges, `NO_EDGE_SENTINEL` if `v` has none.
    min_weight: Vec<Vec<f64>>,
    /// `max_value[v]`: the minimum (i.e. best, since cost can be negative)
    /// outgoing edge cost from `v`, used as an optimistic per-vertex
    /// contribution bound in the lower-bound oracle.
    max_value: Vec<f64>,
}

impl Graph {
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_res(&self) -> usize {
        self.num_res
    }

    pub fn res_max(&self) -> &[f64] {
        &self.res_max
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors(&self, v: usize, dir: Direction) -> &[EdgeId] {
        match dir {
            Direction::Forward => &self.out[v],
            Direction::Backward => &self.in_[v],
        }
    }

    /// The "other" endpoint of `edge` relative to traversal direction: the
    /// edge's `to` when walking forward out-edges, its `from` when walking
    /// backward in-edges.
    pub fn other_endpoint(&self, id: EdgeId, dir: Direction) -> usize {
        let edge = self.edge(id);
        match dir {
            Direction::Forward => edge.to,
            Direction::Backward => edge.from,
        }
    }

    pub fn is_neighbor(&self, from: usize, to: usize) -> bool {
        self.predecessor[from][to]
    }

    pub fn min_weight(&self, v: usize, k: usize) -> f64 {
        self.min_weight[v][k]
    }

    pub fn max_value(&self, v: usize) -> f64 {
        self.max_value[v]
    }

    pub fn builder(num_nodes: usize, num_res: usize, res_max: Vec<f64>) -> Result<GraphBuilder> {
        GraphBuilder::new(num_nodes, num_res, res_max)
    }
}

/// Accumulates edges before the one-pass derived-statistics scan runs.
pub struct GraphBuilder {
    num_nodes: usize,
    num_res: usize,
    res_max: Vec<f64>,
    edges: Vec<Edge>,
    out: Vec<Vec<EdgeId>>,
    in_: Vec<Vec<EdgeId>>,
    predecessor: Vec<FixedBitSet>,
}

impl GraphBuilder {
    pub fn new(num_nodes: usize, num_res: usize, res_max: Vec<f64>) -> Result<Self> {
        if num_nodes == 0 {
            return Err(SolveError::InvalidInput("empty vertex set".into()));
        }
        if res_max.len() != num_res {
            return Err(SolveError::InvalidInput(format!(
                "res_max has {} entries, expected {}",
                res_max.len(),
                num_res
            )));
        }
        if res_max.iter().any(|&r| r < 0.0) {
            return Err(SolveError::InvalidInput("res_max entries must be non-negative".into()));
        }
        Ok(GraphBuilder {
            num_nodes,
            num_res,
            res_max,
            edges: Vec::new(),
            out: vec![Vec::new(); num_nodes],
            in_: vec![Vec::new(); num_nodes],
            predecessor: vec![FixedBitSet::with_capacity(num_nodes); num_nodes],
        })
    }

    /// Appends an edge. Out-of-range vertices are a programmer error
    /// (fatal, per the original spec); malformed resource vectors are
    /// `InvalidInput` since they can originate from untrusted instance data.
    pub fn add_edge(&mut self, from: usize, to: usize, cost: f64, resources: Vec<f64>) -> Result<EdgeId> {
        assert!(from < self.num_nodes, "edge source {} out of range", from);
        assert!(to < self.num_nodes, "edge target {} out of range", to);
        if resources.len() != self.num_res {
            return Err(SolveError::InvalidInput(format!(
                "edge {}->{} has {} resources, expected {}",
                from,
                to,
                resources.len(),
                self.num_res
            )));
        }
        if resources.iter().any(|&r| r < 0.0) {
            return Err(SolveError::InvalidInput(format!(
                "edge {}->{} has a negative resource consumption",
                from, to
            )));
        }
        if !cost.is_finite() {
            return Err(SolveError::ResourceOverflow);
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Edge { from, to, cost, resources });
        self.out[from].push(id);
        self.in_[to].push(id);
        self.predecessor[from].insert(to);
        Ok(id)
    }

    /// Removes every edge between `from` and `to`. A no-op if none exist.
    pub fn delete_edge(&mut self, from: usize, to: usize) {
        self.out[from].retain(|&id| self.edges[id.0].to != to);
        self.in_[to].retain(|&id| self.edges[id.0].from != from);
        self.predecessor[from].set(to, false);
    }

    /// Computes `min_weight`/`max_value` and freezes the graph.
    pub fn finish(self) -> Graph {
        let mut min_weight = vec![vec![NO_EDGE_SENTINEL; self.num_res]; self.num_nodes];
        let mut max_value = vec![NO_EDGE_SENTINEL; self.num_nodes];

        for (v, out_edges) in self.out.iter().enumerate() {
            for &id in out_edges {
                let edge = &self.edges[id.0];
                for k in 0..self.num_res {
                    if edge.resources[k] < min_weight[v][k] {
                        min_weight[v][k] = edge.resources[k];
                    }
                }
                if edge.cost < max_value[v] {
                    max_value[v] = edge.cost;
                }
            }
        }

        Graph {
            num_nodes: self.num_nodes,
            num_res: self.num_res,
            res_max: self.res_max,
            edges: self.edges,
            out: self.out,
            in_: self.in_,
            predecessor: self.predecessor,
            min_weight,
            max_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_graph() -> Graph {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        b.add_edge(0, 1, -3.0, vec![1.0]).unwrap();
        b.add_edge(1, 0, 1.0, vec![1.0]).unwrap();
        b.finish()
    }

    #[test]
    fn adjacency_round_trips() {
        let g = two_node_graph();
        assert_eq!(g.neighbors(0, Direction::Forward).len(), 1);
        assert_eq!(g.neighbors(1, Direction::Backward).len(), 1);
        assert!(g.is_neighbor(0, 1));
        assert!(!g.is_neighbor(1, 1));
    }

    #[test]
    fn derived_statistics() {
        let g = two_node_graph();
        assert_eq!(g.min_weight(0, 0), 1.0);
        assert_eq!(g.max_value(0), -3.0);
    }

    #[test]
    fn delete_edge_clears_adjacency_and_predecessor() {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        b.add_edge(0, 1, 1.0, vec![1.0]).unwrap();
        b.delete_edge(0, 1);
        let g = b.finish();
        assert!(g.neighbors(0, Direction::Forward).is_empty());
        assert!(!g.is_neighbor(0, 1));
    }

    #[test]
    fn delete_missing_edge_is_a_no_op() {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        b.delete_edge(0, 1);
        let g = b.finish();
        assert!(g.neighbors(0, Direction::Forward).is_empty());
    }

    #[test]
    fn rejects_empty_vertex_set() {
        assert!(Graph::builder(0, 1, vec![5.0]).is_err());
    }

    #[test]
    fn rejects_negative_resource_bound() {
        assert!(Graph::builder(2, 1, vec![-1.0]).is_err());
    }

    #[test]
    fn rejects_negative_edge_resource() {
        let mut b = Graph::builder(2, 1, vec![5.0]).unwrap();
        assert!(b.add_edge(0, 1, 1.0, vec![-1.0]).is_err());
    }
}
