//! MIP cross-checker built on the workspace's `glpk` binding.
//!
//! Builds the flow-conservation + resource-budget + MTZ subtour-elimination
//! model described for the exact ESPPRC formulation: one binary variable per
//! edge, continuous MTZ order variables, inflow/outflow balanced everywhere
//! except vertex 0 (a unit source and sink), and one resource-budget row per
//! resource. Used only as a cross-checker in tests/benches, never on the
//! core solver's hot path.

use std::collections::HashMap;

use glpk::{Bounds, Direction as GlpDirection, Expr, Kind, Problem, Var, VarRefs};
use log::info;

use crate::error::{Result, SolveError};
use crate::graph::{Edge, EdgeId, Graph};

/// A solver whose answer is trusted as ground truth, used to validate the
/// labeling search's output in tests.
pub trait ExactOracle {
    fn solve(&self, graph: &Graph) -> Result<(Vec<usize>, f64)>;
}

pub struct GlpkExactOracle;

impl ExactOracle for GlpkExactOracle {
    fn solve(&self, graph: &Graph) -> Result<(Vec<usize>, f64)> {
        let n = graph.num_nodes();

        let mut problem = Problem::new();
        problem.set_name("espprc".to_owned());
        problem.set_direction(GlpDirection::Minimize);

        let edge_vars = problem.add_vars(
            (0..graph.num_edges())
                .map(|id| {
                    let edge = graph.edge(EdgeId(id));
                    Var {
                        name: format!("x_{}_{}", edge.from, edge.to),
                        kind: Kind::Int,
                        bounds: Bounds::Double(0.0, 1.0),
                        objective: edge.cost,
                    }
                })
                .collect(),
        );

        let order_vars = problem.add_vars(
            (0..n)
                .map(|i| Var {
                    name: format!("u_{}", i),
                    kind: Kind::Float,
                    bounds: Bounds::Double(0.0, n as f64),
                    objective: 0.0,
                })
                .collect(),
        );

        problem.add_exprs(flow_conservation_exprs(graph, edge_vars));
        problem.add_exprs(resource_budget_exprs(graph, edge_vars));
        problem.add_exprs(subtour_elimination_exprs(graph, edge_vars, order_vars));

        struct NoCallback;
        impl glpk::MipCallback for NoCallback {}
        let mut callback = NoCallback;

        problem
            .optimize_mip(&mut callback)
            .map_err(|e| SolveError::OracleFailure(format!("{:?}", e)))?;

        let mut selected = Vec::new();
        let mut cost = 0.0;
        for id in 0..graph.num_edges() {
            let edge = graph.edge(EdgeId(id));
            if problem.get_int_value(edge_vars.get(id)) > 0.5 {
                selected.push((edge.from, edge.to));
                cost += edge.cost;
            }
        }

        let path = reconstruct_path(&selected)
            .ok_or_else(|| SolveError::OracleFailure("MIP solution is not a single cycle".into()))?;

        info!("glpk exact oracle: cost {}, path {:?}", cost, path);
        Ok((path, cost))
    }
}

fn flow_conservation_exprs(graph: &Graph, edge_vars: VarRefs) -> Vec<Expr> {
    let mut exprs = Vec::with_capacity(graph.num_nodes() + 1);
    exprs.push(Expr {
        name: "source".to_owned(),
        bounds: Bounds::Fixed(1.0),
        terms: edge_ids_into(graph, 0)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0)
            .collect(),
    });
    exprs.push(Expr {
        name: "sink".to_owned(),
        bounds: Bounds::Fixed(1.0),
        terms: edge_ids_out_of(graph, 0)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0)
            .collect(),
    });
    for v in 1..graph.num_nodes() {
        let inflow = edge_ids_into(graph, v)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0);
        let outflow = edge_ids_out_of(graph, v)
            .into_iter()
            .map(|id| edge_vars.get(id) * -1.0);
        exprs.push(Expr {
            name: format!("flow_{}", v),
            bounds: Bounds::Fixed(0.0),
            terms: inflow.chain(outflow).collect(),
        });
    }
    exprs
}

fn resource_budget_exprs(graph: &Graph, edge_vars: VarRefs) -> Vec<Expr> {
    (0..graph.num_res())
        .map(|k| Expr {
            name: format!("resource_{}", k),
            bounds: Bounds::Upper(graph.res_max()[k]),
            terms: (0..graph.num_edges())
                .map(|id| {
                    let edge = graph.edge(EdgeId(id));
                    edge_vars.get(id) * edge.resources[k]
                })
                .collect(),
        })
        .collect()
}

fn subtour_elimination_exprs(graph: &Graph, edge_vars: VarRefs, order_vars: VarRefs) -> Vec<Expr> {
    let n = graph.num_nodes() as f64;
    (0..graph.num_edges())
        .filter_map(|id| {
            let edge = graph.edge(EdgeId(id));
            if edge.from == 0 || edge.to == 0 {
                return None;
            }
            // u[from] + 1 <= u[to] + n*(1 - x) <=> u[from] - u[to] + n*x <= n - 1
            Some(Expr {
                name: format!("subtour_{}_{}", edge.from, edge.to),
                bounds: Bounds::Upper(n - 1.0),
                terms: vec![
                    order_vars.get(edge.from) * 1.0,
                    order_vars.get(edge.to) * -1.0,
                    edge_vars.get(id) * n,
                ],
            })
        })
        .collect()
}

fn edge_ids_into(graph: &Graph, v: usize) -> Vec<usize> {
    edge_ids_matching(graph, |e| e.to == v)
}

fn edge_ids_out_of(graph: &Graph, v: usize) -> Vec<usize> {
    edge_ids_matching(graph, |e| e.from == v)
}

fn edge_ids_matching(graph: &Graph, pred: impl Fn(&Edge) -> bool) -> Vec<usize> {
    (0..graph.num_edges())
        .filter(|&id| pred(graph.edge(EdgeId(id))))
        .collect()
}

/// Rebuilds the vertex sequence `0, ..., 0` from a set of selected directed
/// edges, or `None` if they don't form a single cycle through 0.
fn reconstruct_path(edges: &[(usize, usize)]) -> Option<Vec<usize>> {
    if edges.is_empty() {
        return None;
    }
    let next: HashMap<usize, usize> = edges.iter().cloned().collect();
    if next.len() != edges.len() {
        return None; // duplicate source: not a simple cycle
    }

    let mut path = vec![0usize];
    let mut current = 0usize;
    for _ in 0..edges.len() {
        current = *next.get(&current)?;
        path.push(current);
    }
    if current != 0 || path.len() != edges.len() + 1 {
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_a_simple_cycle() {
        let edges = vec![(0, 1), (1, 2), (2, 0)];
        assert_eq!(reconstruct_path(&edges), Some(vec![0, 1, 2, 0]));
    }

    #[test]
    fn rejects_edges_that_are_not_a_single_cycle() {
        let edges = vec![(0, 1), (1, 0), (2, 2)];
        assert_eq!(reconstruct_path(&edges), None);
    }
}
