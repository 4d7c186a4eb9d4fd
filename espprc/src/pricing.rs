//! Reduced-cost extraction for column generation callers.
//!
//! Not exercised by the core labeling search: a column-generation master
//! problem that has already fixed a path onto its columns can ask for the
//! dual-adjusted edge costs it would need to price further columns, without
//! this crate needing to know anything about the master problem itself.

use std::collections::HashMap;

use glpk::{Bounds, Direction as GlpDirection, Expr, Kind, Problem, Var};
use log::debug;

use crate::error::{Result, SolveError};
use crate::graph::{Edge, EdgeId, Graph};

pub trait PricingOracle {
    /// Solves the LP relaxation with `path`'s edges fixed to 1, then returns
    /// the dual-adjusted cost `cost[e] - dual(from) + dual(to) - Σ_k
    /// dual(resource_k) * resources[e][k]` for every edge, plus the
    /// relaxation's objective value.
    fn get_reduced_costs(&self, path: &[usize]) -> Result<(HashMap<(usize, usize), f64>, f64)>;
}

pub struct GlpkPricingOracle<'g> {
    graph: &'g Graph,
}

impl<'g> GlpkPricingOracle<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        GlpkPricingOracle { graph }
    }
}

impl<'g> PricingOracle for GlpkPricingOracle<'g> {
    fn get_reduced_costs(&self, path: &[usize]) -> Result<(HashMap<(usize, usize), f64>, f64)> {
        let graph = self.graph;
        let fixed: std::collections::HashSet<(usize, usize)> =
            path.windows(2).map(|w| (w[0], w[1])).collect();

        let mut problem = Problem::new();
        problem.set_name("espprc_pricing".to_owned());
        problem.set_direction(GlpDirection::Minimize);

        let edge_vars = problem.add_vars(
            (0..graph.num_edges())
                .map(|id| {
                    let edge = graph.edge(EdgeId(id));
                    let bounds = if fixed.contains(&(edge.from, edge.to)) {
                        Bounds::Fixed(1.0)
                    } else {
                        Bounds::Double(0.0, 1.0)
                    };
                    Var {
                        name: format!("x_{}_{}", edge.from, edge.to),
                        kind: Kind::Float,
                        bounds,
                        objective: edge.cost,
                    }
                })
                .collect(),
        );

        let flow_rows = flow_conservation_exprs(graph, edge_vars);
        let num_flow_rows = flow_rows.len();
        let flow_row_refs = problem.add_exprs(flow_rows);
        let resource_row_refs = problem.add_exprs(resource_budget_exprs(graph, edge_vars));

        problem
            .optimize_lp()
            .map_err(|e| SolveError::OracleFailure(format!("{:?}", e)))?;

        let flow_duals: Vec<f64> = (0..num_flow_rows)
            .map(|i| problem.get_row_dual(flow_row_refs.get(i)))
            .collect();
        debug!("pricing LP duals: {:?}", flow_duals);

        // source/sink rows occupy indices 0 and 1; vertex v>=1's flow row is
        // at index v+1, matching `flow_conservation_exprs`'s push order.
        let dual_at = |v: usize| -> f64 {
            if v == 0 {
                flow_duals[0] + flow_duals[1]
            } else {
                flow_duals[v + 1]
            }
        };
        let resource_dual_at =
            |k: usize| -> f64 { problem.get_row_dual(resource_row_refs.get(k)) };

        let mut reduced = HashMap::with_capacity(graph.num_edges());
        for id in 0..graph.num_edges() {
            let edge = graph.edge(EdgeId(id));
            let resource_term: f64 = (0..graph.num_res())
                .map(|k| resource_dual_at(k) * edge.resources[k])
                .sum();
            let rc = edge.cost - dual_at(edge.from) + dual_at(edge.to) - resource_term;
            reduced.insert((edge.from, edge.to), rc);
        }

        let objective: f64 = (0..graph.num_edges())
            .map(|id| {
                let edge = graph.edge(EdgeId(id));
                problem.get_value(edge_vars.get(id)) * edge.cost
            })
            .sum();

        Ok((reduced, objective))
    }
}

fn flow_conservation_exprs(graph: &Graph, edge_vars: glpk::VarRefs) -> Vec<Expr> {
    let mut exprs = Vec::with_capacity(graph.num_nodes() + 1);
    exprs.push(Expr {
        name: "source".to_owned(),
        bounds: Bounds::Fixed(1.0),
        terms: edges_matching(graph, |e| e.to == 0)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0)
            .collect(),
    });
    exprs.push(Expr {
        name: "sink".to_owned(),
        bounds: Bounds::Fixed(1.0),
        terms: edges_matching(graph, |e| e.from == 0)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0)
            .collect(),
    });
    for v in 1..graph.num_nodes() {
        let inflow = edges_matching(graph, |e| e.to == v)
            .into_iter()
            .map(|id| edge_vars.get(id) * 1.0);
        let outflow = edges_matching(graph, |e| e.from == v)
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

fn resource_budget_exprs(graph: &Graph, edge_vars: glpk::VarRefs) -> Vec<Expr> {
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

fn edges_matching(graph: &Graph, pred: impl Fn(&Edge) -> bool) -> Vec<usize> {
    (0..graph.num_edges())
        .filter(|&id| pred(graph.edge(EdgeId(id))))
        .collect()
}
