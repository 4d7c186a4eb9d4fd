//! Serde instance record: the on-disk/wire shape a `Graph` is built from.

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use log::warn;
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolveError};
use crate::graph::Graph;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
    pub resources: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub num_nodes: usize,
    pub num_res: usize,
    pub res_max: Vec<f64>,
    pub edges: Vec<EdgeRecord>,
}

impl Instance {
    pub fn load(path: impl AsRef<Path>) -> Result<Instance> {
        let mut s = String::new();
        File::open(path.as_ref())
            .map_err(|e| SolveError::InvalidInput(format!("{}: {}", path.as_ref().display(), e)))?
            .read_to_string(&mut s)
            .map_err(|e| SolveError::InvalidInput(e.to_string()))?;
        let instance: Instance =
            serde_json::from_str(&s).map_err(|e| SolveError::InvalidInput(e.to_string()))?;
        instance.verify_no_duplicate_edges();
        Ok(instance)
    }

    fn verify_no_duplicate_edges(&self) {
        for (i, a) in self.edges.iter().enumerate() {
            for b in &self.edges[i + 1..] {
                if a.from == b.from && a.to == b.to {
                    warn!("multiple edges from {} to {}, both will be kept", a.from, a.to);
                }
            }
        }
    }

    /// Builds a random instance with `num_nodes` vertices and `num_res`
    /// resources, seeded for reproducibility: every vertex pair gets an edge
    /// in each direction, cost in `[-5, 10)` and each resource consumption in
    /// `[0, 3)`, `res_max` set to half the vertex count per resource so a
    /// bidirectional search actually has to prune.
    pub fn random(num_nodes: usize, num_res: usize, seed: u64) -> Instance {
        let mut rng = Pcg64::new(seed as u128, 0xa02bdbf7bb3c0a7a);
        let mut edges = Vec::with_capacity(num_nodes * (num_nodes - 1));
        for from in 0..num_nodes {
            for to in 0..num_nodes {
                if from == to {
                    continue;
                }
                edges.push(EdgeRecord {
                    from,
                    to,
                    cost: rng.gen_range(-5.0..10.0),
                    resources: (0..num_res).map(|_| rng.gen_range(0.0..3.0)).collect(),
                });
            }
        }
        Instance {
            num_nodes,
            num_res,
            res_max: vec![(num_nodes as f64) / 2.0; num_res],
            edges,
        }
    }

    pub fn build_graph(&self) -> Result<Graph> {
        let mut builder = Graph::builder(self.num_nodes, self.num_res, self.res_max.clone())?;
        for edge in &self.edges {
            builder.add_edge(edge.from, edge.to, edge.cost, edge.resources.clone())?;
        }
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_instances_are_reproducible_for_a_fixed_seed() {
        let a = Instance::random(5, 2, 42);
        let b = Instance::random(5, 2, 42);
        assert_eq!(a.edges.len(), b.edges.len());
        for (ea, eb) in a.edges.iter().zip(b.edges.iter()) {
            assert_eq!(ea.cost, eb.cost);
            assert_eq!(ea.resources, eb.resources);
        }
    }

    #[test]
    fn random_instance_builds_a_complete_digraph() {
        let instance = Instance::random(4, 1, 7);
        assert_eq!(instance.edges.len(), 4 * 3);
        let graph = instance.build_graph().unwrap();
        assert_eq!(graph.num_edges(), 12);
    }

    #[test]
    fn load_rejects_missing_files() {
        assert!(Instance::load("/nonexistent/path/instance.json").is_err());
    }
}
