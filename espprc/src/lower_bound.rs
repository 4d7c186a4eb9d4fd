//! Pluggable lower-bound oracles over a label's residual resources.
//!
//! The canonical bound is a relaxed 0/1 knapsack: maximize
//! `Σ -max_value[v]·x[v]` subject to `Σ min_weight[v][k]·x[v] ≤ residual[k]`
//! over reachable vertices `v`. Re-solving that knapsack exactly (as the
//! original MIP-backed implementation does, once per label) dominates the
//! running time of the whole search, so `KnapsackOracle` instead computes a
//! greedy LP relaxation of it — a valid upper bound on the achievable
//! reward, and therefore a valid lower bound on completion cost.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::graph::Graph;
use crate::label::Label;

pub trait LowerBoundOracle {
    /// A lower bound on the cost of any feasible elementary completion of
    /// `label`. Must never over-approximate: `0.0` is always a valid
    /// (if useless) answer.
    fn bound(&self, label: &Label, graph: &Graph) -> f64;
}

/// Disables pruning entirely. Useful for correctness-only builds and as
/// the fallback when a more expensive oracle reports `OracleFailure`.
pub struct ZeroOracle;

impl LowerBoundOracle for ZeroOracle {
    fn bound(&self, _label: &Label, _graph: &Graph) -> f64 {
        0.0
    }
}

/// Greedy-by-ratio relaxation of the per-label knapsack.
pub struct KnapsackOracle;

impl LowerBoundOracle for KnapsackOracle {
    fn bound(&self, label: &Label, graph: &Graph) -> f64 {
        knapsack_bound(label, graph)
    }
}

fn knapsack_bound(label: &Label, graph: &Graph) -> f64 {
    let residual: Vec<f64> = graph
        .res_max()
        .iter()
        .zip(label.resources.iter())
        .map(|(max, used)| (max - used).max(0.0))
        .collect();

    // Reward is -max_value[v] (max_value is a cost, so lower/negative cost
    // means higher reward); weight is the largest per-resource consumption
    // so a single scalar "tightest resource" ratio can rank items.
    let mut items: Vec<(f64, f64)> = label
        .reachable
        .ones()
        .map(|v| {
            let reward = -graph.max_value(v);
            let weight = (0..graph.num_res())
                .map(|k| graph.min_weight(v, k))
                .fold(0.0_f64, f64::max);
            (reward, weight)
        })
        .filter(|(_, weight)| weight.is_finite())
        .collect();

    items.sort_by(|a, b| {
        let ratio_a = if a.1 > 0.0 { a.0 / a.1 } else { f64::INFINITY };
        let ratio_b = if b.1 > 0.0 { b.0 / b.1 } else { f64::INFINITY };
        ratio_b.partial_cmp(&ratio_a).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut capacity = residual.iter().fold(f64::INFINITY, |acc, &r| acc.min(r));
    let mut bound_reward = 0.0;
    for (reward, weight) in items {
        if capacity <= 0.0 {
            break;
        }
        if weight <= capacity {
            bound_reward += reward;
            capacity -= weight;
        } else if weight > 0.0 {
            // Fractional top item: the LP relaxation may take a partial unit.
            bound_reward += reward * (capacity / weight);
            capacity = 0.0;
        }
    }

    -bound_reward
}

/// Memoizes another oracle's answer on `(reachable bitmap, resource
/// bucket)`, per the spec's amortization note. Buckets round each residual
/// resource down to the nearest `bucket_width`.
pub struct CachingOracle<O> {
    inner: O,
    bucket_width: f64,
    cache: RefCell<HashMap<(Vec<usize>, Vec<i64>), f64>>,
}

impl<O: LowerBoundOracle> CachingOracle<O> {
    pub fn new(inner: O, bucket_width: f64) -> Self {
        CachingOracle {
            inner,
            bucket_width,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn key(&self, label: &Label, graph: &Graph) -> (Vec<usize>, Vec<i64>) {
        let bitmap: Vec<usize> = label.reachable.ones().collect();
        let buckets = graph
            .res_max()
            .iter()
            .zip(label.resources.iter())
            .map(|(max, used)| {
                let residual = (max - used).max(0.0);
                (residual / self.bucket_width).floor() as i64
            })
            .collect();
        (bitmap, buckets)
    }
}

impl<O: LowerBoundOracle> LowerBoundOracle for CachingOracle<O> {
    fn bound(&self, label: &Label, graph: &Graph) -> f64 {
        let key = self.key(label, graph);
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }
        let value = self.inner.bound(label, graph);
        self.cache.borrow_mut().insert(key, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Direction;

    fn graph_with_two_reachable_vertices() -> Graph {
        // 0 -> 1 (cost -4, res 2), 0 -> 2 (cost -1, res 1); res_max = [3]
        let mut b = Graph::builder(3, 1, vec![3.0]).unwrap();
        b.add_edge(0, 1, -4.0, vec![2.0]).unwrap();
        b.add_edge(0, 2, -1.0, vec![1.0]).unwrap();
        b.finish()
    }

    #[test]
    fn zero_oracle_never_prunes() {
        let g = graph_with_two_reachable_vertices();
        let l = Label::initial(&g, Direction::Forward);
        assert_eq!(ZeroOracle.bound(&l, &g), 0.0);
    }

    #[test]
    fn knapsack_bound_is_never_more_negative_than_best_feasible_completion() {
        let g = graph_with_two_reachable_vertices();
        let l = Label::initial(&g, Direction::Forward);
        let bound = KnapsackOracle.bound(&l, &g);
        // Best real completion from here costs at least -4 (taking only 1).
        assert!(bound <= -4.0 + 1e-9);
    }

    #[test]
    fn caching_oracle_matches_inner_oracle() {
        let g = graph_with_two_reachable_vertices();
        let l = Label::initial(&g, Direction::Forward);
        let cached = CachingOracle::new(KnapsackOracle, 0.5);
        assert_eq!(cached.bound(&l, &g), KnapsackOracle.bound(&l, &g));
        // second call hits the cache and must agree
        assert_eq!(cached.bound(&l, &g), KnapsackOracle.bound(&l, &g));
    }
}
