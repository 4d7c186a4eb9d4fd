//! Per-vertex, per-direction ordered storage of non-dominated labels.
//!
//! Labels live in an arena (`Vec<Slot>`) addressed by stable `LabelId`s so
//! that the explorer's open-queues can hold indices instead of owned
//! labels; a label removed by dominance is tombstoned in place rather than
//! shifted out from under a queued reference (§5, §9: "open-queues hold
//! weak references… so that dominance removal invalidates queued entries
//! cleanly").

use crate::graph::Direction;
use crate::label::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub usize);

enum Slot {
    Live(Label),
    Tombstoned,
}

#[derive(PartialEq, Eq)]
pub enum Insertion {
    Accepted(LabelId),
    Rejected,
}

pub struct LabelStore {
    arena: Vec<Slot>,
    /// `lists[direction][vertex]`: ids into `arena`, ascending by cost.
    lists: [Vec<Vec<LabelId>>; 2],
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Forward => 0,
        Direction::Backward => 1,
    }
}

impl LabelStore {
    pub fn new(num_nodes: usize) -> Self {
        LabelStore {
            arena: Vec::new(),
            lists: [vec![Vec::new(); num_nodes], vec![Vec::new(); num_nodes]],
        }
    }

    pub fn get(&self, id: LabelId) -> Option<&Label> {
        match &self.arena[id.0] {
            Slot::Live(label) => Some(label),
            Slot::Tombstoned => None,
        }
    }

    /// Scans the label's `(vertex, direction)` list: a dominating existing
    /// label rejects it outright, a dominated existing label is tombstoned,
    /// then the survivor is binary-inserted preserving cost order.
    pub fn insert(&mut self, label: Label) -> Insertion {
        let vertex = label.vertex;
        let dir = dir_index(label.direction);
        let list = &mut self.lists[dir][vertex];

        let mut to_remove = Vec::new();
        for &existing_id in list.iter() {
            let existing = match &self.arena[existing_id.0] {
                Slot::Live(l) => l,
                Slot::Tombstoned => continue,
            };
            // List is cost-ascending: once existing.cost > label.cost,
            // existing can no longer dominate label (that needs existing.cost
            // <= label.cost), so skip that half of the check. The candidate
            // may still dominate existing, so the scan itself continues.
            if existing.cost <= label.cost && existing.dominates(&label) {
                return Insertion::Rejected;
            }
            if label.dominates(existing) {
                to_remove.push(existing_id);
            }
        }

        for id in &to_remove {
            self.arena[id.0] = Slot::Tombstoned;
        }
        list.retain(|id| !to_remove.contains(id));

        let cost = label.cost;
        let new_id = LabelId(self.arena.len());
        self.arena.push(Slot::Live(label));

        let pos = self.lists[dir][vertex].partition_point(|&id| {
            match &self.arena[id.0] {
                Slot::Live(existing) => existing.cost <= cost,
                Slot::Tombstoned => true,
            }
        });
        self.lists[dir][vertex].insert(pos, new_id);

        Insertion::Accepted(new_id)
    }

    /// Removes every stored label with `cost + lb > new_ub`.
    pub fn prune_by_ub(&mut self, new_ub: f64) {
        let arena = &mut self.arena;
        for list in self.lists.iter_mut() {
            for vertex_list in list.iter_mut() {
                vertex_list.retain(|&id| {
                    let keep = match &arena[id.0] {
                        Slot::Live(label) => label.cost + label.lb <= new_ub,
                        Slot::Tombstoned => false,
                    };
                    if !keep {
                        arena[id.0] = Slot::Tombstoned;
                    }
                    keep
                });
            }
        }
    }

    pub fn iterate(&self, vertex: usize, direction: Direction) -> impl Iterator<Item = &Label> {
        self.lists[dir_index(direction)][vertex]
            .iter()
            .filter_map(move |&id| self.get(id))
    }

    pub fn len(&self, vertex: usize, direction: Direction) -> usize {
        self.lists[dir_index(direction)][vertex].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixedbitset::FixedBitSet;

    fn label_at(vertex: usize, cost: f64, resources: Vec<f64>, n: usize) -> Label {
        Label {
            vertex,
            path: vec![0, vertex],
            cost,
            resources,
            reachable: FixedBitSet::with_capacity(n),
            half_point: false,
            direction: Direction::Forward,
            lb: 0.0,
        }
    }

    #[test]
    fn dominated_insertion_is_rejected() {
        let mut store = LabelStore::new(3);
        store.insert(label_at(1, 1.0, vec![1.0, 1.0], 3));
        let rejected = store.insert(label_at(1, 2.0, vec![2.0, 2.0], 3));
        assert!(matches!(rejected, Insertion::Rejected));
        assert_eq!(store.len(1, Direction::Forward), 1);
    }

    #[test]
    fn dominating_insertion_evicts_existing() {
        let mut store = LabelStore::new(3);
        store.insert(label_at(1, 2.0, vec![2.0, 2.0], 3));
        let accepted = store.insert(label_at(1, 1.0, vec![1.0, 1.0], 3));
        assert!(matches!(accepted, Insertion::Accepted(_)));
        assert_eq!(store.len(1, Direction::Forward), 1);
        assert_eq!(store.iterate(1, Direction::Forward).next().unwrap().cost, 1.0);
    }

    #[test]
    fn incomparable_labels_both_survive_sorted_by_cost() {
        let mut store = LabelStore::new(3);
        store.insert(label_at(1, 2.0, vec![1.0, 5.0], 3));
        store.insert(label_at(1, 1.0, vec![5.0, 1.0], 3));
        let costs: Vec<f64> = store.iterate(1, Direction::Forward).map(|l| l.cost).collect();
        assert_eq!(costs, vec![1.0, 2.0]);
    }

    #[test]
    fn duplicate_insertion_keeps_a_single_copy() {
        let mut store = LabelStore::new(3);
        store.insert(label_at(1, 1.0, vec![1.0], 3));
        store.insert(label_at(1, 1.0, vec![1.0], 3));
        assert_eq!(store.len(1, Direction::Forward), 1);
    }

    #[test]
    fn prune_by_ub_removes_hopeless_labels() {
        let mut store = LabelStore::new(3);
        let mut cheap = label_at(1, 1.0, vec![1.0], 3);
        cheap.lb = 0.0;
        let mut pricey = label_at(2, 10.0, vec![1.0], 3);
        pricey.lb = 5.0;
        store.insert(cheap);
        store.insert(pricey);
        store.prune_by_ub(5.0);
        assert_eq!(store.len(1, Direction::Forward), 1);
        assert_eq!(store.len(2, Direction::Forward), 0);
    }

    #[test]
    fn empty_and_singleton_lists_do_not_panic() {
        let mut store = LabelStore::new(3);
        assert_eq!(store.iterate(0, Direction::Forward).count(), 0);
        store.insert(label_at(0, 0.0, vec![0.0], 3));
        assert_eq!(store.len(0, Direction::Forward), 1);
    }
}
