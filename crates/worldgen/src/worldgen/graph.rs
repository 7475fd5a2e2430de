//! Minimum spanning trees over point sets (Kruskal with an iterative union-find).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeMetric {
    Manhattan,
    SquaredEuclidean,
}

impl EdgeMetric {
    fn weight(self, a: Pos, b: Pos) -> u64 {
        match self {
            Self::Manhattan => u64::from(a.manhattan(b)),
            Self::SquaredEuclidean => a.distance_squared(b),
        }
    }
}

/// Accepted spanning-tree edge between two point indices, `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MstEdge {
    pub a: usize,
    pub b: usize,
    pub weight: u64,
}

pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    sets: usize,
}

impl UnionFind {
    pub(crate) fn new(size: usize) -> Self {
        Self { parent: (0..size).collect(), rank: vec![0; size], sets: size }
    }

    pub(crate) fn find(&mut self, item: usize) -> usize {
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = item;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merges the sets of `a` and `b`; false when they were already joined.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            Ordering::Less => self.parent[root_a] = root_b,
            Ordering::Greater => self.parent[root_b] = root_a,
            Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] = self.rank[root_a].saturating_add(1);
            }
        }
        self.sets -= 1;
        true
    }

    pub(crate) fn set_count(&self) -> usize {
        self.sets
    }
}

/// Kruskal over the complete graph of `points`.
///
/// Ties on weight are broken by `(a, b)` so the tree is stable for a given input order.
pub(crate) fn minimum_spanning_tree(points: &[Pos], metric: EdgeMetric) -> Vec<MstEdge> {
    let mut candidates = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            candidates.push(MstEdge { a, b, weight: metric.weight(points[a], points[b]) });
        }
    }
    candidates.sort_by_key(|edge| (edge.weight, edge.a, edge.b));

    let mut sets = UnionFind::new(points.len());
    let mut accepted = Vec::with_capacity(points.len().saturating_sub(1));
    for edge in candidates {
        if sets.set_count() <= 1 {
            break;
        }
        if sets.union(edge.a, edge.b) {
            accepted.push(edge);
        }
    }
    accepted
}
