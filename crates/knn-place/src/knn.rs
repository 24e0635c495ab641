//! Spatial k-nearest-neighbour lookups over sites.

use aabb::HilbertRTree;
use nalgebra::Vector2;

use crate::geom2::{PointId, Site};

/// k nearest site identifiers of a query coordinate, nearest first.
pub trait NeighbourIndex {
    fn nearest(&self, p: Vector2<f64>, k: usize) -> Vec<PointId>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Static Hilbert R-tree over point boxes.
#[derive(Debug)]
pub struct HilbertIndex {
    tree: HilbertRTree,
    ids: Vec<PointId>,
}

impl HilbertIndex {
    pub fn build(sites: &[Site]) -> Self {
        let mut tree = HilbertRTree::with_capacity(sites.len());
        for s in sites {
            tree.add(s.pos.x, s.pos.y, s.pos.x, s.pos.y);
        }
        if !sites.is_empty() {
            tree.build();
        }
        Self {
            tree,
            ids: sites.iter().map(|s| s.id).collect(),
        }
    }
}

impl NeighbourIndex for HilbertIndex {
    fn nearest(&self, p: Vector2<f64>, k: usize) -> Vec<PointId> {
        if k == 0 || self.ids.is_empty() {
            return Vec::new();
        }
        let mut hits = Vec::with_capacity(k);
        self.tree.query_nearest_k(p.x, p.y, k, &mut hits);
        hits.truncate(k);
        hits.into_iter().map(|i| self.ids[i]).collect()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
