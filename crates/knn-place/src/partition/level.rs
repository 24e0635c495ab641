//! One level of the partition plus its hand-off records.

use std::collections::{BTreeSet, HashSet};

use nalgebra::Vector2;

use super::cell::VoronoiCell;
use super::error::PartitionError;
use crate::geom2::{FeasibilitySolver, Frame, PointId};

/// All retained cells of one order, in construction order.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionLevel {
    order: usize,
    cells: Vec<VoronoiCell>,
    /// Frame the solver works in for `records`.
    frame: Frame,
}

/// Representative query coordinate for one cell and the neighbours a kNN
/// query there returns.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighbourRecord {
    pub query_point: Vector2<f64>,
    /// Sorted identifiers.
    pub neighbours: Vec<PointId>,
    /// Radius of the disc around `query_point` that stays inside the cell (capped).
    pub clearance: f64,
}

impl PartitionLevel {
    pub fn new(order: usize, cells: Vec<VoronoiCell>) -> Self {
        Self::with_frame(order, cells, Frame::identity())
    }

    pub fn with_frame(order: usize, cells: Vec<VoronoiCell>, frame: Frame) -> Self {
        Self {
            order,
            cells,
            frame,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    #[inline]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
    pub fn into_cells(self) -> Vec<VoronoiCell> {
        self.cells
    }

    /// Distinct neighbour sets in first-seen order.
    pub fn neighbour_sets(&self) -> Vec<&BTreeSet<PointId>> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .map(VoronoiCell::neighbours)
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Keep the first cell of each neighbour set. Optional post-processing;
    /// the combiner itself keeps every branch's cell.
    pub fn dedup_by_neighbours(self) -> Self {
        let mut seen: HashSet<BTreeSet<PointId>> = HashSet::new();
        let cells = self
            .cells
            .into_iter()
            .filter(|c| seen.insert(c.neighbours().clone()))
            .collect();
        Self {
            order: self.order,
            cells,
            frame: self.frame,
        }
    }

    /// One record per cell, placed at the cell's Chebyshev centre (radius capped at `max_radius`).
    ///
    /// The LP runs in the level's frame; point and clearance come back in caller units.
    ///
    /// # Errors
    /// Solver failures propagate; a retained cell that turns out empty is an invariant violation.
    pub fn records<S: FeasibilitySolver + ?Sized>(
        &self,
        solver: &S,
        max_radius: f64,
    ) -> Result<Vec<NeighbourRecord>, PartitionError> {
        let frame = self.frame;
        self.cells
            .iter()
            .map(|cell| {
                let local = cell.map_halfspaces(|h| frame.halfspace_to_local(h));
                let (centre, radius) = local
                    .interior_point(solver, max_radius / frame.scale)?
                    .ok_or_else(|| {
                        PartitionError::invariant(format!(
                            "retained cell {:?} has an empty region",
                            cell.neighbours()
                        ))
                    })?;
                Ok(NeighbourRecord {
                    query_point: frame.to_global(centre),
                    neighbours: cell.neighbours().iter().copied().collect(),
                    clearance: radius * frame.scale,
                })
            })
            .collect()
    }
}
