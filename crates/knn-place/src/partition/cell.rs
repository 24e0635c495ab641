//! Voronoi cell: half-space system plus the neighbour set it answers with.

use std::collections::BTreeSet;

use nalgebra::Vector2;

use crate::geom2::{Feasibility, FeasibilitySolver, Halfspace, PointId, SolverError};

/// Convex region `{x : a_i·x >= b_i for all i}` labelled with the identifiers
/// of its nearest data points.
///
/// Invariants:
/// - Immutable after construction (fields are private).
/// - Neighbour identifiers are unique; `order()` is their count.
/// - Predicate order only affects reproducibility, never the region.
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiCell {
    halfspaces: Vec<Halfspace>,
    neighbours: BTreeSet<PointId>,
}

impl VoronoiCell {
    /// Duplicate identifiers collapse.
    pub fn new(halfspaces: Vec<Halfspace>, neighbours: impl IntoIterator<Item = PointId>) -> Self {
        Self {
            halfspaces,
            neighbours: neighbours.into_iter().collect(),
        }
    }

    #[inline]
    pub fn halfspaces(&self) -> &[Halfspace] {
        &self.halfspaces
    }

    /// Neighbour identifiers in canonical (sorted) order.
    #[inline]
    pub fn neighbours(&self) -> &BTreeSet<PointId> {
        &self.neighbours
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.neighbours.len()
    }

    /// Concatenated predicates, united neighbour sets. No simplification; the
    /// result still has to be feasibility-checked.
    pub fn combine(a: &Self, b: &Self) -> Self {
        let mut halfspaces = Vec::with_capacity(a.halfspaces.len() + b.halfspaces.len());
        halfspaces.extend_from_slice(&a.halfspaces);
        halfspaces.extend_from_slice(&b.halfspaces);
        Self {
            halfspaces,
            neighbours: a.neighbours.union(&b.neighbours).copied().collect(),
        }
    }

    pub fn feasible_point<S: FeasibilitySolver + ?Sized>(
        &self,
        solver: &S,
    ) -> Result<Feasibility, SolverError> {
        solver.feasible_point(&self.halfspaces)
    }

    /// Chebyshev centre with radius capped at `max_radius`; `None` if empty.
    pub fn interior_point<S: FeasibilitySolver + ?Sized>(
        &self,
        solver: &S,
        max_radius: f64,
    ) -> Result<Option<(Vector2<f64>, f64)>, SolverError> {
        solver.interior_point(&self.halfspaces, max_radius)
    }

    /// Same neighbours, every predicate mapped through `f`.
    pub(crate) fn map_halfspaces(&self, f: impl Fn(&Halfspace) -> Halfspace) -> Self {
        Self {
            halfspaces: self.halfspaces.iter().map(f).collect(),
            neighbours: self.neighbours.clone(),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vector2<f64>, eps: f64) -> bool {
        self.halfspaces.iter().all(|h| h.satisfies_eps(p, eps))
    }
}
