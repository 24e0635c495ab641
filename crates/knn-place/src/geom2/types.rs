//! Basic 2D types and tolerances used by the half-space cells.
//!
//! - `GeomCfg`: centralizes epsilons for vertex merging and feasibility checks.
//! - `Halfspace`: closed half-space `a·x >= b` with helper predicates.
//! - `PointId`, `Site`: data points carrying stable identifiers.
//! - `Bounds2`: axis-aligned sampling window.

use std::fmt;

use nalgebra::Vector2;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug)]
pub struct GeomCfg {
    /// Two Voronoi vertices closer than this are the same vertex (cocircular sites).
    pub eps_vertex: f64,
    /// Slack allowed when verifying a solver point against a constraint,
    /// scaled by `max(1, |a|)` of that constraint. Partitions solve in a
    /// `Frame` of unit spread, where this is relative to the data.
    pub eps_feas: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_vertex: 1e-9,
            eps_feas: 1e-6,
        }
    }
}

/// Closed half-space `a · x >= b` (no normalization required here).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Halfspace {
    pub a: Vector2<f64>,
    pub b: f64,
}

impl Halfspace {
    #[inline]
    pub fn new(a: Vector2<f64>, b: f64) -> Self {
        Self { a, b }
    }
    /// Signed slack `a·p - b`; non-negative inside.
    #[inline]
    pub fn slack(&self, p: Vector2<f64>) -> f64 {
        self.a.dot(&p) - self.b
    }
    #[inline]
    pub fn satisfies_eps(&self, p: Vector2<f64>, eps: f64) -> bool {
        self.slack(p) >= -eps * self.a.norm().max(1.0)
    }
}

/// Stable identifier of a data point. Assigned once, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A data point: coordinate plus identifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    pub id: PointId,
    pub pos: Vector2<f64>,
}

impl Site {
    #[inline]
    pub fn new(id: PointId, x: f64, y: f64) -> Self {
        Self {
            id,
            pos: Vector2::new(x, y),
        }
    }
}

/// Axis-aligned window `[min.x, max.x] × [min.y, max.y]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl Bounds2 {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            min: Vector2::new(x.0, y.0),
            max: Vector2::new(x.1, y.1),
        }
    }
    /// Finite and strictly positive extent on both axes.
    pub fn is_valid(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
            && self.min.x < self.max.x
            && self.min.y < self.max.y
    }
    #[inline]
    pub fn contains(&self, p: Vector2<f64>) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::new((0.0, 10.0), (0.0, 10.0))
    }
}
