//! Small 2D linear programs over half-space systems.
//!
//! - `FeasibilitySolver::feasible_point`: pure feasibility (no objective) over two free variables.
//! - `FeasibilitySolver::interior_point`: Chebyshev centre with a capped radius.
//!
//! Three outcomes are kept apart: a point, an empty region (`Feasibility::Infeasible`),
//! and a solver failure (`SolverError`). Callers must never read a failure as emptiness.
//! Every point handed back is re-checked against all constraints.

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use nalgebra::Vector2;
use thiserror::Error;

use super::types::{GeomCfg, Halfspace};

/// Solver breakdown, distinct from an empty region.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("LP backend failed: {message}")]
    Backend { message: String },
    #[error("LP returned a non-finite point ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
    #[error("LP point violates constraint {index} by {violation:e}")]
    Unverified { index: usize, violation: f64 },
    #[error("invalid radius cap {max_radius}")]
    InvalidRadius { max_radius: f64 },
}

/// Outcome of a feasibility solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feasibility {
    Feasible(Vector2<f64>),
    Infeasible,
}

impl Feasibility {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible(_))
    }
    #[inline]
    pub fn point(self) -> Option<Vector2<f64>> {
        match self {
            Feasibility::Feasible(p) => Some(p),
            Feasibility::Infeasible => None,
        }
    }
}

/// Linear feasibility over `{x ∈ R² : a_i·x >= b_i}`.
pub trait FeasibilitySolver {
    /// Any point satisfying all constraints, or `Infeasible` if there is none.
    fn feasible_point(&self, hs: &[Halfspace]) -> Result<Feasibility, SolverError>;

    /// Centre and radius of the largest disc (radius at most `max_radius`) inside
    /// the region; `None` if the region is empty.
    fn interior_point(
        &self,
        hs: &[Halfspace],
        max_radius: f64,
    ) -> Result<Option<(Vector2<f64>, f64)>, SolverError>;
}

/// Dense simplex backend (`microlp`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SimplexSolver {
    pub cfg: GeomCfg,
}

impl SimplexSolver {
    pub fn new(cfg: GeomCfg) -> Self {
        Self { cfg }
    }
}

impl FeasibilitySolver for SimplexSolver {
    fn feasible_point(&self, hs: &[Halfspace]) -> Result<Feasibility, SolverError> {
        if hs.is_empty() {
            return Ok(Feasibility::Feasible(Vector2::zeros()));
        }
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let x = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
        let y = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
        for h in hs {
            problem.add_constraint(&[(x, h.a.x), (y, h.a.y)], ComparisonOp::Ge, h.b);
        }
        match problem.solve() {
            Ok(solution) => {
                let p = Vector2::new(solution[x], solution[y]);
                verify_point(hs, p, self.cfg.eps_feas)?;
                Ok(Feasibility::Feasible(p))
            }
            Err(microlp::Error::Infeasible) => Ok(Feasibility::Infeasible),
            Err(err) => Err(SolverError::Backend {
                message: err.to_string(),
            }),
        }
    }

    fn interior_point(
        &self,
        hs: &[Halfspace],
        max_radius: f64,
    ) -> Result<Option<(Vector2<f64>, f64)>, SolverError> {
        if !(max_radius.is_finite() && max_radius >= 0.0) {
            return Err(SolverError::InvalidRadius { max_radius });
        }
        if hs.is_empty() {
            return Ok(Some((Vector2::zeros(), max_radius)));
        }
        // a·x - |a| r >= b keeps the whole disc of radius r inside each half-space.
        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let x = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
        let y = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
        let r = problem.add_var(1.0, (0.0, max_radius));
        for h in hs {
            problem.add_constraint(
                &[(x, h.a.x), (y, h.a.y), (r, -h.a.norm())],
                ComparisonOp::Ge,
                h.b,
            );
        }
        match problem.solve() {
            Ok(solution) => {
                let p = Vector2::new(solution[x], solution[y]);
                verify_point(hs, p, self.cfg.eps_feas)?;
                Ok(Some((p, solution[r].clamp(0.0, max_radius))))
            }
            Err(microlp::Error::Infeasible) => Ok(None),
            Err(err) => Err(SolverError::Backend {
                message: err.to_string(),
            }),
        }
    }
}

/// Check `p` against every constraint with slack `eps · max(1, |a|)`.
pub fn verify_point(hs: &[Halfspace], p: Vector2<f64>, eps: f64) -> Result<(), SolverError> {
    if !(p.x.is_finite() && p.y.is_finite()) {
        return Err(SolverError::NonFinite { x: p.x, y: p.y });
    }
    for (index, h) in hs.iter().enumerate() {
        if !h.satisfies_eps(p, eps) {
            return Err(SolverError::Unverified {
                index,
                violation: -h.slack(p),
            });
        }
    }
    Ok(())
}
