//! Synthetic data sets with a known query plan.
//!
//! Purpose
//! - Draw a few query centres, then grow a cluster of data points around
//!   each so that querying a centre returns (mostly) its own cluster. The
//!   centres are a reference answer for the placement strategies.
//!
//! Acceptance (per candidate drawn from `N(centre, sd)`)
//! - farther from every other centre than that centre's furthest accepted point;
//! - its own centre is the closest centre (first wins on ties).
//!
//! Rejected candidates are redrawn up to `max_attempts` times per point.

use nalgebra::Vector2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;
use tracing::{debug, trace};

use crate::geom2::{Bounds2, PointId, Site};
use crate::ids::IdSource;
use crate::sample::uniform_in;

const MIN_NORMAL_SD: f64 = 0.1;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("invalid simulation params: {reason}")]
    InvalidParams { reason: String },
    #[error("no acceptable point for query centre {query_point} after {attempts} attempts; reduce max_normal_sd or widen the bounds")]
    RetriesExhausted { query_point: PointId, attempts: usize },
}

impl SimulationError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SimulationCfg {
    /// Inclusive lower bound on the number of centres.
    pub min_query_points: usize,
    /// Exclusive upper bound on the number of centres.
    pub max_query_points: usize,
    pub points_per_query_point: usize,
    /// Window for the centres; data points may fall outside it.
    pub bounds: Bounds2,
    /// Per-centre standard deviations are uniform in `[0.1, max_normal_sd)`.
    pub max_normal_sd: f64,
    pub max_attempts: usize,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            min_query_points: 3,
            max_query_points: 6,
            points_per_query_point: 3,
            bounds: Bounds2::default(),
            max_normal_sd: 1.0,
            max_attempts: 100,
        }
    }
}

impl SimulationCfg {
    fn validate(&self) -> Result<(), SimulationError> {
        if self.min_query_points == 0 || self.min_query_points >= self.max_query_points {
            return Err(SimulationError::invalid(format!(
                "query point range {}..{} is empty or starts at zero",
                self.min_query_points, self.max_query_points
            )));
        }
        if self.points_per_query_point == 0 {
            return Err(SimulationError::invalid("points_per_query_point must be positive"));
        }
        if !self.bounds.is_valid() {
            return Err(SimulationError::invalid(format!("bounds {:?}", self.bounds)));
        }
        if !(self.max_normal_sd.is_finite() && self.max_normal_sd > MIN_NORMAL_SD) {
            return Err(SimulationError::invalid(format!(
                "max_normal_sd must exceed {MIN_NORMAL_SD}"
            )));
        }
        if self.max_attempts == 0 {
            return Err(SimulationError::invalid("max_attempts must be positive"));
        }
        Ok(())
    }
}

/// Centre of one synthetic cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryCentre {
    pub id: PointId,
    pub pos: Vector2<f64>,
    pub normal_sd: f64,
}

/// Data point plus the centre it was drawn around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatedPoint {
    pub site: Site,
    pub query_point: PointId,
    /// Distance to `query_point`.
    pub distance: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    pub query_points: Vec<QueryCentre>,
    pub data_points: Vec<SimulatedPoint>,
}

impl Simulation {
    pub fn sites(&self) -> Vec<Site> {
        self.data_points.iter().map(|p| p.site).collect()
    }
}

/// Draw `[min_query_points, max_query_points)` centres uniform in the bounds.
pub fn draw_query_centres<R, I>(
    cfg: &SimulationCfg,
    rng: &mut R,
    ids: &mut I,
) -> Result<Vec<QueryCentre>, SimulationError>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    cfg.validate()?;
    let n = rng.gen_range(cfg.min_query_points..cfg.max_query_points);
    Ok((0..n)
        .map(|_| QueryCentre {
            id: ids.next_id(),
            pos: uniform_in(&cfg.bounds, rng),
            normal_sd: rng.gen_range(MIN_NORMAL_SD..cfg.max_normal_sd),
        })
        .collect())
}

/// Grow `points_per_query_point` accepted points around each centre, in centre order.
pub fn points_around<R, I>(
    centres: &[QueryCentre],
    cfg: &SimulationCfg,
    rng: &mut R,
    ids: &mut I,
) -> Result<Vec<SimulatedPoint>, SimulationError>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    // Furthest accepted distance per centre; `None` until it has a point.
    let mut furthest: Vec<Option<f64>> = vec![None; centres.len()];
    let mut out = Vec::with_capacity(centres.len() * cfg.points_per_query_point);
    for (qi, centre) in centres.iter().enumerate() {
        let normal = Normal::new(0.0, centre.normal_sd)
            .map_err(|e| SimulationError::invalid(format!("normal_sd {}: {e}", centre.normal_sd)))?;
        for _ in 0..cfg.points_per_query_point {
            let mut accepted = None;
            for attempt in 0..cfg.max_attempts {
                let p = centre.pos + Vector2::new(normal.sample(rng), normal.sample(rng));
                if acceptable(p, qi, centres, &furthest) {
                    accepted = Some(p);
                    break;
                }
                trace!(query_point = %centre.id, attempt, "resampling");
            }
            let Some(pos) = accepted else {
                return Err(SimulationError::RetriesExhausted {
                    query_point: centre.id,
                    attempts: cfg.max_attempts,
                });
            };
            let distance = (pos - centre.pos).norm();
            furthest[qi] = Some(furthest[qi].map_or(distance, |d| d.max(distance)));
            out.push(SimulatedPoint {
                site: Site {
                    id: ids.next_id(),
                    pos,
                },
                query_point: centre.id,
                distance,
            });
        }
        debug!(query_point = %centre.id, points = cfg.points_per_query_point, "cluster done");
    }
    Ok(out)
}

fn acceptable(p: Vector2<f64>, own: usize, centres: &[QueryCentre], furthest: &[Option<f64>]) -> bool {
    let mut closest = 0;
    let mut closest_d = f64::INFINITY;
    for (i, c) in centres.iter().enumerate() {
        let d = (p - c.pos).norm();
        if i != own {
            if let Some(f) = furthest[i] {
                if d <= f {
                    return false;
                }
            }
        }
        if d < closest_d {
            closest = i;
            closest_d = d;
        }
    }
    closest == own
}

/// Centres and their clusters in one go.
pub fn simulate<R, I>(cfg: &SimulationCfg, rng: &mut R, ids: &mut I) -> Result<Simulation, SimulationError>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let query_points = draw_query_centres(cfg, rng, ids)?;
    let data_points = points_around(&query_points, cfg, rng, ids)?;
    debug!(
        query_points = query_points.len(),
        data_points = data_points.len(),
        "simulation done"
    );
    Ok(Simulation {
        query_points,
        data_points,
    })
}
