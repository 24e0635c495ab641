//! Brute-force baseline: sample a grid, collect distinct kNN sets, search covers.
//!
//! Independent of the Voronoi construction, so it doubles as a cross-check.
//! The search space is estimated as `C(C(N, k), ceil(N / k))` before any
//! sampling; above the configured ceiling the call is refused.

use std::collections::{BTreeSet, HashSet};

use nalgebra::Vector2;
use thiserror::Error;
use tracing::{debug, info};

use crate::cover::{binomial, smallest_cover, CoverError, CoverSearch};
use crate::geom2::{Bounds2, PointId, Site};
use crate::knn::{HilbertIndex, NeighbourIndex};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridSearchError {
    #[error("invalid grid search params: {reason}")]
    InvalidParams { reason: String },
    #[error("search space estimate {estimate} exceeds the ceiling {ceiling}")]
    CeilingExceeded { estimate: u128, ceiling: u128 },
    #[error(transparent)]
    Cover(#[from] CoverError),
}

impl GridSearchError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

/// Grid search configuration.
#[derive(Clone, Copy, Debug)]
pub struct GridSearchCfg {
    /// Samples per axis (inclusive of both bounds).
    pub resolution: usize,
    /// Safety valve on the estimated number of combinations; a policy choice,
    /// not a correctness bound.
    pub ceiling: u128,
}

impl Default for GridSearchCfg {
    fn default() -> Self {
        Self {
            resolution: 50,
            ceiling: 10_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridSearchOutcome {
    /// Query coordinates whose kNN sets jointly cover every site.
    Found(Vec<Vector2<f64>>),
    /// No subset of the sampled kNN sets covers every site.
    NotFound,
}

/// `C(C(n, k), ceil(n / k))`, saturating.
pub fn estimate_search_space(n: usize, k: usize) -> u128 {
    if k == 0 {
        return u128::MAX;
    }
    let sets = binomial(n as u128, k as u128);
    binomial(sets, n.div_ceil(k) as u128)
}

/// `resolution` evenly spaced values from `lo` to `hi` inclusive.
fn linspace(lo: f64, hi: f64, resolution: usize) -> impl Iterator<Item = f64> {
    let step = (hi - lo) / (resolution - 1) as f64;
    (0..resolution).map(move |i| if i + 1 == resolution { hi } else { lo + step * i as f64 })
}

/// Smallest set of grid points whose k nearest sites cover all `sites`.
///
/// # Errors
/// `InvalidParams` for `k ∉ 1..=N`, `resolution < 2`, invalid bounds or repeated
/// identifiers; `CeilingExceeded` before any sampling when the estimate is too large.
pub fn grid_search(
    sites: &[Site],
    k: usize,
    bounds: Bounds2,
    cfg: &GridSearchCfg,
) -> Result<GridSearchOutcome, GridSearchError> {
    if k == 0 || k > sites.len() {
        return Err(GridSearchError::invalid(format!(
            "k = {k} must be in 1..={}",
            sites.len()
        )));
    }
    if cfg.resolution < 2 {
        return Err(GridSearchError::invalid("resolution must be at least 2"));
    }
    if !bounds.is_valid() {
        return Err(GridSearchError::invalid(format!("bounds {bounds:?}")));
    }
    let universe: BTreeSet<PointId> = sites.iter().map(|s| s.id).collect();
    if universe.len() != sites.len() {
        return Err(GridSearchError::invalid("site identifiers repeat"));
    }
    let estimate = estimate_search_space(sites.len(), k);
    if estimate > cfg.ceiling {
        return Err(GridSearchError::CeilingExceeded {
            estimate,
            ceiling: cfg.ceiling,
        });
    }

    let index = HilbertIndex::build(sites);
    let mut seen: HashSet<BTreeSet<PointId>> = HashSet::new();
    let mut points: Vec<Vector2<f64>> = Vec::new();
    let mut sets: Vec<BTreeSet<PointId>> = Vec::new();
    for x in linspace(bounds.min.x, bounds.max.x, cfg.resolution) {
        for y in linspace(bounds.min.y, bounds.max.y, cfg.resolution) {
            let p = Vector2::new(x, y);
            let set: BTreeSet<PointId> = index.nearest(p, k).into_iter().collect();
            if seen.insert(set.clone()) {
                points.push(p);
                sets.push(set);
            }
        }
    }
    info!(
        grid_points = cfg.resolution * cfg.resolution,
        distinct_sets = sets.len(),
        "grid sampled"
    );

    let search = CoverSearch {
        min_size: sites.len().div_ceil(k),
        ceiling: None,
    };
    match smallest_cover(&sets, &universe, search)? {
        Some(pick) => {
            debug!(size = pick.len(), "cover found");
            Ok(GridSearchOutcome::Found(
                pick.into_iter().map(|i| points[i]).collect(),
            ))
        }
        None => Ok(GridSearchOutcome::NotFound),
    }
}
