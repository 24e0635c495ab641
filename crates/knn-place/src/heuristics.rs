//! Greedy query-point strategies that place queries on data points.
//!
//! Neither strategy is optimal; both stop once every site has been returned by
//! some query. They serve as baselines against `plan::plan_from_partition`.

use std::collections::{BTreeSet, HashMap};

use nalgebra::Vector2;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::geom2::{PointId, Site};
use crate::knn::{HilbertIndex, NeighbourIndex};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HeuristicError {
    #[error("k = {k} must be in 1..={sites}")]
    InvalidK { k: usize, sites: usize },
}

fn check_k(sites: &[Site], k: usize) -> Result<(), HeuristicError> {
    if k == 0 || k > sites.len() {
        return Err(HeuristicError::InvalidK {
            k,
            sites: sites.len(),
        });
    }
    Ok(())
}

/// Query at a uniformly drawn not-yet-retrieved site until every site is retrieved.
pub fn uniform_random<R: Rng + ?Sized>(
    sites: &[Site],
    k: usize,
    rng: &mut R,
) -> Result<Vec<Vector2<f64>>, HeuristicError> {
    check_k(sites, k)?;
    let index = HilbertIndex::build(sites);
    let mut retrieved: BTreeSet<PointId> = BTreeSet::new();
    let mut queries = Vec::new();
    loop {
        let remaining: Vec<&Site> = sites.iter().filter(|s| !retrieved.contains(&s.id)).collect();
        let Some(pick) = remaining.choose(rng) else {
            break;
        };
        queries.push(pick.pos);
        // Co-located sites may tie at distance zero; the query site always counts.
        retrieved.insert(pick.id);
        retrieved.extend(index.nearest(pick.pos, k));
        debug!(queries = queries.len(), retrieved = retrieved.len(), "uniform step");
    }
    Ok(queries)
}

/// Index into `remaining` of the site that shows up least often in the k-NN
/// lists of the remaining sites. Ties go to the first.
fn extreme_point(remaining: &[Site], k: usize) -> usize {
    let index = HilbertIndex::build(remaining);
    let k = k.min(remaining.len());
    let mut counts: HashMap<PointId, usize> = HashMap::new();
    for s in remaining {
        for id in index.nearest(s.pos, k) {
            *counts.entry(id).or_default() += 1;
        }
    }
    let mut best = 0;
    let mut best_count = usize::MAX;
    for (i, s) in remaining.iter().enumerate() {
        let c = counts.get(&s.id).copied().unwrap_or(0);
        if c < best_count {
            best = i;
            best_count = c;
        }
    }
    best
}

/// Repeatedly query at the most isolated unretrieved site.
///
/// The extreme point is chosen among the unretrieved sites only; its k nearest
/// neighbours are looked up in the full set.
pub fn trim_extremities(sites: &[Site], k: usize) -> Result<Vec<Vector2<f64>>, HeuristicError> {
    check_k(sites, k)?;
    let index = HilbertIndex::build(sites);
    let mut retrieved: BTreeSet<PointId> = BTreeSet::new();
    let mut queries = Vec::new();
    while retrieved.len() < sites.len() {
        let remaining: Vec<Site> = sites
            .iter()
            .filter(|s| !retrieved.contains(&s.id))
            .copied()
            .collect();
        let pick = remaining[extreme_point(&remaining, k)];
        queries.push(pick.pos);
        retrieved.insert(pick.id);
        retrieved.extend(index.nearest(pick.pos, k));
        debug!(queries = queries.len(), retrieved = retrieved.len(), "trim step");
    }
    Ok(queries)
}
