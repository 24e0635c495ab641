//! First-order partition: one cell per site from its Voronoi boundary.

use std::collections::HashSet;

use nalgebra::Vector2;

use super::cell::VoronoiCell;
use super::error::PartitionError;
use crate::geom2::{from_ray, from_segment, voronoi_boundaries, GeomCfg, Site};

/// Reject inputs the Voronoi construction cannot label unambiguously:
/// fewer than two sites, repeated identifiers, non-finite or coincident coordinates.
pub fn validate_sites(sites: &[Site], cfg: &GeomCfg) -> Result<(), PartitionError> {
    if sites.len() < 2 {
        return Err(PartitionError::TooFewSites { found: sites.len() });
    }
    let mut seen = HashSet::with_capacity(sites.len());
    for s in sites {
        if !seen.insert(s.id) {
            return Err(PartitionError::DuplicateId { id: s.id });
        }
        if !(s.pos.x.is_finite() && s.pos.y.is_finite()) {
            return Err(PartitionError::NonFiniteSite { id: s.id });
        }
    }
    // Sweep in x; only sites within eps in x can coincide.
    let mut order: Vec<usize> = (0..sites.len()).collect();
    order.sort_by(|&i, &j| sites[i].pos.x.total_cmp(&sites[j].pos.x));
    for (k, &i) in order.iter().enumerate() {
        for &j in &order[k + 1..] {
            if sites[j].pos.x - sites[i].pos.x > cfg.eps_vertex {
                break;
            }
            if (sites[j].pos - sites[i].pos).norm() <= cfg.eps_vertex {
                return Err(PartitionError::DuplicateSite {
                    id: sites[i].id,
                    other: sites[j].id,
                });
            }
        }
    }
    Ok(())
}

/// Order-1 cells, one per site and in input order.
///
/// Finite ridges become half-spaces via `from_segment`, rays via `from_ray`,
/// each oriented towards the site itself.
pub fn first_order_cells(sites: &[Site], cfg: &GeomCfg) -> Result<Vec<VoronoiCell>, PartitionError> {
    validate_sites(sites, cfg)?;
    first_order_cells_unchecked(sites, cfg)
}

/// `first_order_cells` for inputs already validated (subsets of a valid set).
pub(crate) fn first_order_cells_unchecked(
    sites: &[Site],
    cfg: &GeomCfg,
) -> Result<Vec<VoronoiCell>, PartitionError> {
    let points: Vec<Vector2<f64>> = sites.iter().map(|s| s.pos).collect();
    let boundaries = voronoi_boundaries(&points, cfg);
    let mut cells = Vec::with_capacity(sites.len());
    for (site, bnd) in sites.iter().zip(boundaries) {
        let mut hs = Vec::with_capacity(bnd.len());
        for seg in &bnd.segments {
            hs.push(from_segment(*seg, site.pos)?);
        }
        for ray in &bnd.rays {
            hs.push(from_ray(ray.direction, ray.anchor, site.pos)?);
        }
        cells.push(VoronoiCell::new(hs, [site.id]));
    }
    Ok(cells)
}
