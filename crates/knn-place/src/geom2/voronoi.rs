//! First-order planar Voronoi boundaries from a Delaunay triangulation.
//!
//! Each Delaunay edge `(p, q)` is dual to a Voronoi ridge on the bisector of
//! `p` and `q`:
//! - interior edge (two triangles): finite ridge between the circumcentres;
//! - hull edge (one triangle): infinite ray anchored at the circumcentre,
//!   reported by the site difference `q - p` (the normal of the ridge line).
//!
//! Collinear inputs (no triangles, including two points) are handled directly:
//! consecutive points along the line are separated by parallel bisectors.

use delaunator::{triangulate, Point, EMPTY};
use nalgebra::Vector2;

use super::types::GeomCfg;

/// Infinite Voronoi ridge: the line through `anchor` with normal `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub anchor: Vector2<f64>,
    pub direction: Vector2<f64>,
}

/// Boundary pieces of one site's Voronoi region.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteBoundary {
    pub segments: Vec<[Vector2<f64>; 2]>,
    pub rays: Vec<Ray>,
}

impl SiteBoundary {
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len() + self.rays.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Region touches infinity (site on the convex hull).
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        !self.rays.is_empty()
    }
}

/// Per-site Voronoi boundaries, indexed like `points`.
///
/// Ridges whose two circumcentres coincide within `cfg.eps_vertex` (cocircular
/// sites) are dropped: they have no extent and their segment defines no line.
pub fn voronoi_boundaries(points: &[Vector2<f64>], cfg: &GeomCfg) -> Vec<SiteBoundary> {
    let mut out = vec![SiteBoundary::default(); points.len()];
    if points.len() < 2 {
        return out;
    }
    let dpts: Vec<Point> = points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
    let tri = triangulate(&dpts);
    if tri.triangles.is_empty() {
        collinear_boundaries(points, &mut out);
        return out;
    }
    let centres: Vec<Option<Vector2<f64>>> = tri
        .triangles
        .chunks_exact(3)
        .map(|t| circumcentre(points[t[0]], points[t[1]], points[t[2]]))
        .collect();

    for e in 0..tri.triangles.len() {
        let p = tri.triangles[e];
        let q = tri.triangles[next_halfedge(e)];
        let twin = tri.halfedges[e];
        let bisector = bisector_ray(points[p], points[q]);
        if twin == EMPTY {
            let ray = Ray {
                anchor: centres[e / 3].unwrap_or(bisector.anchor),
                direction: bisector.direction,
            };
            out[p].rays.push(ray);
            out[q].rays.push(ray);
        } else if e < twin {
            match (centres[e / 3], centres[twin / 3]) {
                (Some(c0), Some(c1)) => {
                    if (c0 - c1).norm() <= cfg.eps_vertex {
                        continue;
                    }
                    out[p].segments.push([c0, c1]);
                    out[q].segments.push([c0, c1]);
                }
                // Sliver triangle: fall back to the bisector line itself.
                _ => {
                    out[p].rays.push(bisector);
                    out[q].rays.push(bisector);
                }
            }
        }
    }
    out
}

#[inline]
fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// Bisector of `p` and `q` as a ray anchored at their midpoint.
#[inline]
fn bisector_ray(p: Vector2<f64>, q: Vector2<f64>) -> Ray {
    Ray {
        anchor: (p + q) * 0.5,
        direction: q - p,
    }
}

fn circumcentre(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> Option<Vector2<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-300 {
        return None;
    }
    let a2 = a.norm_squared();
    let b2 = b.norm_squared();
    let c2 = c.norm_squared();
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let u = Vector2::new(ux, uy);
    (u.x.is_finite() && u.y.is_finite()).then_some(u)
}

/// Collinear sites: lexicographic order is the order along the line.
fn collinear_boundaries(points: &[Vector2<f64>], out: &mut [SiteBoundary]) {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (points[i], points[j]);
        a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
    });
    for w in order.windows(2) {
        let ray = bisector_ray(points[w[0]], points[w[1]]);
        out[w[0]].rays.push(ray);
        out[w[1]].rays.push(ray);
    }
}
