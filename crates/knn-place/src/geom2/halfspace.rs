//! Half-spaces from Voronoi boundary pieces.
//!
//! Both constructors pick the side of the boundary line that contains a
//! reference point and return it as `a·x >= b`. A reference point lying on the
//! line leaves the side undetermined; that is an input error, never an empty
//! region.

use nalgebra::Vector2;
use thiserror::Error;

use super::types::Halfspace;

/// Degenerate geometry: the side of a boundary line cannot be decided.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The reference point lies exactly on the boundary line.
    #[error("point ({x}, {y}) lies on the boundary line; side is undetermined")]
    Degenerate { x: f64, y: f64 },
}

impl GeometryError {
    fn on_line(p: Vector2<f64>) -> Self {
        Self::Degenerate { x: p.x, y: p.y }
    }
}

/// Sign as -1, 0 or 1. NaN maps to 0 so it is rejected like a point on the line.
#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Half-space bounded by the line through `segment` on the side of `inside`.
///
/// Vertical segments give `(±1, 0)·x >= ±x0`; all others are written in
/// slope/intercept form `y = m x + c`, giving `(-s m, s)·x >= s c` with `s`
/// the side of `inside`.
pub fn from_segment(
    segment: [Vector2<f64>; 2],
    inside: Vector2<f64>,
) -> Result<Halfspace, GeometryError> {
    let [p0, p1] = segment;
    if p1.x == p0.x {
        let s = sign(inside.x - p0.x);
        if s == 0.0 {
            return Err(GeometryError::on_line(inside));
        }
        return Ok(Halfspace::new(Vector2::new(s, 0.0), s * p0.x));
    }
    let m = (p1.y - p0.y) / (p1.x - p0.x);
    let c = p0.y - m * p0.x;
    let s = sign(inside.y - m * inside.x - c);
    if s == 0.0 {
        return Err(GeometryError::on_line(inside));
    }
    Ok(Halfspace::new(Vector2::new(-s * m, s), s * c))
}

/// Half-space bounded by the line `{x : direction·x = direction·anchor}` on the side of `inside`.
///
/// `direction` is the line's normal; for a Voronoi ray it is the difference of
/// the two sites the ray separates.
pub fn from_ray(
    direction: Vector2<f64>,
    anchor: Vector2<f64>,
    inside: Vector2<f64>,
) -> Result<Halfspace, GeometryError> {
    let b = direction.dot(&anchor);
    let s = sign(direction.dot(&inside) - b);
    if s == 0.0 {
        return Err(GeometryError::on_line(inside));
    }
    Ok(Halfspace::new(direction * s, b * s))
}
