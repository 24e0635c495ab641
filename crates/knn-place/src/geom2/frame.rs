//! Similarity frame `x = origin + scale · q` for well-conditioned LPs.
//!
//! Sites given in large absolute coordinates (projected metres, say) put
//! `|b|` many orders above the cell sizes, and the simplex residuals then
//! exceed any fixed slack. Working in local coordinates centred on the sites
//! and scaled to their spread makes every tolerance relative to the data.

use nalgebra::Vector2;

use super::types::{Halfspace, Site};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub origin: Vector2<f64>,
    /// Strictly positive.
    pub scale: f64,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    pub fn identity() -> Self {
        Self {
            origin: Vector2::zeros(),
            scale: 1.0,
        }
    }

    /// Centroid of `sites`, scaled by the largest distance from it.
    /// Empty, single-point or non-finite inputs give the identity scale.
    pub fn fit(sites: &[Site]) -> Self {
        if sites.is_empty() {
            return Self::identity();
        }
        let origin = sites.iter().fold(Vector2::zeros(), |acc, s| acc + s.pos) / sites.len() as f64;
        let spread = sites
            .iter()
            .map(|s| (s.pos - origin).norm())
            .fold(0.0, f64::max);
        if !(origin.iter().all(|v| v.is_finite()) && spread.is_finite() && spread > 0.0) {
            return Self::identity();
        }
        Self {
            origin,
            scale: spread,
        }
    }

    #[inline]
    pub fn to_local(&self, p: Vector2<f64>) -> Vector2<f64> {
        (p - self.origin) / self.scale
    }
    #[inline]
    pub fn to_global(&self, q: Vector2<f64>) -> Vector2<f64> {
        self.origin + q * self.scale
    }

    /// Same set expressed in local coordinates: `a·q >= (b - a·origin) / scale`.
    #[inline]
    pub fn halfspace_to_local(&self, h: &Halfspace) -> Halfspace {
        Halfspace::new(h.a, (h.b - h.a.dot(&self.origin)) / self.scale)
    }
    #[inline]
    pub fn halfspace_to_global(&self, h: &Halfspace) -> Halfspace {
        Halfspace::new(h.a, h.b * self.scale + h.a.dot(&self.origin))
    }

    pub fn site_to_local(&self, s: &Site) -> Site {
        Site {
            id: s.id,
            pos: self.to_local(s.pos),
        }
    }
}
