//! Uniform data-point sampling in an axis-aligned window.

use nalgebra::Vector2;
use rand::Rng;

use crate::geom2::{Bounds2, Site};
use crate::ids::IdSource;

/// One coordinate uniform in `bounds` (half-open on the upper edges).
///
/// Callers check `bounds.is_valid()`; an empty range panics inside `rand`.
#[inline]
pub fn uniform_in<R: Rng + ?Sized>(bounds: &Bounds2, rng: &mut R) -> Vector2<f64> {
    Vector2::new(
        rng.gen_range(bounds.min.x..bounds.max.x),
        rng.gen_range(bounds.min.y..bounds.max.y),
    )
}

/// `n` sites uniform in `bounds`, tagged from `ids`. `None` for invalid bounds.
pub fn uniform_points<R, I>(n: usize, bounds: Bounds2, rng: &mut R, ids: &mut I) -> Option<Vec<Site>>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    if !bounds.is_valid() {
        return None;
    }
    Some(
        (0..n)
            .map(|_| Site {
                pos: uniform_in(&bounds, rng),
                id: ids.next_id(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom2::PointId;
    use crate::ids::SequentialIds;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn points_stay_in_bounds_and_ids_count_up() {
        let mut rng = StdRng::seed_from_u64(3);
        let b = Bounds2::new((-2.0, 1.0), (4.0, 5.0));
        let pts = uniform_points(50, b, &mut rng, &mut SequentialIds::default()).unwrap();
        assert_eq!(pts.len(), 50);
        assert!(pts.iter().all(|s| b.contains(s.pos)));
        assert_eq!(pts[49].id, PointId(49));
    }

    #[test]
    fn same_seed_same_points() {
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            uniform_points(10, Bounds2::default(), &mut rng, &mut SequentialIds::default())
        };
        assert_eq!(draw(11), draw(11));
        assert_ne!(draw(11), draw(12));
    }

    #[test]
    fn invalid_bounds_give_none() {
        let mut rng = StdRng::seed_from_u64(0);
        let b = Bounds2::new((1.0, 1.0), (0.0, 1.0));
        assert!(uniform_points(3, b, &mut rng, &mut SequentialIds::default()).is_none());
    }
}
