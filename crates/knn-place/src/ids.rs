//! Injected identifier sources for data points.
//!
//! Identifiers are handed out once and never reused. Tests use
//! `SequentialIds` for exact, reproducible assignments; drivers that want
//! opaque tags use `RandomIds` over a seeded generator.

use std::collections::HashSet;

use nalgebra::Vector2;
use rand::Rng;

use crate::geom2::{PointId, Site};

/// Source of fresh, unique point identifiers.
pub trait IdSource {
    fn next_id(&mut self) -> PointId;
}

/// Deterministic counter starting at `next`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> PointId {
        let id = PointId(self.next);
        self.next += 1;
        id
    }
}

/// Random 64-bit tags from an injected generator; redraws on collision.
#[derive(Debug)]
pub struct RandomIds<R> {
    rng: R,
    issued: HashSet<u64>,
}

impl<R: Rng> RandomIds<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }
}

impl<R: Rng> IdSource for RandomIds<R> {
    fn next_id(&mut self) -> PointId {
        loop {
            let v = self.rng.gen::<u64>();
            if self.issued.insert(v) {
                return PointId(v);
            }
        }
    }
}

/// Tag each coordinate with a fresh identifier, in order.
pub fn assign_ids<I: IdSource + ?Sized>(points: &[Vector2<f64>], ids: &mut I) -> Vec<Site> {
    points
        .iter()
        .map(|&pos| Site {
            id: ids.next_id(),
            pos,
        })
        .collect()
}
