//! Query plans from a partition level: fewest records whose neighbour sets cover every site.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::info;

use crate::cover::{smallest_cover, CoverError, CoverSearch};
use crate::geom2::{FeasibilitySolver, PointId, Site};
use crate::partition::{NeighbourRecord, PartitionError, PartitionLevel};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error(transparent)]
    Cover(#[from] CoverError),
}

#[derive(Clone, Copy, Debug)]
pub struct PlanCfg {
    /// Cap on the inscribed-disc radius used to place each record; keeps
    /// unbounded hull cells finite.
    pub max_radius: f64,
    /// Per-size combination ceiling for the cover search.
    pub ceiling: u128,
}

impl Default for PlanCfg {
    fn default() -> Self {
        Self {
            max_radius: 1.0,
            ceiling: 10_000,
        }
    }
}

/// Selected records, in partition order.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub order: usize,
    pub records: Vec<NeighbourRecord>,
}

impl QueryPlan {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Dedup `level`, place one record per neighbour set and pick a smallest covering subset.
///
/// Sizes start at `ceil(N / order)`, the least any cover can use. `Ok(None)`
/// means the level's sets do not cover `sites` (only possible when the level
/// was filtered, e.g. with `min_inradius`).
pub fn plan_from_partition<S: FeasibilitySolver + ?Sized>(
    level: PartitionLevel,
    sites: &[Site],
    solver: &S,
    cfg: &PlanCfg,
) -> Result<Option<QueryPlan>, PlanError> {
    let order = level.order();
    let level = level.dedup_by_neighbours();
    let records = level.records(solver, cfg.max_radius)?;
    let sets: Vec<BTreeSet<PointId>> = records
        .iter()
        .map(|r| r.neighbours.iter().copied().collect())
        .collect();
    let universe: BTreeSet<PointId> = sites.iter().map(|s| s.id).collect();
    let search = CoverSearch {
        min_size: sites.len().div_ceil(order.max(1)),
        ceiling: Some(cfg.ceiling),
    };
    let Some(pick) = smallest_cover(&sets, &universe, search)? else {
        info!(order, candidates = records.len(), "no covering plan");
        return Ok(None);
    };
    info!(order, candidates = records.len(), size = pick.len(), "plan selected");
    let mut records: Vec<Option<NeighbourRecord>> = records.into_iter().map(Some).collect();
    let records = pick.into_iter().filter_map(|i| records[i].take()).collect();
    Ok(Some(QueryPlan { order, records }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom2::SimplexSolver;
    use crate::ids::{assign_ids, SequentialIds};
    use crate::knn::{HilbertIndex, NeighbourIndex};
    use crate::partition::{nth_order_partition, PartitionCfg};
    use nalgebra::Vector2;

    fn sites(coords: &[(f64, f64)]) -> Vec<Site> {
        let pts: Vec<Vector2<f64>> = coords.iter().map(|&(x, y)| Vector2::new(x, y)).collect();
        assign_ids(&pts, &mut SequentialIds::default())
    }

    #[test]
    fn square_pairs_need_two_queries() {
        let s = sites(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
        let solver = SimplexSolver::default();
        let cfg = PartitionCfg {
            min_inradius: Some(1e-6),
            ..PartitionCfg::default()
        };
        let level = nth_order_partition(&s, 2, &solver, &cfg).unwrap();
        let plan = plan_from_partition(level, &s, &solver, &PlanCfg::default())
            .unwrap()
            .expect("adjacent pairs cover the square");
        assert_eq!(plan.order, 2);
        assert_eq!(plan.len(), 2);

        let index = HilbertIndex::build(&s);
        let mut covered = BTreeSet::new();
        for r in &plan.records {
            assert!(r.clearance > 0.0);
            let mut got = index.nearest(r.query_point, 2);
            got.sort();
            assert_eq!(got, r.neighbours);
            covered.extend(got);
        }
        assert_eq!(covered.len(), 4);
    }

    #[test]
    fn order_one_plan_uses_every_site() {
        let s = sites(&[(1.0, 1.0), (8.0, 2.0), (4.0, 7.0)]);
        let solver = SimplexSolver::default();
        let level = nth_order_partition(&s, 1, &solver, &PartitionCfg::default()).unwrap();
        let plan = plan_from_partition(level, &s, &solver, &PlanCfg::default())
            .unwrap()
            .unwrap();
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn cover_ceiling_surfaces_as_plan_error() {
        let s = sites(&[(1.0, 1.0), (8.0, 2.0), (4.0, 7.0), (6.0, 6.0), (2.0, 9.0)]);
        let solver = SimplexSolver::default();
        let level = nth_order_partition(&s, 1, &solver, &PartitionCfg::default()).unwrap();
        let cfg = PlanCfg {
            ceiling: 0,
            ..PlanCfg::default()
        };
        assert!(matches!(
            plan_from_partition(level, &s, &solver, &cfg),
            Err(PlanError::Cover(CoverError::CeilingExceeded { size: 5, .. }))
        ));
    }
}
