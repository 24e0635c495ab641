use std::collections::BTreeSet;

use nalgebra::{vector, Vector2};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;
use crate::geom2::{
    Feasibility, FeasibilitySolver, Halfspace, PointId, SimplexSolver, Site, SolverError,
};
use crate::ids::{assign_ids, SequentialIds};

fn sites(coords: &[(f64, f64)]) -> Vec<Site> {
    let pts: Vec<Vector2<f64>> = coords.iter().map(|&(x, y)| Vector2::new(x, y)).collect();
    assign_ids(&pts, &mut SequentialIds::default())
}

fn random_sites(n: usize, seed: u64) -> Vec<Site> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pts: Vec<Vector2<f64>> = (0..n)
        .map(|_| Vector2::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)))
        .collect();
    assign_ids(&pts, &mut SequentialIds::default())
}

/// Brute-force k nearest ids of `p` plus the gap between the k-th and (k+1)-th distance.
fn knn(sites: &[Site], p: Vector2<f64>, k: usize) -> (BTreeSet<PointId>, f64) {
    let mut d: Vec<(f64, PointId)> = sites.iter().map(|s| ((s.pos - p).norm(), s.id)).collect();
    d.sort_by(|a, b| a.0.total_cmp(&b.0));
    let gap = if k < d.len() {
        d[k].0 - d[k - 1].0
    } else {
        f64::INFINITY
    };
    (d[..k].iter().map(|&(_, id)| id).collect(), gap)
}

fn ids(v: &[u64]) -> BTreeSet<PointId> {
    v.iter().map(|&i| PointId(i)).collect()
}

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Every sample point with an unambiguous kNN set lies in some cell, and every
/// cell containing it carries exactly that set.
fn assert_covers_plane(level: &PartitionLevel, sites: &[Site], lo: f64, hi: f64) {
    let steps = 40;
    for i in 0..=steps {
        for j in 0..=steps {
            let p = Vector2::new(
                lo + (hi - lo) * i as f64 / steps as f64,
                lo + (hi - lo) * j as f64 / steps as f64,
            );
            let (expected, gap) = knn(sites, p, level.order());
            if gap < 1e-3 {
                continue;
            }
            let holders: Vec<&VoronoiCell> =
                level.cells().iter().filter(|c| c.contains(p, 1e-9)).collect();
            assert!(!holders.is_empty(), "no cell contains {p:?}");
            for c in holders {
                assert_eq!(c.neighbours(), &expected, "wrong label at {p:?}");
            }
        }
    }
}

#[test]
fn square_corners_first_order() {
    let s = sites(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
    let solver = SimplexSolver::default();
    let level = nth_order_partition(&s, 1, &solver, &PartitionCfg::default()).unwrap();
    assert_eq!(level.len(), 4);
    for (cell, site) in level.cells().iter().zip(&s) {
        assert_eq!(cell.neighbours(), &ids(&[site.id.0]));
        let (p, r) = cell.interior_point(&solver, 1.0).unwrap().unwrap();
        assert!(r > 0.5);
        let own = (p - site.pos).norm();
        for other in s.iter().filter(|o| o.id != site.id) {
            assert!(own < (p - other.pos).norm());
        }
        assert!(cell.contains(site.pos, 0.0));
    }
    assert_covers_plane(&level, &s, -5.0, 15.0);
}

#[test]
fn triangle_second_order_has_three_pairs() {
    let s = sites(&[(0.0, 0.0), (6.0, 0.0), (2.0, 5.0)]);
    let solver = SimplexSolver::default();
    let level = nth_order_partition(&s, 2, &solver, &PartitionCfg::default()).unwrap();
    // Each pair is reached from both of its members.
    assert_eq!(level.len(), 6);
    assert_covers_plane(&level, &s, -20.0, 20.0);

    let dedup = level.dedup_by_neighbours();
    assert_eq!(dedup.len(), 3);
    let sets: BTreeSet<BTreeSet<PointId>> =
        dedup.cells().iter().map(|c| c.neighbours().clone()).collect();
    let expected: BTreeSet<BTreeSet<PointId>> =
        [ids(&[0, 1]), ids(&[0, 2]), ids(&[1, 2])].into_iter().collect();
    assert_eq!(sets, expected);
}

#[test]
fn square_second_order_min_inradius_drops_touching_pairs() {
    let s = sites(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
    let cfg = PartitionCfg {
        min_inradius: Some(1e-6),
        ..PartitionCfg::default()
    };
    let level = nth_order_partition(&s, 2, &SimplexSolver::default(), &cfg).unwrap();
    assert_eq!(level.len(), 8);
    let sets: BTreeSet<BTreeSet<PointId>> =
        level.cells().iter().map(|c| c.neighbours().clone()).collect();
    let expected: BTreeSet<BTreeSet<PointId>> = [
        ids(&[0, 1]),
        ids(&[0, 2]),
        ids(&[1, 3]),
        ids(&[2, 3]),
    ]
    .into_iter()
    .collect();
    assert_eq!(sets, expected);
}

#[test]
fn order_out_of_range_is_rejected() {
    let s = sites(&[(0.0, 0.0), (6.0, 0.0), (2.0, 5.0)]);
    let solver = SimplexSolver::default();
    let cfg = PartitionCfg::default();
    assert_eq!(
        nth_order_partition(&s, 4, &solver, &cfg).unwrap_err(),
        PartitionError::InvalidOrder { order: 4, sites: 3 }
    );
    assert!(matches!(
        nth_order_partition(&s, 0, &solver, &cfg),
        Err(PartitionError::InvalidOrder { .. })
    ));
    // order == N: every branch runs out of sites.
    assert!(nth_order_partition(&s, 3, &solver, &cfg).unwrap().is_empty());
}

#[test]
fn invalid_site_sets_are_rejected() {
    let cfg = PartitionCfg::default();
    let solver = SimplexSolver::default();
    let one = sites(&[(1.0, 1.0)]);
    assert_eq!(
        nth_order_partition(&one, 1, &solver, &cfg).unwrap_err(),
        PartitionError::TooFewSites { found: 1 }
    );
    let mut dup_id = sites(&[(0.0, 0.0), (1.0, 0.0)]);
    dup_id[1].id = dup_id[0].id;
    assert!(matches!(
        first_order_cells(&dup_id, &cfg.geom),
        Err(PartitionError::DuplicateId { .. })
    ));
    let dup_pos = sites(&[(0.0, 0.0), (3.0, 1.0), (0.0, 0.0)]);
    assert_eq!(
        first_order_cells(&dup_pos, &cfg.geom).unwrap_err(),
        PartitionError::DuplicateSite {
            id: PointId(0),
            other: PointId(2)
        }
    );
    let nan = sites(&[(0.0, 0.0), (f64::NAN, 1.0)]);
    assert!(matches!(
        validate_sites(&nan, &cfg.geom),
        Err(PartitionError::NonFiniteSite { .. })
    ));
}

#[test]
fn first_order_is_deterministic_and_hull_cells_are_unbounded() {
    let s = random_sites(12, 5);
    let cfg = PartitionCfg::default();
    let a = first_order_cells(&s, &cfg.geom).unwrap();
    let b = first_order_cells(&s, &cfg.geom).unwrap();
    assert_eq!(a, b);
    // Leftmost site is on the hull, so its region is unbounded.
    let left = s
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.pos.x.total_cmp(&y.1.pos.x))
        .map(|(i, _)| i)
        .unwrap();
    let far = s[left].pos + vector![-1e6, 0.0];
    assert!(a[left].contains(far, 1e-9));
}

#[test]
fn two_sites_split_by_bisector() {
    let s = sites(&[(0.0, 0.0), (4.0, 0.0)]);
    let cells = first_order_cells(&s, &PartitionCfg::default().geom).unwrap();
    assert_eq!(cells.len(), 2);
    assert!(cells[0].contains(vector![1.9, 100.0], 0.0));
    assert!(!cells[0].contains(vector![2.1, 0.0], 0.0));
    assert!(cells[1].contains(vector![2.1, -100.0], 0.0));
}

#[test]
fn levels_grow_one_identifier_per_branch() {
    let s = random_sites(7, 11);
    let solver = SimplexSolver::default();
    let cfg = PartitionCfg::default();
    let l2 = nth_order_partition(&s, 2, &solver, &cfg).unwrap();
    let l3 = nth_order_partition(&s, 3, &solver, &cfg).unwrap();

    // Expanding every order-2 cell by hand reproduces order 3 exactly, in order.
    let mut manual = Vec::new();
    for parent in l2.cells() {
        let children = next_order_cells(parent, &s, &solver, &cfg).unwrap();
        for child in &children {
            let added: Vec<_> = child.neighbours().difference(parent.neighbours()).collect();
            assert_eq!(added.len(), 1);
            assert!(parent.neighbours().is_subset(child.neighbours()));
            assert_eq!(
                &child.halfspaces()[..parent.halfspaces().len()],
                parent.halfspaces()
            );
        }
        manual.extend(children);
    }
    assert_eq!(manual.len(), l3.len());
    for (m, c) in manual.iter().zip(l3.cells()) {
        assert_eq!(m.neighbours(), c.neighbours());
        assert_eq!(m.halfspaces().len(), c.halfspaces().len());
        for (hm, hc) in m.halfspaces().iter().zip(c.halfspaces()) {
            assert_same_line(hm, hc);
        }
    }
}

/// Equal up to a positive factor (the partition derives in its local frame).
fn assert_same_line(x: &Halfspace, y: &Halfspace) {
    let (nx, ny) = (x.a.norm(), y.a.norm());
    assert!((x.a / nx - y.a / ny).norm() < 1e-9, "{x:?} vs {y:?}");
    assert!(
        (x.b / nx - y.b / ny).abs() < 1e-9 * (x.b / nx).abs().max(1.0),
        "{x:?} vs {y:?}"
    );
}

#[test]
fn far_and_wide_coordinates_match_unit_scale() {
    let solver = SimplexSolver::default();
    let cfg = PartitionCfg::default();
    let sets = |l: &PartitionLevel| -> BTreeSet<BTreeSet<PointId>> {
        l.neighbour_sets().into_iter().cloned().collect()
    };
    // Projected-metre offsets, and a plain blow-up around the origin.
    let maps: [(f64, Vector2<f64>); 2] = [
        (1000.0, vector![500_000.0, 5_000_000.0]),
        (1e5, Vector2::zeros()),
    ];
    for seed in 0..20 {
        let s = random_sites(8, seed);
        let near = nth_order_partition(&s, 2, &solver, &cfg).unwrap();
        for &(scale, offset) in &maps {
            let far: Vec<Site> = s
                .iter()
                .map(|x| Site {
                    id: x.id,
                    pos: x.pos * scale + offset,
                })
                .collect();
            let level = nth_order_partition(&far, 2, &solver, &cfg)
                .unwrap_or_else(|e| panic!("seed {seed}, scale {scale}: {e}"));
            assert_eq!(sets(&near), sets(&level), "seed {seed}, scale {scale}");

            let records = level.dedup_by_neighbours().records(&solver, scale).unwrap();
            for rec in records.iter().filter(|r| r.clearance > 1e-6 * scale) {
                let (expected, _) = knn(&far, rec.query_point, 2);
                let got: BTreeSet<PointId> = rec.neighbours.iter().copied().collect();
                assert_eq!(got, expected, "seed {seed}, scale {scale}");
            }
        }
    }
}

#[test]
fn dedup_counts_stay_within_binomial() {
    let s = random_sites(7, 23);
    let solver = SimplexSolver::default();
    for n in 1..=4 {
        let level = nth_order_partition(&s, n, &solver, &PartitionCfg::default()).unwrap();
        assert_eq!(level.neighbour_sets().len(), level.clone().dedup_by_neighbours().len());
        for c in level.cells() {
            assert_eq!(c.order(), n);
            let p = c.feasible_point(&solver).unwrap().point().unwrap();
            for h in c.halfspaces() {
                assert!(h.satisfies_eps(p, 1e-6));
            }
        }
        assert!(level.dedup_by_neighbours().len() <= binomial(s.len(), n));
    }
}

#[test]
fn random_third_order_labels_match_brute_force() {
    let s = random_sites(8, 42);
    let solver = SimplexSolver::default();
    let level = nth_order_partition(&s, 3, &solver, &PartitionCfg::default()).unwrap();
    assert!(!level.is_empty());
    assert_covers_plane(&level, &s, -5.0, 15.0);

    let records = level.dedup_by_neighbours().records(&solver, 1.0).unwrap();
    for rec in records.iter().filter(|r| r.clearance > 1e-6) {
        let (expected, _) = knn(&s, rec.query_point, 3);
        let got: BTreeSet<PointId> = rec.neighbours.iter().copied().collect();
        assert_eq!(got, expected);
    }
}

/// Always fails, to check that failures are not read as empty regions.
struct BrokenSolver;

impl FeasibilitySolver for BrokenSolver {
    fn feasible_point(&self, _hs: &[Halfspace]) -> Result<Feasibility, SolverError> {
        Err(SolverError::Backend {
            message: "numerical breakdown".into(),
        })
    }
    fn interior_point(
        &self,
        _hs: &[Halfspace],
        _max_radius: f64,
    ) -> Result<Option<(Vector2<f64>, f64)>, SolverError> {
        Err(SolverError::Backend {
            message: "numerical breakdown".into(),
        })
    }
}

/// Declares every region empty.
struct EmptySolver;

impl FeasibilitySolver for EmptySolver {
    fn feasible_point(&self, _hs: &[Halfspace]) -> Result<Feasibility, SolverError> {
        Ok(Feasibility::Infeasible)
    }
    fn interior_point(
        &self,
        _hs: &[Halfspace],
        _max_radius: f64,
    ) -> Result<Option<(Vector2<f64>, f64)>, SolverError> {
        Ok(None)
    }
}

#[test]
fn solver_failure_is_not_infeasibility() {
    let s = sites(&[(0.0, 0.0), (6.0, 0.0), (2.0, 5.0)]);
    let cfg = PartitionCfg::default();
    match nth_order_partition(&s, 2, &BrokenSolver, &cfg) {
        Err(PartitionError::Solver(SolverError::Backend { message })) => {
            assert_eq!(message, "numerical breakdown");
        }
        other => panic!("expected solver error, got {other:?}"),
    }
    let empty = nth_order_partition(&s, 2, &EmptySolver, &cfg).unwrap();
    assert!(empty.is_empty());
    // Order 1 never calls the solver.
    assert_eq!(nth_order_partition(&s, 1, &BrokenSolver, &cfg).unwrap().len(), 3);
}

#[test]
fn records_of_empty_cell_are_an_invariant_violation() {
    let level = PartitionLevel::new(
        1,
        vec![VoronoiCell::new(
            vec![
                Halfspace::new(vector![1.0, 0.0], 1.0),
                Halfspace::new(vector![-1.0, 0.0], 0.0),
            ],
            [PointId(9)],
        )],
    );
    assert!(matches!(
        level.records(&SimplexSolver::default(), 1.0),
        Err(PartitionError::Invariant { .. })
    ));
}

#[test]
fn combine_concatenates_and_unites() {
    let a = VoronoiCell::new(vec![Halfspace::new(vector![1.0, 0.0], 0.0)], [PointId(1)]);
    let b = VoronoiCell::new(
        vec![Halfspace::new(vector![0.0, 1.0], 0.0)],
        [PointId(2), PointId(1), PointId(2)],
    );
    assert_eq!(b.order(), 2);
    let c = VoronoiCell::combine(&a, &b);
    assert_eq!(c.halfspaces().len(), 2);
    assert_eq!(c.halfspaces()[0], a.halfspaces()[0]);
    assert_eq!(c.neighbours(), &ids(&[1, 2]));
}
