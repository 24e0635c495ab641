//! Order-n partition by repeated combination with reduced-set Voronoi cells.
//!
//! From an order-k cell with neighbour set S, the order-(k+1) cells inside it
//! are its intersections with the first-order cells of the sites not in S: a
//! point whose k nearest sites are S and whose nearest remaining site is q has
//! S ∪ {q} as its k+1 nearest. Empty intersections are pruned by the LP.
//!
//! The expansion is a FIFO worklist of `(order, CellId)` over an arena rather
//! than recursion. FIFO keeps levels contiguous, so the output order matches a
//! level-by-level loop; expanded cells are released from the arena at once.

use std::collections::VecDeque;

use tracing::{debug, info, trace};

use super::build::{first_order_cells_unchecked, validate_sites};
use super::cell::VoronoiCell;
use super::error::PartitionError;
use super::level::PartitionLevel;
use crate::geom2::{Feasibility, FeasibilitySolver, Frame, GeomCfg, Site};

/// Partition configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionCfg {
    pub geom: GeomCfg,
    /// Drop candidates whose inscribed disc radius is not above this value
    /// (regions touching only along a boundary). `None` keeps every feasible candidate.
    pub min_inradius: Option<f64>,
}

/// Index of a cell in the combiner's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CellId(usize);

/// Slots are emptied on `take`; ids are never reused.
#[derive(Debug, Default)]
struct CellArena {
    slots: Vec<Option<VoronoiCell>>,
    live: usize,
}

impl CellArena {
    fn insert(&mut self, cell: VoronoiCell) -> CellId {
        self.slots.push(Some(cell));
        self.live += 1;
        CellId(self.slots.len() - 1)
    }

    fn take(&mut self, id: CellId) -> Option<VoronoiCell> {
        let cell = self.slots.get_mut(id.0)?.take();
        if cell.is_some() {
            self.live -= 1;
        }
        cell
    }
}

/// All order-`order` cells of `sites`.
///
/// Cells from different branches may share a neighbour set; use
/// [`PartitionLevel::dedup_by_neighbours`] for one cell per set.
///
/// All LPs run in the sites' [`Frame`] (centroid origin, unit spread), so
/// tolerances are relative to the data; the returned cells are in the caller's
/// coordinates and the level keeps the frame for [`PartitionLevel::records`].
///
/// # Errors
/// Input preconditions (`validate_sites`, `1 <= order <= sites.len()`), degenerate
/// geometry, solver failures and invariant violations all abort the whole call.
pub fn nth_order_partition<S: FeasibilitySolver + ?Sized>(
    sites: &[Site],
    order: usize,
    solver: &S,
    cfg: &PartitionCfg,
) -> Result<PartitionLevel, PartitionError> {
    validate_sites(sites, &cfg.geom)?;
    if order == 0 || order > sites.len() {
        return Err(PartitionError::InvalidOrder {
            order,
            sites: sites.len(),
        });
    }

    let frame = Frame::fit(sites);
    let local: Vec<Site> = sites.iter().map(|s| frame.site_to_local(s)).collect();
    let local_cfg = PartitionCfg {
        min_inradius: cfg.min_inradius.map(|r| r / frame.scale),
        ..*cfg
    };
    let (sites, cfg) = (local.as_slice(), &local_cfg);
    debug!(origin = ?frame.origin, scale = frame.scale, "local frame");

    let mut arena = CellArena::default();
    let mut queue: VecDeque<(usize, CellId)> = VecDeque::new();
    for cell in first_order_cells_unchecked(sites, &cfg.geom)? {
        queue.push_back((1, arena.insert(cell)));
    }
    debug!(order = 1, cells = queue.len(), "first-order cells");

    let mut out = Vec::new();
    let mut current = 1;
    let mut level_size = 0usize;
    while let Some((k, id)) = queue.pop_front() {
        let cell = arena
            .take(id)
            .ok_or_else(|| PartitionError::invariant(format!("cell {id:?} taken twice")))?;
        if k == order {
            out.push(cell);
            continue;
        }
        if k != current {
            debug!(order = k, cells = level_size, "level complete");
            current = k;
            level_size = 0;
        }
        let children = next_order_cells(&cell, sites, solver, cfg)?;
        level_size += children.len();
        for child in children {
            queue.push_back((k + 1, arena.insert(child)));
        }
        trace!(live = arena.live, pending = queue.len(), "expanded cell");
    }

    info!(
        sites = sites.len(),
        order,
        cells = out.len(),
        "order-n partition complete"
    );
    let cells = out
        .iter()
        .map(|c| c.map_halfspaces(|h| frame.halfspace_to_global(h)))
        .collect();
    Ok(PartitionLevel::with_frame(order, cells, frame))
}

/// Feasible order-(k+1) cells inside one order-k `cell`.
///
/// Fewer than two remaining sites yields no cells.
pub fn next_order_cells<S: FeasibilitySolver + ?Sized>(
    cell: &VoronoiCell,
    sites: &[Site],
    solver: &S,
    cfg: &PartitionCfg,
) -> Result<Vec<VoronoiCell>, PartitionError> {
    let reduced: Vec<Site> = sites
        .iter()
        .filter(|s| !cell.neighbours().contains(&s.id))
        .copied()
        .collect();
    if reduced.len() + cell.order() != sites.len() {
        return Err(PartitionError::invariant(format!(
            "removing {} neighbours from {} sites left {}",
            cell.order(),
            sites.len(),
            reduced.len()
        )));
    }
    if reduced.len() < 2 {
        debug!(
            remaining = reduced.len(),
            "branch skipped: too few remaining sites"
        );
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for single in first_order_cells_unchecked(&reduced, &cfg.geom)? {
        if single.neighbours().iter().any(|id| cell.neighbours().contains(id)) {
            return Err(PartitionError::invariant(format!(
                "reduced-set cell {:?} repeats a neighbour of {:?}",
                single.neighbours(),
                cell.neighbours()
            )));
        }
        let candidate = VoronoiCell::combine(cell, &single);
        if candidate.order() != cell.order() + 1 {
            return Err(PartitionError::invariant(format!(
                "combined cell has order {}, expected {}",
                candidate.order(),
                cell.order() + 1
            )));
        }
        match candidate.feasible_point(solver)? {
            Feasibility::Infeasible => {
                trace!(neighbours = ?candidate.neighbours(), "candidate empty");
            }
            Feasibility::Feasible(_) => {
                if let Some(r_min) = cfg.min_inradius {
                    let radius = candidate
                        .interior_point(solver, r_min + 1.0)?
                        .map_or(0.0, |(_, r)| r);
                    if radius <= r_min {
                        trace!(neighbours = ?candidate.neighbours(), radius, "candidate too thin");
                        continue;
                    }
                }
                out.push(candidate);
            }
        }
    }
    Ok(out)
}
