//! 2D geometry for Voronoi cells as half-space systems.
//!
//! Purpose
//! - Turn Voronoi boundary pieces (finite ridges, infinite rays) into closed
//!   half-spaces `a·x >= b`, and decide emptiness of half-space systems.
//! - Keep numerics explicit: tolerances live in `GeomCfg`, and every solver
//!   point is verified before it is returned.
//!
//! - `Frame` moves systems into site-centred, spread-scaled coordinates
//!   so the LP never sees raw large-magnitude offsets.
//!
//! Code cross-refs: `halfspace::{from_segment, from_ray}`, `voronoi::voronoi_boundaries`,
//! `solvers::{FeasibilitySolver, SimplexSolver}`, `partition::VoronoiCell`.

mod frame;
pub mod halfspace;
mod solvers;
mod types;
pub mod voronoi;

pub use frame::Frame;
pub use halfspace::{from_ray, from_segment, GeometryError};
pub use solvers::{verify_point, Feasibility, FeasibilitySolver, SimplexSolver, SolverError};
pub use types::{Bounds2, GeomCfg, Halfspace, PointId, Site};
pub use voronoi::{voronoi_boundaries, Ray, SiteBoundary};
