//! Query-point placement for kNN retrieval.
//!
//! Given N labelled sites in the plane and a neighbourhood size k, find query
//! coordinates whose k-nearest-neighbour results jointly return every site.
//! The exact route builds the order-k Voronoi partition (`partition`) and
//! picks a smallest covering subset of its cells (`plan`); `grid_search` and
//! `heuristics` are baselines, `simulation` generates data with a known answer.
//!
//! API Policy
//! - Project-internal; breaking changes are fine when they improve the design.

pub mod cover;
pub mod geom2;
pub mod grid_search;
pub mod heuristics;
pub mod ids;
pub mod knn;
pub mod partition;
pub mod plan;
pub mod sample;
pub mod simulation;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom2::{Bounds2, GeomCfg, PointId, Site};
pub use nalgebra::Vector2 as Vec2;

/// Common exports for drivers.
pub mod prelude {
    pub use crate::cover::{binomial, smallest_cover, CoverError, CoverSearch};
    pub use crate::geom2::{
        Bounds2, Feasibility, FeasibilitySolver, GeomCfg, Halfspace, PointId, SimplexSolver, Site,
    };
    pub use crate::grid_search::{grid_search, GridSearchCfg, GridSearchError, GridSearchOutcome};
    pub use crate::heuristics::{trim_extremities, uniform_random, HeuristicError};
    pub use crate::ids::{assign_ids, IdSource, RandomIds, SequentialIds};
    pub use crate::knn::{HilbertIndex, NeighbourIndex};
    pub use crate::partition::{
        nth_order_partition, NeighbourRecord, PartitionCfg, PartitionError, PartitionLevel,
        VoronoiCell,
    };
    pub use crate::plan::{plan_from_partition, PlanCfg, PlanError, QueryPlan};
    pub use crate::sample::uniform_points;
    pub use crate::simulation::{simulate, Simulation, SimulationCfg, SimulationError};
    pub use nalgebra::Vector2 as Vec2;
}
