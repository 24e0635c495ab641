use thiserror::Error;

use crate::geom2::{GeometryError, PointId, SolverError};

/// Failures of partition construction. An empty candidate region is not an
/// error; it is dropped silently by the combiner.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PartitionError {
    #[error("need at least 2 distinct sites, found {found}")]
    TooFewSites { found: usize },
    #[error("identifier {id} is used by more than one site")]
    DuplicateId { id: PointId },
    #[error("site {id} has a non-finite coordinate")]
    NonFiniteSite { id: PointId },
    #[error("sites {id} and {other} share a coordinate")]
    DuplicateSite { id: PointId, other: PointId },
    #[error("order {order} is not in 1..={sites}")]
    InvalidOrder { order: usize, sites: usize },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("partition invariant violated: {message}")]
    Invariant { message: String },
}

impl PartitionError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
