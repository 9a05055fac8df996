use thiserror::Error;

use crate::constraints::ConstraintId;
use crate::dynamics::BodyId;

/// Errors surfaced when building shapes, bodies and constraints.
///
/// Stepping the world never fails; these only come back from construction
/// and lookup calls.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("convex vertices must be counter-clockwise (signed area {area})")]
    ClockwiseWinding { area: f32 },

    #[error("convex shape needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("body {0:?} is not part of the world")]
    UnknownBody(BodyId),

    #[error("constraint {0:?} is not part of the world")]
    UnknownConstraint(ConstraintId),

    #[error("constraint connects body {0:?} to itself")]
    SelfConstraint(BodyId),
}

pub type Result<T> = core::result::Result<T, PhysicsError>;
