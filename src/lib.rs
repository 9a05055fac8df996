//! 2D rigid-body physics: shapes, contact generation, constraint
//! equations, an iterative Gauss-Seidel solver and island splitting.

pub mod collision;
pub mod constraints;
pub mod dynamics;
pub mod equations;
pub mod error;
pub mod events;
pub mod math;
pub mod shapes;
pub mod solver;
pub mod utils;

pub use error::{PhysicsError, Result};
