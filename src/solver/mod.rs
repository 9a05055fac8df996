pub mod gs_solver;
pub mod island_manager;

pub use gs_solver::GsSolver;
pub use island_manager::{Island, IslandManager, IslandNode};
