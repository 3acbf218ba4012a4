mod problem;
mod simplex;
mod solution;

pub use problem::{LpModel, ModelError};
pub use simplex::{LpSolver, Simplex};
pub use solution::{Solution, SolutionStatus};
