pub mod error;
pub mod json;
pub mod problem;
pub mod routing;
pub mod solution;
pub mod solver;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use solution::Solution;
pub use solver::{
    solver::solve,
    solver_params::{SolverParams, Threads},
};
