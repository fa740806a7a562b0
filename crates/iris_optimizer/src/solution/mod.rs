pub mod route;
#[allow(clippy::module_inception)]
pub mod solution;
pub mod step;
pub mod summary;
pub mod violation;

pub use solution::Solution;
