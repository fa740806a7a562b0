pub mod construct_solution;
pub mod heuristic_params;
