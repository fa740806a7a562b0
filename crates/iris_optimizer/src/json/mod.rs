pub mod problem_input;
pub mod types;
