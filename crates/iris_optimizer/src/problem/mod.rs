pub mod amount;
pub mod cost_wrapper;
pub mod eval;
pub mod job;
pub mod location;
pub mod matrix;
pub mod skill;
pub mod time_window;
pub mod units;
pub mod vehicle;
pub mod vehicle_routing_problem;
