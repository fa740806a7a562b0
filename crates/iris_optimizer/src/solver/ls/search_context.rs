use crate::{
    problem::{vehicle::VehicleIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::{
        neighbours::Neighbours,
        solution::{
            solution_state::SolutionState, working_route::WorkingRoute,
            working_solution::WorkingSolution,
        },
    },
};

/// Read-only view handed to operators while moves are generated and checked.
pub struct SearchContext<'a, R: WorkingRoute> {
    pub problem: &'a VehicleRoutingProblem,
    pub neighbours: &'a Neighbours,
    pub solution: &'a WorkingSolution<R>,
    pub state: &'a SolutionState,
}

impl<R: WorkingRoute> Clone for SearchContext<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: WorkingRoute> Copy for SearchContext<'_, R> {}

impl<'a, R: WorkingRoute> SearchContext<'a, R> {
    pub fn route(&self, vehicle_id: VehicleIdx) -> &'a R {
        self.solution.route(vehicle_id)
    }
}
