use std::fmt::Debug;

use crate::problem::{
    eval::Eval, job::JobIdx, vehicle::VehicleIdx, vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{raw_route::RawRoute, schedule::RouteSchedule, tw_route::TwRoute};

/// Route representation the search works on.
///
/// `RawRoute` only tracks order and loads, `TwRoute` adds time-window
/// bookkeeping. Operators stay generic and consult `HAS_TIME_WINDOWS`
/// statically.
pub trait WorkingRoute: Clone + Debug + Send + Sync + 'static {
    const HAS_TIME_WINDOWS: bool;

    fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self;

    fn raw(&self) -> &RawRoute;

    /// Time-window check for replacing ranks `[first, last)` with `jobs`.
    fn is_valid_addition_for_tw(
        &self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) -> bool;

    /// Replaces ranks `[first, last)` with `jobs` and refreshes the route data.
    fn replace(&mut self, problem: &VehicleRoutingProblem, jobs: &[JobIdx], first: usize, last: usize);

    /// Insertion ranks `[begin, end)` worth trying for `job`.
    fn insertion_ranks(&self, problem: &VehicleRoutingProblem, job: JobIdx) -> (usize, usize);

    fn schedule(&self, problem: &VehicleRoutingProblem) -> RouteSchedule;

    /// Cached route data agrees with a replay from scratch.
    fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool;

    fn vehicle_id(&self) -> VehicleIdx {
        self.raw().vehicle_id()
    }

    fn jobs(&self) -> &[JobIdx] {
        self.raw().jobs()
    }

    fn len(&self) -> usize {
        self.raw().len()
    }

    fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    fn add(&mut self, problem: &VehicleRoutingProblem, job: JobIdx, rank: usize) {
        self.replace(problem, &[job], rank, rank);
    }

    fn remove(&mut self, problem: &VehicleRoutingProblem, rank: usize, count: usize) {
        self.replace(problem, &[], rank, rank + count);
    }

    /// Travel eval of the whole route computed from scratch, fixed cost
    /// included when the route is used.
    fn eval(&self, problem: &VehicleRoutingProblem) -> Eval {
        if self.is_empty() {
            return Eval::ZERO;
        }

        let vehicle = problem.vehicle(self.vehicle_id());
        let mut eval = Eval::new(vehicle.fixed_cost(), 0);
        let mut previous = vehicle.start();
        for &job in self.jobs() {
            let location = Some(problem.job_location(job));
            eval += vehicle.eval_between(previous, location);
            previous = location;
        }

        eval + vehicle.eval_between(previous, vehicle.end())
    }
}

impl WorkingRoute for RawRoute {
    const HAS_TIME_WINDOWS: bool = false;

    fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        RawRoute::new(problem, vehicle_id)
    }

    fn raw(&self) -> &RawRoute {
        self
    }

    fn is_valid_addition_for_tw(
        &self,
        _problem: &VehicleRoutingProblem,
        _jobs: &[JobIdx],
        _first: usize,
        _last: usize,
    ) -> bool {
        true
    }

    fn replace(&mut self, problem: &VehicleRoutingProblem, jobs: &[JobIdx], first: usize, last: usize) {
        RawRoute::replace(self, problem, jobs, first, last);
    }

    fn insertion_ranks(&self, _problem: &VehicleRoutingProblem, _job: JobIdx) -> (usize, usize) {
        (0, self.len() + 1)
    }

    fn schedule(&self, problem: &VehicleRoutingProblem) -> RouteSchedule {
        RawRoute::schedule(self, problem)
    }

    fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool {
        RawRoute::is_consistent(self, problem)
    }
}

impl WorkingRoute for TwRoute {
    const HAS_TIME_WINDOWS: bool = true;

    fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        TwRoute::new(problem, vehicle_id)
    }

    fn raw(&self) -> &RawRoute {
        TwRoute::raw(self)
    }

    fn is_valid_addition_for_tw(
        &self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) -> bool {
        TwRoute::is_valid_addition_for_tw(self, problem, jobs, first, last)
    }

    fn replace(&mut self, problem: &VehicleRoutingProblem, jobs: &[JobIdx], first: usize, last: usize) {
        TwRoute::replace(self, problem, jobs, first, last);
    }

    fn insertion_ranks(&self, problem: &VehicleRoutingProblem, job: JobIdx) -> (usize, usize) {
        TwRoute::insertion_ranks(self, problem, job)
    }

    fn schedule(&self, problem: &VehicleRoutingProblem) -> RouteSchedule {
        TwRoute::schedule(self, problem)
    }

    fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool {
        TwRoute::is_consistent(self, problem)
    }
}
