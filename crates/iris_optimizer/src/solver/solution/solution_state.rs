use fxhash::FxHashMap;

use crate::{
    problem::{
        eval::Eval, job::JobIdx, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{working_route::WorkingRoute, working_solution::WorkingSolution},
};

/// Per-route aggregates read by the search operators.
///
/// Every vector is indexed by the owning route first. `update` must run for
/// each route touched by a move before the next evaluation. Incremental
/// updates leave the state equal to a fresh `setup` of the same solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionState {
    route_evals: Vec<Eval>,
    // [route][vehicle][rank]: path j_0 -> .. -> j_rank priced with `vehicle`.
    fwd_evals: Vec<Vec<Vec<Eval>>>,
    // [route][vehicle][rank]: path j_rank -> .. -> j_0 priced with `vehicle`.
    bwd_evals: Vec<Vec<Vec<Eval>>>,
    // [route][vehicle][rank]: jobs in ranks [0, rank) `vehicle` cannot serve.
    incompatible_counts: Vec<Vec<Vec<u32>>>,
    node_gains: Vec<Vec<Eval>>,
    edge_gains: Vec<Vec<Eval>>,
    pd_gains: Vec<Vec<Eval>>,
    matching_ranks: Vec<Vec<usize>>,
    // [route][job]
    insertion_ranks_begin: Vec<Vec<usize>>,
    insertion_ranks_end: Vec<Vec<usize>>,
    job_routes: Vec<Option<VehicleIdx>>,
    job_ranks: Vec<usize>,
}

impl SolutionState {
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        let number_of_vehicles = problem.number_of_vehicles();
        let number_of_jobs = problem.number_of_jobs();

        SolutionState {
            route_evals: vec![Eval::ZERO; number_of_vehicles],
            fwd_evals: vec![vec![Vec::new(); number_of_vehicles]; number_of_vehicles],
            bwd_evals: vec![vec![Vec::new(); number_of_vehicles]; number_of_vehicles],
            incompatible_counts: vec![vec![vec![0]; number_of_vehicles]; number_of_vehicles],
            node_gains: vec![Vec::new(); number_of_vehicles],
            edge_gains: vec![Vec::new(); number_of_vehicles],
            pd_gains: vec![Vec::new(); number_of_vehicles],
            matching_ranks: vec![Vec::new(); number_of_vehicles],
            insertion_ranks_begin: vec![vec![0; number_of_jobs]; number_of_vehicles],
            insertion_ranks_end: vec![vec![1; number_of_jobs]; number_of_vehicles],
            job_routes: vec![None; number_of_jobs],
            job_ranks: vec![0; number_of_jobs],
        }
    }

    pub fn setup<R: WorkingRoute>(
        &mut self,
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution<R>,
    ) {
        self.job_routes.fill(None);
        self.job_ranks.fill(0);
        for route in solution.routes() {
            self.update(problem, route);
        }
    }

    pub fn update<R: WorkingRoute>(&mut self, problem: &VehicleRoutingProblem, route: &R) {
        let v = route.vehicle_id();

        for (job_route, job_rank) in self.job_routes.iter_mut().zip(&mut self.job_ranks) {
            if *job_route == Some(v) {
                *job_route = None;
                *job_rank = 0;
            }
        }
        for (rank, &job) in route.jobs().iter().enumerate() {
            self.job_routes[job.get()] = Some(v);
            self.job_ranks[job.get()] = rank;
        }

        self.route_evals[v.get()] = route.eval(problem);
        self.update_path_evals(problem, route);
        self.update_incompatible_counts(problem, route);
        self.update_matching_ranks(problem, route);
        self.update_gains(problem, route);
        self.update_insertion_ranks(problem, route);
    }

    fn update_path_evals<R: WorkingRoute>(&mut self, problem: &VehicleRoutingProblem, route: &R) {
        let v = route.vehicle_id().get();
        let jobs = route.jobs();

        for (other, vehicle) in problem.vehicles().iter().enumerate() {
            let fwd = &mut self.fwd_evals[v][other];
            let bwd = &mut self.bwd_evals[v][other];
            fwd.clear();
            bwd.clear();
            if jobs.is_empty() {
                continue;
            }

            fwd.push(Eval::ZERO);
            bwd.push(Eval::ZERO);
            for window in jobs.windows(2) {
                let from = problem.job_location(window[0]);
                let to = problem.job_location(window[1]);
                let last_fwd = fwd[fwd.len() - 1];
                let last_bwd = bwd[bwd.len() - 1];
                fwd.push(last_fwd + vehicle.eval(from, to));
                bwd.push(last_bwd + vehicle.eval(to, from));
            }
        }
    }

    fn update_incompatible_counts<R: WorkingRoute>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &R,
    ) {
        let v = route.vehicle_id().get();

        for other in VehicleIdx::all(problem.number_of_vehicles()) {
            let counts = &mut self.incompatible_counts[v][other.get()];
            counts.clear();
            counts.push(0);
            let mut count = 0;
            for &job in route.jobs() {
                if !problem.vehicle_ok_with_job(other, job) {
                    count += 1;
                }
                counts.push(count);
            }
        }
    }

    fn update_gains<R: WorkingRoute>(&mut self, problem: &VehicleRoutingProblem, route: &R) {
        let v = route.vehicle_id();
        let vehicle = problem.vehicle(v);
        let raw = route.raw();
        let len = route.len();

        let eval = |from, to| vehicle.eval_between(from, to);
        let location = |rank: usize| Some(problem.job_location(route.jobs()[rank]));
        let fixed = |removed: usize| {
            if removed == len {
                Eval::new(vehicle.fixed_cost(), 0)
            } else {
                Eval::ZERO
            }
        };

        let node_gains = &mut self.node_gains[v.get()];
        node_gains.clear();
        for rank in 0..len {
            let previous = raw.location_before(problem, rank);
            let next = raw.location_at(problem, rank + 1);
            node_gains.push(
                eval(previous, location(rank)) + eval(location(rank), next)
                    - eval(previous, next)
                    + fixed(1),
            );
        }

        let edge_gains = &mut self.edge_gains[v.get()];
        edge_gains.clear();
        for rank in 0..len.saturating_sub(1) {
            let previous = raw.location_before(problem, rank);
            let next = raw.location_at(problem, rank + 2);
            edge_gains.push(
                eval(previous, location(rank))
                    + eval(location(rank), location(rank + 1))
                    + eval(location(rank + 1), next)
                    - eval(previous, next)
                    + fixed(2),
            );
        }

        let pd_gains = &mut self.pd_gains[v.get()];
        pd_gains.clear();
        pd_gains.resize(len, Eval::ZERO);
        for (pickup_rank, &job) in route.jobs().iter().enumerate() {
            if !problem.job(job).is_pickup() {
                continue;
            }
            let delivery_rank = self.matching_ranks[v.get()][pickup_rank];
            debug_assert!(delivery_rank > pickup_rank);

            let previous = raw.location_before(problem, pickup_rank);
            let next = raw.location_at(problem, delivery_rank + 1);
            let gain = if delivery_rank == pickup_rank + 1 {
                eval(previous, location(pickup_rank))
                    + eval(location(pickup_rank), location(delivery_rank))
                    + eval(location(delivery_rank), next)
                    - eval(previous, next)
            } else {
                let after_pickup = location(pickup_rank + 1);
                let before_delivery = location(delivery_rank - 1);
                eval(previous, location(pickup_rank)) + eval(location(pickup_rank), after_pickup)
                    - eval(previous, after_pickup)
                    + eval(before_delivery, location(delivery_rank))
                    + eval(location(delivery_rank), next)
                    - eval(before_delivery, next)
            };
            pd_gains[pickup_rank] = gain + fixed(2);
        }
    }

    fn update_matching_ranks<R: WorkingRoute>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &R,
    ) {
        let matching = &mut self.matching_ranks[route.vehicle_id().get()];
        matching.clear();
        matching.extend(0..route.len());

        let mut open_pickups: FxHashMap<JobIdx, usize> = FxHashMap::default();
        for (rank, &job) in route.jobs().iter().enumerate() {
            let current = problem.job(job);
            if current.is_pickup() {
                open_pickups.insert(job, rank);
            } else if current.is_delivery()
                && let Some(pickup_rank) = open_pickups.remove(&problem.pickup_of(job))
            {
                matching[rank] = pickup_rank;
                matching[pickup_rank] = rank;
            }
        }
    }

    fn update_insertion_ranks<R: WorkingRoute>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &R,
    ) {
        let v = route.vehicle_id().get();
        for job in JobIdx::all(problem.number_of_jobs()) {
            let (begin, end) = route.insertion_ranks(problem, job);
            self.insertion_ranks_begin[v][job.get()] = begin;
            self.insertion_ranks_end[v][job.get()] = end;
        }
    }

    pub fn route_eval(&self, vehicle_id: VehicleIdx) -> Eval {
        self.route_evals[vehicle_id.get()]
    }

    /// Eval of the path through ranks `[first, last)` of `route`, priced with
    /// `vehicle_id` and walked backwards when `reversed`. Only the edges
    /// between the jobs are counted.
    pub fn path_eval(
        &self,
        route: VehicleIdx,
        vehicle_id: VehicleIdx,
        first: usize,
        last: usize,
        reversed: bool,
    ) -> Eval {
        debug_assert!(first < last);
        let evals = if reversed {
            &self.bwd_evals[route.get()][vehicle_id.get()]
        } else {
            &self.fwd_evals[route.get()][vehicle_id.get()]
        };

        evals[last - 1] - evals[first]
    }

    /// `vehicle_id` can serve every job in ranks `[first, last)` of `route`.
    pub fn is_compatible_range(
        &self,
        route: VehicleIdx,
        vehicle_id: VehicleIdx,
        first: usize,
        last: usize,
    ) -> bool {
        let counts = &self.incompatible_counts[route.get()][vehicle_id.get()];
        counts[last] == counts[first]
    }

    /// Eval saved by removing the job at `rank`.
    pub fn node_gain(&self, route: VehicleIdx, rank: usize) -> Eval {
        self.node_gains[route.get()][rank]
    }

    /// Eval saved by removing the jobs at `rank` and `rank + 1`.
    pub fn edge_gain(&self, route: VehicleIdx, rank: usize) -> Eval {
        self.edge_gains[route.get()][rank]
    }

    /// Eval saved by removing the pickup at `rank` with its delivery.
    pub fn pd_gain(&self, route: VehicleIdx, rank: usize) -> Eval {
        self.pd_gains[route.get()][rank]
    }

    /// Rank of the other leg for shipment jobs, `rank` itself otherwise.
    pub fn matching_rank(&self, route: VehicleIdx, rank: usize) -> usize {
        self.matching_ranks[route.get()][rank]
    }

    pub fn insertion_ranks(&self, route: VehicleIdx, job: JobIdx) -> (usize, usize) {
        (
            self.insertion_ranks_begin[route.get()][job.get()],
            self.insertion_ranks_end[route.get()][job.get()],
        )
    }

    pub fn job_route(&self, job: JobIdx) -> Option<VehicleIdx> {
        self.job_routes[job.get()]
    }

    pub fn job_rank(&self, job: JobIdx) -> usize {
        self.job_ranks[job.get()]
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{job::JobIdx, vehicle::VehicleIdx},
        solver::solution::{raw_route::RawRoute, working_solution::WorkingSolution},
        test_utils::{self, TestJob},
    };

    use super::*;

    fn setup() -> (VehicleRoutingProblem, WorkingSolution<RawRoute>, SolutionState) {
        let problem = test_utils::create_problem_with_jobs(
            vec![
                TestJob::delivery(1, 1),
                TestJob::delivery(2, 1),
                TestJob::shipment(3, 4, 1),
                TestJob::delivery(5, 1),
            ],
            vec![10],
            2,
        );

        let mut solution = WorkingSolution::<RawRoute>::new(&problem);
        let vehicle = VehicleIdx::new(0);
        for (rank, job) in [0, 2, 1, 3].into_iter().enumerate() {
            solution.insert_job(&problem, vehicle, JobIdx::new(job), rank);
        }

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);
        (problem, solution, state)
    }

    #[test]
    fn test_path_evals() {
        let (_problem, _solution, state) = setup();
        let route = VehicleIdx::new(0);

        // Locations x = 1, 3, 2, 4.
        assert_eq!(state.path_eval(route, route, 0, 4, false).duration, 500);
        assert_eq!(state.path_eval(route, route, 1, 3, true).duration, 100);
        assert_eq!(state.path_eval(route, route, 0, 1, false), Eval::ZERO);
    }

    #[test]
    fn test_route_eval_matches_route() {
        let (problem, solution, state) = setup();
        let route = VehicleIdx::new(0);

        assert_eq!(state.route_eval(route), solution.route(route).eval(&problem));
        assert_eq!(state.route_eval(route).duration, 1000);
        assert_eq!(state.route_eval(VehicleIdx::new(1)), Eval::ZERO);
    }

    #[test]
    fn test_gains_and_matching() {
        let (_problem, _solution, state) = setup();
        let route = VehicleIdx::new(0);

        // Removing x = 3 between x = 1 and x = 2.
        assert_eq!(state.node_gain(route, 1).duration, 200);
        assert_eq!(state.matching_rank(route, 1), 2);
        assert_eq!(state.matching_rank(route, 2), 1);
        assert_eq!(state.matching_rank(route, 0), 0);
        // Pickup at x = 3 after x = 1, delivery at x = 4 before the depot.
        assert_eq!(state.pd_gain(route, 1).duration, 600);
        assert_eq!(state.job_route(JobIdx::new(3)), Some(route));
        assert_eq!(state.job_rank(JobIdx::new(3)), 3);
    }
}
