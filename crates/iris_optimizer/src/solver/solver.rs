use rayon::prelude::*;
use tracing::{Level, debug, info, instrument};

use crate::{
    error::SolverError,
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solution::Solution,
    solver::{
        construction::{construct_solution::construct_solution, heuristic_params::HeuristicParameters},
        deadline::Deadline,
        ls::local_search::LocalSearch,
        neighbours::Neighbours,
        solution::{
            indicators::SolutionIndicators, raw_route::RawRoute, tw_route::TwRoute,
            working_route::WorkingRoute, working_solution::WorkingSolution,
        },
    },
    timer_debug,
};

use super::solver_params::SolverParams;

/// Outcome of one heuristic row.
struct Candidate<R: WorkingRoute> {
    row: usize,
    indicators: SolutionIndicators,
    solution: WorkingSolution<R>,
}

/// Runs every selected heuristic row, construction then local search, and
/// keeps the best result.
pub struct Solver<'a> {
    problem: &'a VehicleRoutingProblem,
    params: SolverParams,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a VehicleRoutingProblem, params: SolverParams) -> Self {
        Solver { problem, params }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn solve(&self) -> Result<Solution, SolverError> {
        if self.problem.has_time_windows() {
            self.run::<TwRoute>()
        } else {
            self.run::<RawRoute>()
        }
    }

    fn create_thread_pool(&self, threads: usize) -> Result<rayon::ThreadPool, SolverError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("iris-worker-{index}"))
            .build()
            .map_err(|error| SolverError::Internal(error.to_string()))
    }

    fn run<R: WorkingRoute>(&self) -> Result<Solution, SolverError> {
        let problem = self.problem;
        let deadline = Deadline::from_timeout(self.params.timeout);

        if problem.number_of_jobs() == 0 || problem.number_of_vehicles() == 0 {
            return Ok(Solution::from_working(problem, &WorkingSolution::<R>::new(problem)));
        }

        let rows = self.params.heuristic_rows(problem.is_homogeneous());
        if rows.is_empty() {
            return Err(SolverError::Internal("no heuristic parameters to run".into()));
        }

        let threads = self.params.threads.number_of_threads().min(rows.len());
        let depth = self.params.exploration_level();
        info!(
            rows = rows.len(),
            threads,
            depth,
            time_windows = R::HAS_TIME_WINDOWS,
            "solving"
        );

        let neighbours = timer_debug!("neighbours", Neighbours::new(problem));

        // Row i runs on worker i % threads.
        let workers: Vec<Vec<usize>> = (0..threads)
            .map(|worker| (worker..rows.len()).step_by(threads).collect())
            .collect();

        let pool = self.create_thread_pool(threads)?;
        let candidates: Vec<Vec<Candidate<R>>> = timer_debug!(
            "search",
            pool.install(|| {
                workers
                    .par_iter()
                    .map(|worker_rows| {
                        worker_rows
                            .iter()
                            .map(|&row| run_row(problem, &neighbours, row, &rows[row], depth, deadline))
                            .collect()
                    })
                    .collect()
            })
        );

        let best = candidates
            .into_iter()
            .flatten()
            .min_by(|a, b| a.indicators.cmp(&b.indicators).then(a.row.cmp(&b.row)))
            .ok_or_else(|| SolverError::Internal("no candidate solution".into()))?;

        info!(
            row = best.row,
            cost = best.indicators.cost,
            assigned = best.indicators.assigned,
            unassigned = best.solution.unassigned().len(),
            used_vehicles = best.indicators.used_vehicles,
            "best solution"
        );

        Ok(Solution::from_working(problem, &best.solution))
    }
}

fn run_row<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    neighbours: &Neighbours,
    row: usize,
    params: &HeuristicParameters,
    depth: usize,
    deadline: Deadline,
) -> Candidate<R> {
    let initial = construct_solution::<R>(problem, params);

    let mut local_search = LocalSearch::new(problem, neighbours, initial, depth, deadline);
    local_search.run();

    let indicators = local_search.indicators();
    debug!(
        row,
        cost = indicators.cost,
        assigned = indicators.assigned,
        moves = local_search.applied_moves(),
        "row finished"
    );

    Candidate {
        row,
        indicators,
        solution: local_search.into_solution(),
    }
}

/// Solves `problem` with `params`. Jobs that fit nowhere end up unassigned
/// in the returned solution, errors are reserved for failures of the solve
/// itself.
pub fn solve(problem: &VehicleRoutingProblem, params: SolverParams) -> Result<Solution, SolverError> {
    Solver::new(problem, params).solve()
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use crate::{
        solver::solver_params::Threads,
        test_utils::{self, TestJob},
    };

    use super::*;

    fn params(threads: usize, exploration_level: usize) -> SolverParams {
        SolverParams {
            exploration_level,
            threads: Threads::Multi(threads),
            ..SolverParams::default()
        }
    }

    #[test]
    fn test_solve_assigns_everything() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=6).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![3],
            2,
        );

        let solution = solve(&problem, params(2, 1)).unwrap();

        assert!(solution.unassigned.is_empty());
        assert_eq!(solution.routes.len(), 2);
        assert!(solution.summary.violations.is_empty());
    }

    #[test]
    fn test_threads_do_not_change_result() {
        let points = test_utils::create_location_grid(3, 4);
        let problem = test_utils::create_test_problem(
            &points,
            (1..=11).map(|id| TestJob::delivery(id, 1)).collect(),
            (0..3)
                .map(|id| test_utils::depot_vehicle(id, vec![4]))
                .collect(),
        );

        let single = solve(&problem, params(1, 2)).unwrap();
        let multi = solve(&problem, params(3, 2)).unwrap();

        assert_eq!(single, multi);
    }

    #[test]
    fn test_empty_problem() {
        let problem = test_utils::create_problem_with_jobs(vec![], vec![3], 1);

        let solution = solve(&problem, SolverParams::default()).unwrap();

        assert!(solution.routes.is_empty());
        assert!(solution.unassigned.is_empty());
    }

    #[test]
    fn test_zero_timeout_still_constructs() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=4).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![4],
            1,
        );

        let solution = solve(
            &problem,
            SolverParams {
                timeout: Some(SignedDuration::ZERO),
                ..SolverParams::default()
            },
        )
        .unwrap();

        assert!(solution.unassigned.is_empty());
        assert_eq!(solution.routes[0].steps.len(), 6);
    }
}
