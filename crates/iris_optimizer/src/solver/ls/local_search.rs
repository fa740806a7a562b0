use smallvec::SmallVec;
use tracing::{Level, debug, instrument, trace};

use crate::{
    problem::{
        eval::Eval, job::JobIdx, units::Cost, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        deadline::Deadline,
        insertion::{Placement, best_insertion},
        ls::{
            r#move::{LocalSearchMove, Neighbourhood, RoutePair, default_neighbourhoods},
            search_context::SearchContext,
        },
        neighbours::Neighbours,
        solution::{
            indicators::SolutionIndicators, solution_state::SolutionState,
            working_route::WorkingRoute, working_solution::WorkingSolution,
        },
    },
};

#[derive(Debug)]
struct BestMove {
    gain: Eval,
    neighbourhood: usize,
    op: LocalSearchMove,
}

#[derive(Debug, Clone, Copy)]
struct Addition {
    job: JobIdx,
    vehicle_id: VehicleIdx,
    priority: u32,
    eval: Eval,
    placement: Placement,
}

/// Best-improvement descent over every neighbourhood, followed by
/// perturbation rounds that keep the best solution seen.
///
/// Best moves are cached per ordered route pair and only the pairs touching
/// a modified route are scanned again.
pub struct LocalSearch<'a, R: WorkingRoute> {
    problem: &'a VehicleRoutingProblem,
    neighbours: &'a Neighbours,
    neighbourhoods: Vec<Box<dyn Neighbourhood<R>>>,
    solution: WorkingSolution<R>,
    state: SolutionState,
    best_moves: Vec<Vec<Option<BestMove>>>,
    stale: Vec<Vec<bool>>,
    depth: usize,
    deadline: Deadline,
    applied_moves: usize,
}

impl<'a, R: WorkingRoute> LocalSearch<'a, R> {
    pub fn new(
        problem: &'a VehicleRoutingProblem,
        neighbours: &'a Neighbours,
        solution: WorkingSolution<R>,
        depth: usize,
        deadline: Deadline,
    ) -> Self {
        let number_of_vehicles = problem.number_of_vehicles();
        let mut state = SolutionState::new(problem);
        state.setup(problem, &solution);

        LocalSearch {
            problem,
            neighbours,
            neighbourhoods: default_neighbourhoods(),
            solution,
            state,
            best_moves: (0..number_of_vehicles)
                .map(|_| (0..number_of_vehicles).map(|_| None).collect())
                .collect(),
            stale: vec![vec![true; number_of_vehicles]; number_of_vehicles],
            depth,
            deadline,
            applied_moves: 0,
        }
    }

    pub fn solution(&self) -> &WorkingSolution<R> {
        &self.solution
    }

    pub fn into_solution(self) -> WorkingSolution<R> {
        self.solution
    }

    pub fn applied_moves(&self) -> usize {
        self.applied_moves
    }

    fn ctx(&self) -> SearchContext<'_, R> {
        SearchContext {
            problem: self.problem,
            neighbours: self.neighbours,
            solution: &self.solution,
            state: &self.state,
        }
    }

    fn all_routes(&self) -> Vec<VehicleIdx> {
        VehicleIdx::all(self.problem.number_of_vehicles()).collect()
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn run(&mut self) {
        let all_routes = self.all_routes();
        self.try_job_additions(&all_routes);
        self.descend();

        let mut best_solution = self.solution.clone();
        let mut best_indicators = self.solution.indicators(self.problem);

        for round in 1..=self.depth {
            if self.deadline.is_reached() {
                debug!(round, "deadline reached before perturbation");
                break;
            }

            self.remove_from_routes(round);
            self.try_job_additions(&all_routes);
            self.descend();

            let indicators = self.solution.indicators(self.problem);
            if indicators < best_indicators {
                debug!(round, cost = indicators.cost, "perturbation improved the solution");
                best_solution = self.solution.clone();
                best_indicators = indicators;
            } else {
                self.solution = best_solution.clone();
                self.state.setup(self.problem, &self.solution);
            }
        }

        self.solution = best_solution;
        debug!(
            applied_moves = self.applied_moves,
            cost = best_indicators.cost,
            unassigned = self.solution.unassigned().len(),
            "local search finished"
        );
    }

    /// Applies the best improving move until none is left or the deadline
    /// is reached.
    fn descend(&mut self) {
        for row in &mut self.stale {
            row.fill(true);
        }

        loop {
            if self.deadline.is_reached() {
                debug!("deadline reached during descent");
                break;
            }

            self.refresh_best_moves();
            let Some((s, t)) = self.best_pair() else {
                break;
            };
            let Some(best) = self.best_moves[s.get()][t.get()].take() else {
                break;
            };

            let still_improving = {
                let ctx = self.ctx();
                best.op.gain(&ctx) == best.gain && best.op.is_valid(&ctx)
            };
            if !still_improving {
                self.stale[s.get()][t.get()] = true;
                continue;
            }

            self.apply(best);
        }
    }

    fn scan_pair(&self, pair: RoutePair) -> Option<BestMove> {
        let ctx = self.ctx();
        let mut best: Option<BestMove> = None;

        for (index, neighbourhood) in self.neighbourhoods.iter().enumerate() {
            let min_gain = best.as_ref().map_or(0, |best| best.gain.cost);
            if let Some((gain, op)) = neighbourhood.best_move(&ctx, pair, min_gain) {
                best = Some(BestMove {
                    gain,
                    neighbourhood: index,
                    op,
                });
            }
        }

        best
    }

    fn refresh_best_moves(&mut self) {
        for s in VehicleIdx::all(self.problem.number_of_vehicles()) {
            for t in VehicleIdx::all(self.problem.number_of_vehicles()) {
                if !self.stale[s.get()][t.get()] {
                    continue;
                }

                let best = self.scan_pair((s, t));
                self.best_moves[s.get()][t.get()] = best;
                self.stale[s.get()][t.get()] = false;
            }
        }
    }

    /// Highest gain, then lowest neighbourhood index, then lowest pair.
    fn best_pair(&self) -> Option<RoutePair> {
        let mut best: Option<(Cost, usize, RoutePair)> = None;

        for (s, row) in self.best_moves.iter().enumerate() {
            for (t, best_move) in row.iter().enumerate() {
                let Some(best_move) = best_move else {
                    continue;
                };

                let better = best.is_none_or(|(cost, neighbourhood, _)| {
                    best_move.gain.cost > cost
                        || (best_move.gain.cost == cost && best_move.neighbourhood < neighbourhood)
                });
                if better {
                    best = Some((
                        best_move.gain.cost,
                        best_move.neighbourhood,
                        (VehicleIdx::new(s), VehicleIdx::new(t)),
                    ));
                }
            }
        }

        best.map(|(_, _, pair)| pair)
    }

    fn apply(&mut self, best: BestMove) {
        let problem = self.problem;
        let before = self.solution.eval(problem);
        let unassigned_before = self.solution.unassigned().len();
        let empty_before: Vec<bool> = self
            .solution
            .routes()
            .iter()
            .map(|route| route.is_empty())
            .collect();

        let mut touched: SmallVec<[VehicleIdx; 8]> = best
            .op
            .apply(problem, self.neighbours, &mut self.solution, &self.state)
            .into_iter()
            .collect();
        for &vehicle_id in &touched {
            self.state.update(problem, self.solution.route(vehicle_id));
            debug_assert_eq!(
                self.state.route_eval(vehicle_id),
                self.solution.route(vehicle_id).eval(problem)
            );
        }
        debug_assert_eq!(before - best.gain, self.solution.eval(problem));

        self.applied_moves += 1;
        trace!(
            operator = best.op.operator_name(),
            gain = best.gain.cost,
            "applied move"
        );

        for vehicle_id in self.try_job_additions(&touched) {
            if !touched.contains(&vehicle_id) {
                touched.push(vehicle_id);
            }
        }
        debug_assert!(self.solution.is_consistent(problem));

        let emptiness_changed = self
            .solution
            .routes()
            .iter()
            .zip(&empty_before)
            .any(|(route, &was_empty)| route.is_empty() != was_empty);
        let unassigned_changed = self.solution.unassigned().len() != unassigned_before
            || best.op.unassigned_change().is_some();

        self.invalidate(&touched, emptiness_changed || unassigned_changed);
    }

    /// Marks every pair involving a touched route as stale. Single-route
    /// pairs also read the unassigned jobs and the empty vehicles, so they
    /// all go stale when those change.
    fn invalidate(&mut self, touched: &[VehicleIdx], single_route_pairs: bool) {
        let number_of_vehicles = self.problem.number_of_vehicles();
        for &vehicle_id in touched {
            let v = vehicle_id.get();
            for other in 0..number_of_vehicles {
                self.stale[v][other] = true;
                self.stale[other][v] = true;
            }
        }

        if single_route_pairs {
            for v in 0..number_of_vehicles {
                self.stale[v][v] = true;
            }
        }
    }

    /// Inserts unassigned jobs in `routes` while one fits, higher priority
    /// first then cheapest. Returns the modified routes.
    fn try_job_additions(&mut self, routes: &[VehicleIdx]) -> Vec<VehicleIdx> {
        let problem = self.problem;
        let mut modified = Vec::new();

        loop {
            let mut best: Option<Addition> = None;

            for &job_idx in self.solution.unassigned() {
                let job = problem.job(job_idx);
                if job.is_delivery() {
                    continue;
                }

                for &vehicle_id in routes {
                    let route = self.solution.route(vehicle_id);
                    let route_eval = self.state.route_eval(vehicle_id);

                    let Some(insertion) = best_insertion(problem, route, route_eval, job_idx)
                    else {
                        continue;
                    };
                    let eval = insertion.eval;

                    let better = best.is_none_or(|best| {
                        job.priority() > best.priority
                            || (job.priority() == best.priority && eval.cost < best.eval.cost)
                    });
                    if better {
                        best = Some(Addition {
                            job: job_idx,
                            vehicle_id,
                            priority: job.priority(),
                            eval,
                            placement: insertion.placement,
                        });
                    }
                }
            }

            let Some(addition) = best else {
                break;
            };

            self.solution.insert(
                problem,
                addition.vehicle_id,
                addition.job,
                addition.placement,
            );
            self.state
                .update(problem, self.solution.route(addition.vehicle_id));
            trace!(job = %addition.job, vehicle = %addition.vehicle_id, "added unassigned job");

            if !modified.contains(&addition.vehicle_id) {
                modified.push(addition.vehicle_id);
            }
        }

        modified
    }

    /// Takes out the `count` jobs whose removal saves the most from every
    /// route. Shipments leave with both legs. Removals that would break a
    /// time window further down the route are skipped.
    fn remove_from_routes(&mut self, count: usize) {
        let problem = self.problem;

        for vehicle_id in self.all_routes() {
            for _ in 0..count {
                let route = self.solution.route(vehicle_id);
                let mut best: Option<(Cost, usize, usize)> = None;

                for (rank, &job_idx) in route.jobs().iter().enumerate() {
                    let job = problem.job(job_idx);
                    let (gain, last) = if job.is_single() {
                        (self.state.node_gain(vehicle_id, rank), rank + 1)
                    } else if job.is_pickup() {
                        let delivery_rank = self.state.matching_rank(vehicle_id, rank);
                        (self.state.pd_gain(vehicle_id, rank), delivery_rank + 1)
                    } else {
                        continue;
                    };

                    if best.is_some_and(|(cost, _, _)| gain.cost <= cost) {
                        continue;
                    }
                    let kept = &route.jobs()[rank + 1..last.max(rank + 2) - 1];
                    if R::HAS_TIME_WINDOWS
                        && !route.is_valid_addition_for_tw(problem, kept, rank, last)
                    {
                        continue;
                    }
                    best = Some((gain.cost, rank, last));
                }

                let Some((_, rank, last)) = best else {
                    break;
                };

                // Both legs leave in one replacement.
                let first = route.jobs()[rank];
                let matching = route.jobs()[last - 1];
                let kept: SmallVec<[JobIdx; 8]> = route.jobs()[rank + 1..last.max(rank + 2) - 1]
                    .iter()
                    .copied()
                    .collect();
                self.solution
                    .route_mut(vehicle_id)
                    .replace(problem, &kept, rank, last);
                self.solution.mark_unassigned(first);
                self.solution.mark_unassigned(matching);
                self.state.update(problem, self.solution.route(vehicle_id));
            }
        }
    }

    pub fn indicators(&self) -> SolutionIndicators {
        self.solution.indicators(self.problem)
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use crate::{
        problem::{
            amount::Amount, job::JobBuilder, matrix::Matrix, time_window::TimeWindow,
            vehicle::VehicleBuilder, vehicle_routing_problem::VehicleRoutingProblemBuilder,
        },
        solver::solution::{raw_route::RawRoute, tw_route::TwRoute},
        test_utils::{self, TestJob, TestRoute},
    };

    use super::*;

    fn scrambled_line() -> VehicleRoutingProblem {
        test_utils::create_problem_with_jobs(
            (1..=5).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![10],
            1,
        )
    }

    fn scrambled_solution(problem: &VehicleRoutingProblem) -> WorkingSolution<RawRoute> {
        test_utils::create_test_working_solution(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![3, 0, 4, 1, 2],
            }],
        )
    }

    #[test]
    fn test_descent_reaches_line_optimum() {
        let problem = scrambled_line();
        let neighbours = Neighbours::new(&problem);
        let solution = scrambled_solution(&problem);
        assert_eq!(solution.eval(&problem).duration, 1800);

        let mut search = LocalSearch::new(&problem, &neighbours, solution, 0, Deadline::NONE);
        search.run();

        // Out to x = 5 and back.
        assert!(search.applied_moves() > 0);
        assert_eq!(search.solution().eval(&problem).duration, 1000);
        assert!(search.solution().is_consistent(&problem));
    }

    #[test]
    fn test_local_optimum_is_stable() {
        let problem = scrambled_line();
        let neighbours = Neighbours::new(&problem);

        let mut first = LocalSearch::new(
            &problem,
            &neighbours,
            scrambled_solution(&problem),
            0,
            Deadline::NONE,
        );
        first.run();
        let optimum = first.into_solution();
        let cost = optimum.eval(&problem);

        let mut second = LocalSearch::new(&problem, &neighbours, optimum, 0, Deadline::NONE);
        second.run();

        assert_eq!(second.applied_moves(), 0);
        assert_eq!(second.solution().eval(&problem), cost);
    }

    #[test]
    fn test_expired_deadline_only_adds_jobs() {
        let problem = scrambled_line();
        let neighbours = Neighbours::new(&problem);
        let solution = test_utils::create_test_working_solution::<RawRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![3, 0, 4, 1],
            }],
        );

        let mut search = LocalSearch::new(
            &problem,
            &neighbours,
            solution,
            2,
            Deadline::after(SignedDuration::ZERO),
        );
        search.run();

        assert_eq!(search.applied_moves(), 0);
        assert!(search.solution().unassigned().is_empty());
    }

    #[test]
    fn test_additions_prefer_priority() {
        // Room for a single job: the far one with a priority wins.
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::delivery(1, 1), TestJob::delivery(2, 1).with_priority(3)],
            vec![1],
            1,
        );
        let neighbours = Neighbours::new(&problem);
        let solution = WorkingSolution::<RawRoute>::new(&problem);

        let mut search = LocalSearch::new(&problem, &neighbours, solution, 1, Deadline::NONE);
        search.run();

        let indicators = search.indicators();
        assert_eq!(indicators.priority_sum, 3);
        assert_eq!(
            search.solution().route(VehicleIdx::new(0)).jobs(),
            &[JobIdx::new(1)]
        );
    }

    #[test]
    fn test_perturbation_never_worsens() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=8).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![4],
            3,
        );
        let neighbours = Neighbours::new(&problem);
        let solution = || {
            test_utils::create_test_working_solution::<RawRoute>(
                &problem,
                vec![
                    TestRoute {
                        vehicle_id: 0,
                        job_ids: vec![7, 0, 3],
                    },
                    TestRoute {
                        vehicle_id: 1,
                        job_ids: vec![1, 6, 4],
                    },
                    TestRoute {
                        vehicle_id: 2,
                        job_ids: vec![5, 2],
                    },
                ],
            )
        };

        let mut plain = LocalSearch::new(&problem, &neighbours, solution(), 0, Deadline::NONE);
        plain.run();
        let mut perturbed = LocalSearch::new(&problem, &neighbours, solution(), 3, Deadline::NONE);
        perturbed.run();

        assert!(perturbed.indicators() <= plain.indicators());
        assert!(perturbed.solution().is_consistent(&problem));
        assert_eq!(perturbed.indicators().assigned, 8);
    }

    #[test]
    fn test_descent_with_time_windows() {
        // x = 1 opens at t = 8, the vehicle waits or serves it last.
        let problem = test_utils::create_problem_with_jobs(
            (1..=5)
                .map(|id| {
                    let job = TestJob::delivery(id, 1);
                    if id == 1 {
                        job.with_time_window(TimeWindow::new(8, 40).unwrap())
                    } else {
                        job
                    }
                })
                .collect(),
            vec![10],
            1,
        );
        let neighbours = Neighbours::new(&problem);
        let solution = test_utils::create_test_working_solution::<TwRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![3, 0, 4, 1, 2],
            }],
        );
        assert_eq!(solution.eval(&problem).duration, 1800);

        let mut search = LocalSearch::new(&problem, &neighbours, solution, 3, Deadline::NONE);
        search.run();

        let route = search.solution().route(VehicleIdx::new(0));
        assert_eq!(search.solution().eval(&problem).duration, 1000);
        assert_eq!(route.len(), 5);
        assert!(route.is_consistent(&problem));
        assert!(search.solution().is_consistent(&problem));
    }

    /// Job 1 is the expensive detour but also the only way to reach job 2 in
    /// time: 0 -> 2 takes 100 seconds against a window closing at 10.
    fn detour_problem() -> VehicleRoutingProblem {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_durations_matrix(
                "car",
                Matrix::from_rows(vec![vec![0, 1, 100], vec![1, 0, 1], vec![100, 1, 0]]),
            )
            .set_costs_matrix(
                "car",
                Matrix::from_rows(vec![vec![0, 50, 1], vec![50, 0, 50], vec![1, 50, 0]]),
            );

        let mut vehicle = VehicleBuilder::default();
        vehicle
            .set_id(1)
            .set_start_location(0)
            .set_end_location(0)
            .set_capacity(Amount::from_vec(vec![2]));
        builder.add_vehicle(vehicle.build().unwrap());

        for (id, time_windows) in [(1, vec![]), (2, vec![TimeWindow::new(0, 10).unwrap()])] {
            let mut job = JobBuilder::default();
            job.set_id(id)
                .set_location(id as usize)
                .set_delivery(Amount::from_vec(vec![1]))
                .set_time_windows(time_windows);
            builder.add_job(job.build().unwrap());
        }

        builder.build().unwrap()
    }

    #[test]
    fn test_perturbation_keeps_time_windows() {
        let problem = detour_problem();
        let neighbours = Neighbours::new(&problem);
        let solution = test_utils::create_test_working_solution::<TwRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 1],
            }],
        );

        let mut search = LocalSearch::new(&problem, &neighbours, solution, 5, Deadline::NONE);
        search.run();

        let route = search.solution().route(VehicleIdx::new(0));
        assert_eq!(route.jobs(), &[JobIdx::new(0), JobIdx::new(1)]);
        assert!(route.is_consistent(&problem));
        assert_eq!(search.indicators().assigned, 2);
    }

    #[test]
    fn test_perturbation_removes_shipments_whole() {
        // Pickup at x = 1, delivery at x = 2, then x = 3 due by t = 3.
        let problem = test_utils::create_problem_with_jobs(
            vec![
                TestJob::shipment(1, 2, 1),
                TestJob::delivery(3, 1).with_time_window(TimeWindow::new(0, 3).unwrap()),
                TestJob::delivery(4, 1),
            ],
            vec![2],
            2,
        );
        let neighbours = Neighbours::new(&problem);
        let solution = test_utils::create_test_working_solution::<TwRoute>(
            &problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1, 2],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![3],
                },
            ],
        );

        let mut search = LocalSearch::new(&problem, &neighbours, solution, 4, Deadline::NONE);
        search.run();

        assert_eq!(search.indicators().assigned, 4);
        assert!(search.solution().is_consistent(&problem));
        for vehicle_id in VehicleIdx::all(problem.number_of_vehicles()) {
            assert!(search.solution().route(vehicle_id).is_consistent(&problem));
        }
    }
}
