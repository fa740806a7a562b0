use crate::{
    problem::{eval::Eval, job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::solution::working_route::WorkingRoute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleInsertion {
    pub rank: usize,
    pub eval: Eval,
}

/// Pickup inserted before `pickup_rank` and delivery before `delivery_rank`,
/// both ranks read on the current route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdInsertion {
    pub pickup_rank: usize,
    pub delivery_rank: usize,
    pub eval: Eval,
}

/// Travel eval added by inserting `job` before `rank` of `route`.
pub fn addition_eval<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    job: JobIdx,
    rank: usize,
) -> Eval {
    let vehicle = problem.vehicle(route.vehicle_id());
    let previous = route.raw().location_before(problem, rank);
    let next = route.raw().location_at(problem, rank);
    let location = Some(problem.job_location(job));

    vehicle.eval_between(previous, location) + vehicle.eval_between(location, next)
        - vehicle.eval_between(previous, next)
}

/// Travel eval added by inserting a shipment, `pickup_rank <= delivery_rank`.
pub fn pd_addition_eval<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    pickup: JobIdx,
    pickup_rank: usize,
    delivery_rank: usize,
) -> Eval {
    let delivery = problem.delivery_of(pickup);
    if pickup_rank != delivery_rank {
        return addition_eval(problem, route, pickup, pickup_rank)
            + addition_eval(problem, route, delivery, delivery_rank);
    }

    let vehicle = problem.vehicle(route.vehicle_id());
    let previous = route.raw().location_before(problem, pickup_rank);
    let next = route.raw().location_at(problem, pickup_rank);
    let pickup_location = Some(problem.job_location(pickup));
    let delivery_location = Some(problem.job_location(delivery));

    vehicle.eval_between(previous, pickup_location)
        + vehicle.eval_between(pickup_location, delivery_location)
        + vehicle.eval_between(delivery_location, next)
        - vehicle.eval_between(previous, next)
}

/// Fixed cost paid when the first job lands in `route`.
pub fn activation_eval<R: WorkingRoute>(problem: &VehicleRoutingProblem, route: &R) -> Eval {
    if route.is_empty() {
        Eval::new(problem.vehicle(route.vehicle_id()).fixed_cost(), 0)
    } else {
        Eval::ZERO
    }
}

fn is_valid_for_travel_time<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    route_eval: Eval,
    added: Eval,
) -> bool {
    let vehicle = problem.vehicle(route.vehicle_id());
    !vehicle.has_max_travel_time() || vehicle.ok_for_travel_time(route_eval.duration + added.duration)
}

/// Cheapest valid rank for a single job. Ranks are priced first and only
/// checked for validity when they beat the current best.
pub fn best_single_insertion<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    route_eval: Eval,
    job_idx: JobIdx,
) -> Option<SingleInsertion> {
    let job = problem.job(job_idx);
    debug_assert!(job.is_single());

    let vehicle = problem.vehicle(route.vehicle_id());
    if !problem.vehicle_ok_with_job(route.vehicle_id(), job_idx)
        || route.len() + 1 > vehicle.max_tasks()
    {
        return None;
    }

    let activation = activation_eval(problem, route);
    let (begin, end) = route.insertion_ranks(problem, job_idx);
    let mut best: Option<SingleInsertion> = None;

    for rank in begin..end.min(route.len() + 1) {
        let eval = activation + addition_eval(problem, route, job_idx, rank);
        if best.is_some_and(|best| best.eval.cost <= eval.cost) {
            continue;
        }

        let valid = is_valid_for_travel_time(problem, route, route_eval, eval)
            && route
                .raw()
                .is_valid_addition_for_capacity(problem, job.pickup(), job.delivery(), rank)
            && route.is_valid_addition_for_tw(problem, &[job_idx], rank, rank);

        if valid {
            best = Some(SingleInsertion { rank, eval });
        }
    }

    best
}

/// Cheapest valid ranks for the shipment picked up at `pickup`.
pub fn best_pd_insertion<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    route_eval: Eval,
    pickup: JobIdx,
) -> Option<PdInsertion> {
    debug_assert!(problem.job(pickup).is_pickup());
    let delivery = problem.delivery_of(pickup);

    let vehicle = problem.vehicle(route.vehicle_id());
    if !problem.vehicle_ok_with_job(route.vehicle_id(), pickup)
        || !problem.vehicle_ok_with_job(route.vehicle_id(), delivery)
        || route.len() + 2 > vehicle.max_tasks()
    {
        return None;
    }

    let activation = activation_eval(problem, route);
    let (pickup_begin, pickup_end) = route.insertion_ranks(problem, pickup);
    let (delivery_begin, delivery_end) = route.insertion_ranks(problem, delivery);
    let len = route.len();

    let mut best: Option<PdInsertion> = None;
    let mut sequence = Vec::with_capacity(len + 2);

    for pickup_rank in pickup_begin..pickup_end.min(len + 1) {
        for delivery_rank in pickup_rank.max(delivery_begin)..delivery_end.min(len + 1) {
            let eval =
                activation + pd_addition_eval(problem, route, pickup, pickup_rank, delivery_rank);
            if best.is_some_and(|best| best.eval.cost <= eval.cost) {
                continue;
            }

            if !is_valid_for_travel_time(problem, route, route_eval, eval) {
                continue;
            }

            sequence.clear();
            sequence.push(pickup);
            sequence.extend_from_slice(&route.jobs()[pickup_rank..delivery_rank]);
            sequence.push(delivery);

            let valid = route.raw().is_valid_replacement_for_capacity(
                problem,
                &sequence,
                pickup_rank,
                delivery_rank,
            ) && route.is_valid_addition_for_tw(problem, &sequence, pickup_rank, delivery_rank);

            if valid {
                best = Some(PdInsertion {
                    pickup_rank,
                    delivery_rank,
                    eval,
                });
            }
        }
    }

    best
}

/// Where an unassigned job lands in a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Single { rank: usize },
    Shipment { pickup_rank: usize, delivery_rank: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub eval: Eval,
    pub placement: Placement,
}

/// Cheapest valid insertion of a single job or of the shipment picked up at
/// `job`. Delivery legs are never inserted on their own.
pub fn best_insertion<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    route: &R,
    route_eval: Eval,
    job: JobIdx,
) -> Option<Insertion> {
    if problem.job(job).is_pickup() {
        best_pd_insertion(problem, route, route_eval, job).map(|insertion| Insertion {
            eval: insertion.eval,
            placement: Placement::Shipment {
                pickup_rank: insertion.pickup_rank,
                delivery_rank: insertion.delivery_rank,
            },
        })
    } else {
        best_single_insertion(problem, route, route_eval, job).map(|insertion| Insertion {
            eval: insertion.eval,
            placement: Placement::Single {
                rank: insertion.rank,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{time_window::TimeWindow, vehicle::VehicleIdx},
        solver::solution::{raw_route::RawRoute, tw_route::TwRoute},
        test_utils::{self, TestJob, TestRoute},
    };

    use super::*;

    #[test]
    fn test_best_single_insertion_on_the_way() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=3).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![10],
            1,
        );
        let solution = test_utils::create_test_working_solution::<RawRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 2],
            }],
        );
        let route = solution.route(VehicleIdx::new(0));

        let insertion =
            best_single_insertion(&problem, route, route.eval(&problem), JobIdx::new(1)).unwrap();
        assert_eq!(insertion.rank, 1);
        assert_eq!(insertion.eval, Eval::ZERO);
    }

    #[test]
    fn test_best_single_insertion_capacity() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::delivery(1, 6), TestJob::delivery(2, 6)],
            vec![10],
            1,
        );
        let solution = test_utils::create_test_working_solution::<RawRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0],
            }],
        );
        let route = solution.route(VehicleIdx::new(0));

        assert!(best_single_insertion(&problem, route, route.eval(&problem), JobIdx::new(1)).is_none());
    }

    #[test]
    fn test_best_single_insertion_skips_late_ranks() {
        // x = 1 closes at t = 1, only reachable straight from the depot.
        let problem = test_utils::create_problem_with_jobs(
            vec![
                TestJob::delivery(1, 1).with_time_window(TimeWindow::new(0, 1).unwrap()),
                TestJob::delivery(2, 1),
            ],
            vec![10],
            1,
        );
        let solution = test_utils::create_test_working_solution::<TwRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![1],
            }],
        );
        let route = solution.route(VehicleIdx::new(0));

        let insertion =
            best_single_insertion(&problem, route, route.eval(&problem), JobIdx::new(0)).unwrap();
        assert_eq!(insertion.rank, 0);
    }

    #[test]
    fn test_best_pd_insertion() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::delivery(1, 1), TestJob::shipment(2, 3, 1), TestJob::delivery(4, 1)],
            vec![10],
            1,
        );
        let solution = test_utils::create_test_working_solution::<RawRoute>(
            &problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 3],
            }],
        );
        let route = solution.route(VehicleIdx::new(0));

        // Pickup at x = 2 and delivery at x = 3 both sit between x = 1 and x = 4.
        let insertion =
            best_pd_insertion(&problem, route, route.eval(&problem), JobIdx::new(1)).unwrap();
        assert_eq!(insertion.pickup_rank, 1);
        assert_eq!(insertion.delivery_rank, 1);
        assert_eq!(insertion.eval, Eval::ZERO);
    }

    #[test]
    fn test_empty_route_pays_fixed_cost() {
        use crate::problem::vehicle::VehicleCosts;

        let mut vehicle = test_utils::depot_vehicle(0, vec![10]);
        vehicle.set_costs(VehicleCosts {
            fixed: 50,
            ..VehicleCosts::default()
        });
        let problem = test_utils::create_test_problem(
            &[(0, 0), (2, 0)],
            vec![TestJob::delivery(1, 1)],
            vec![vehicle],
        );
        let solution = test_utils::create_test_working_solution::<RawRoute>(&problem, vec![]);
        let route = solution.route(VehicleIdx::new(0));

        let insertion =
            best_single_insertion(&problem, route, Eval::ZERO, JobIdx::new(0)).unwrap();
        assert_eq!(insertion.eval.duration, 400);
        assert_eq!(insertion.eval.cost, 400 * 3600 + problem.vehicle(VehicleIdx::new(0)).fixed_cost());
    }
}
