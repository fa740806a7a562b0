use std::cmp::Ordering;

use tracing::{Level, debug, instrument};

use crate::{
    problem::{
        amount::Amount,
        job::JobIdx,
        units::Cost,
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        construction::heuristic_params::{Heuristic, HeuristicParameters, Init},
        insertion::{Insertion, best_insertion},
        solution::{working_route::WorkingRoute, working_solution::WorkingSolution},
    },
};

/// Cost of serving each job alone, `costs[job][vehicle]`. A shipment costs
/// start -> pickup -> delivery -> end and both legs share that value.
struct EmptyRouteCosts {
    costs: Vec<Vec<Cost>>,
}

impl EmptyRouteCosts {
    fn new(problem: &VehicleRoutingProblem) -> Self {
        let mut costs = vec![Vec::new(); problem.number_of_jobs()];

        for job_idx in JobIdx::all(problem.number_of_jobs()) {
            let job = problem.job(job_idx);
            if job.is_delivery() {
                continue;
            }

            let location = Some(job.location());
            let row = problem
                .vehicles()
                .iter()
                .map(|vehicle| {
                    if job.is_pickup() {
                        let delivery = Some(problem.job_location(problem.delivery_of(job_idx)));
                        (vehicle.eval_between(vehicle.start(), location)
                            + vehicle.eval_between(location, delivery)
                            + vehicle.eval_between(delivery, vehicle.end()))
                        .cost
                    } else {
                        (vehicle.eval_between(vehicle.start(), location)
                            + vehicle.eval_between(location, vehicle.end()))
                        .cost
                    }
                })
                .collect::<Vec<_>>();

            if job.is_pickup() {
                costs[problem.delivery_of(job_idx).get()] = row.clone();
            }
            costs[job_idx.get()] = row;
        }

        EmptyRouteCosts { costs }
    }

    fn get(&self, job: JobIdx, vehicle_id: VehicleIdx) -> Cost {
        self.costs[job.get()][vehicle_id.get()]
    }
}

/// Bigger vehicles first, then longer working hours, then cheaper ones.
fn vehicle_order(problem: &VehicleRoutingProblem) -> Vec<VehicleIdx> {
    let mut order: Vec<VehicleIdx> = VehicleIdx::all(problem.number_of_vehicles()).collect();
    order.sort_by(|&a, &b| {
        let first = problem.vehicle(a);
        let second = problem.vehicle(b);
        second
            .capacity()
            .lexicographic_cmp(first.capacity())
            .then_with(|| {
                second
                    .time_window()
                    .length()
                    .cmp(&first.time_window().length())
            })
            .then_with(|| first.fixed_cost().cmp(&second.fixed_cost()))
    });
    order
}

/// Unassigned jobs that can start an insertion: singles and pickups.
fn unassigned_heads<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &WorkingSolution<R>,
) -> Vec<JobIdx> {
    solution
        .unassigned()
        .iter()
        .copied()
        .filter(|&job| !problem.job(job).is_delivery())
        .collect()
}

fn shipped_amount(problem: &VehicleRoutingProblem, job: JobIdx) -> Amount {
    let job = problem.job(job);
    job.delivery() + job.pickup()
}

/// First job of an empty route according to `init`, higher priority first.
fn find_seed<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &WorkingSolution<R>,
    costs: &EmptyRouteCosts,
    vehicle_id: VehicleIdx,
    init: Init,
) -> Option<(JobIdx, Insertion)> {
    let route = solution.route(vehicle_id);
    let route_eval = route.eval(problem);
    let mut best: Option<(JobIdx, Insertion)> = None;

    for job in unassigned_heads(problem, solution) {
        let Some(insertion) = best_insertion(problem, route, route_eval, job) else {
            continue;
        };

        let better = match best {
            None => true,
            Some((best_job, _)) => {
                let priority = problem.job(job).priority();
                let best_priority = problem.job(best_job).priority();
                priority > best_priority
                    || (priority == best_priority
                        && match init {
                            Init::HigherAmount => {
                                shipped_amount(problem, job)
                                    .lexicographic_cmp(&shipped_amount(problem, best_job))
                                    == Ordering::Greater
                            }
                            Init::Furthest => {
                                costs.get(job, vehicle_id) > costs.get(best_job, vehicle_id)
                            }
                            Init::None => false,
                        })
            }
        };

        if better {
            best = Some((job, insertion));
        }
    }

    best
}

/// Greedily fills the route of `vehicle_id`. Candidates are ranked by
/// priority, then by insertion cost minus the weighted regret of not using
/// this vehicle for them.
fn fill_route<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &mut WorkingSolution<R>,
    costs: &EmptyRouteCosts,
    vehicle_id: VehicleIdx,
    params: &HeuristicParameters,
    regrets: &[Cost],
) {
    if params.init != Init::None
        && solution.route(vehicle_id).is_empty()
        && let Some((job, insertion)) = find_seed(problem, solution, costs, vehicle_id, params.init)
    {
        solution.insert(problem, vehicle_id, job, insertion.placement);
    }

    let regret_coeff = f64::from(params.regret_coeff);

    loop {
        let route = solution.route(vehicle_id);
        let route_eval = route.eval(problem);
        let mut best: Option<(u32, f64, JobIdx, Insertion)> = None;

        for job in unassigned_heads(problem, solution) {
            let Some(insertion) = best_insertion(problem, route, route_eval, job) else {
                continue;
            };

            let priority = problem.job(job).priority();
            let score = insertion.eval.cost as f64 - regret_coeff * regrets[job.get()] as f64;
            let better = best.is_none_or(|(best_priority, best_score, _, _)| {
                priority > best_priority || (priority == best_priority && score < best_score)
            });
            if better {
                best = Some((priority, score, job, insertion));
            }
        }

        let Some((_, _, job, insertion)) = best else {
            break;
        };
        solution.insert(problem, vehicle_id, job, insertion.placement);
    }
}

fn basic<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &mut WorkingSolution<R>,
    costs: &EmptyRouteCosts,
    params: &HeuristicParameters,
) {
    let order = vehicle_order(problem);
    let number_of_jobs = problem.number_of_jobs();

    // regrets[i][job]: cheapest empty route for `job` among the vehicles
    // filled after order[i]. The last vehicle falls back to its own cost.
    let mut regrets = vec![vec![0; number_of_jobs]; order.len()];
    if let Some(&last) = order.last() {
        for job in JobIdx::all(number_of_jobs) {
            regrets[order.len() - 1][job.get()] = costs.get(job, last);
        }
    }
    for position in (0..order.len().saturating_sub(1)).rev() {
        let next = order[position + 1];
        for job in JobIdx::all(number_of_jobs) {
            regrets[position][job.get()] =
                regrets[position + 1][job.get()].min(costs.get(job, next));
        }
    }

    for (position, &vehicle_id) in order.iter().enumerate() {
        if solution.unassigned().is_empty() {
            break;
        }

        fill_route(problem, solution, costs, vehicle_id, params, &regrets[position]);
    }
}

fn dynamic<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &mut WorkingSolution<R>,
    costs: &EmptyRouteCosts,
    params: &HeuristicParameters,
) {
    let mut remaining = vehicle_order(problem);
    let mut regrets = vec![0; problem.number_of_jobs()];

    while !remaining.is_empty() && !solution.unassigned().is_empty() {
        let heads = unassigned_heads(problem, solution);

        // Number of unassigned jobs for which each remaining vehicle has the
        // cheapest empty route.
        let mut closest_count = vec![0usize; remaining.len()];
        for &job in &heads {
            let min_cost = remaining
                .iter()
                .filter(|&&vehicle_id| problem.vehicle_ok_with_job(vehicle_id, job))
                .map(|&vehicle_id| costs.get(job, vehicle_id))
                .min();
            let Some(min_cost) = min_cost else {
                continue;
            };

            for (position, &vehicle_id) in remaining.iter().enumerate() {
                if problem.vehicle_ok_with_job(vehicle_id, job)
                    && costs.get(job, vehicle_id) == min_cost
                {
                    closest_count[position] += 1;
                }
            }
        }

        // Ties keep the earliest vehicle in the fill order.
        let position = closest_count
            .iter()
            .enumerate()
            .max_by(|(a, first), (b, second)| first.cmp(second).then_with(|| b.cmp(a)))
            .map_or(0, |(position, _)| position);
        let vehicle_id = remaining.remove(position);

        for &job in &heads {
            let regret = remaining
                .iter()
                .filter(|&&other| problem.vehicle_ok_with_job(other, job))
                .map(|&other| costs.get(job, other))
                .min()
                .unwrap_or_else(|| costs.get(job, vehicle_id));
            regrets[job.get()] = regret;
        }

        fill_route(problem, solution, costs, vehicle_id, params, &regrets);
    }
}

/// Builds an initial solution with one row of the heuristic tables. Jobs
/// that fit nowhere stay unassigned.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn construct_solution<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    params: &HeuristicParameters,
) -> WorkingSolution<R> {
    let mut solution = WorkingSolution::<R>::new(problem);
    if problem.number_of_jobs() == 0 || problem.number_of_vehicles() == 0 {
        return solution;
    }

    let costs = EmptyRouteCosts::new(problem);
    match params.heuristic {
        Heuristic::Basic => basic(problem, &mut solution, &costs, params),
        Heuristic::Dynamic => dynamic(problem, &mut solution, &costs, params),
    }

    debug!(
        heuristic = ?params.heuristic,
        init = ?params.init,
        regret_coeff = params.regret_coeff,
        unassigned = solution.unassigned().len(),
        "constructed solution"
    );

    solution
}
