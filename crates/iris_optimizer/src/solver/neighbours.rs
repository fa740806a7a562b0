use tracing::debug;

use crate::{
    problem::{
        job::JobIdx, units::Cost, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::working_route::WorkingRoute,
};

/// Number of closest jobs kept per job and cost view.
pub const NEIGHBOURS_COUNT: usize = 24;

/// Closest jobs of every job, per distinct vehicle cost view.
///
/// Built once per solve and shared read-only by every search. Lists are
/// sorted by job index so membership is a binary search.
#[derive(Debug)]
pub struct Neighbours {
    vehicle_groups: Vec<usize>,
    lists: Vec<Vec<Vec<JobIdx>>>,
    complete: bool,
}

impl Neighbours {
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        let number_of_jobs = problem.number_of_jobs();
        let complete = number_of_jobs <= NEIGHBOURS_COUNT + 1;

        let mut vehicle_groups = Vec::with_capacity(problem.number_of_vehicles());
        let mut representatives: Vec<VehicleIdx> = Vec::new();
        for vehicle_id in VehicleIdx::all(problem.number_of_vehicles()) {
            let vehicle = problem.vehicle(vehicle_id);
            let group = representatives.iter().position(|&representative| {
                problem
                    .vehicle(representative)
                    .cost_wrapper()
                    .is_equivalent(vehicle.cost_wrapper())
            });

            match group {
                Some(group) => vehicle_groups.push(group),
                None => {
                    vehicle_groups.push(representatives.len());
                    representatives.push(vehicle_id);
                }
            }
        }

        let lists = if complete {
            Vec::new()
        } else {
            representatives
                .iter()
                .map(|&representative| Self::compute_lists(problem, representative))
                .collect()
        };

        debug!(
            groups = representatives.len(),
            complete, "computed job neighbourhoods"
        );

        Neighbours {
            vehicle_groups,
            lists,
            complete,
        }
    }

    fn compute_lists(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Vec<Vec<JobIdx>> {
        let vehicle = problem.vehicle(vehicle_id);
        let number_of_jobs = problem.number_of_jobs();

        let mut candidates: Vec<(Cost, JobIdx)> = Vec::with_capacity(number_of_jobs);
        JobIdx::all(number_of_jobs)
            .map(|job| {
                let location = problem.job_location(job);
                candidates.clear();
                candidates.extend(JobIdx::all(number_of_jobs).filter(|&other| other != job).map(
                    |other| {
                        let other_location = problem.job_location(other);
                        (
                            vehicle.cost(location, other_location)
                                + vehicle.cost(other_location, location),
                            other,
                        )
                    },
                ));

                let count = NEIGHBOURS_COUNT.min(candidates.len());
                if count < candidates.len() {
                    candidates.select_nth_unstable(count);
                }

                let mut list: Vec<JobIdx> =
                    candidates[..count].iter().map(|&(_, other)| other).collect();
                list.sort_unstable();
                list
            })
            .collect()
    }

    pub fn is_neighbour(&self, vehicle_id: VehicleIdx, job: JobIdx, other: JobIdx) -> bool {
        self.complete
            || self.lists[self.vehicle_groups[vehicle_id.get()]][job.get()]
                .binary_search(&other)
                .is_ok()
    }

    /// Inserting `job` before `rank` in `route` creates an edge to one of its
    /// close jobs, or touches a route end.
    pub fn is_candidate_gap<R: WorkingRoute>(&self, route: &R, job: JobIdx, rank: usize) -> bool {
        let vehicle_id = route.vehicle_id();
        let jobs = route.jobs();

        rank == 0
            || rank == jobs.len()
            || self.is_neighbour(vehicle_id, job, jobs[rank - 1])
            || self.is_neighbour(vehicle_id, job, jobs[rank])
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{job::JobIdx, vehicle::VehicleIdx},
        solver::solution::{raw_route::RawRoute, working_route::WorkingRoute},
        test_utils::{self, TestJob},
    };

    use super::*;

    #[test]
    fn test_small_problems_are_complete() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::delivery(1, 1), TestJob::delivery(2, 1)],
            vec![10],
            1,
        );

        let neighbours = Neighbours::new(&problem);
        assert!(neighbours.is_neighbour(VehicleIdx::new(0), JobIdx::new(0), JobIdx::new(1)));
    }

    #[test]
    fn test_closest_jobs_on_a_line() {
        let jobs = (0..40).map(|id| TestJob::delivery(id + 1, 0)).collect();
        let problem = test_utils::create_problem_with_jobs(jobs, vec![10], 1);
        let neighbours = Neighbours::new(&problem);
        let vehicle = VehicleIdx::new(0);

        // Job i sits at x = i + 1.
        assert!(neighbours.is_neighbour(vehicle, JobIdx::new(0), JobIdx::new(1)));
        assert!(neighbours.is_neighbour(vehicle, JobIdx::new(0), JobIdx::new(NEIGHBOURS_COUNT)));
        assert!(!neighbours.is_neighbour(vehicle, JobIdx::new(0), JobIdx::new(39)));

        let mut route = RawRoute::new(&problem, vehicle);
        route.add(&problem, JobIdx::new(39), 0);
        route.add(&problem, JobIdx::new(38), 1);
        assert!(neighbours.is_candidate_gap(&route, JobIdx::new(0), 0));
        assert!(!neighbours.is_candidate_gap(&route, JobIdx::new(0), 1));
        assert!(neighbours.is_candidate_gap(&route, JobIdx::new(0), 2));
    }
}
