use std::collections::BTreeSet;

use crate::{
    problem::{
        eval::Eval, job::JobIdx, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        insertion::Placement,
        solution::{indicators::SolutionIndicators, working_route::WorkingRoute},
    },
};

/// One route per vehicle, indexed by `VehicleIdx`, plus the jobs left out.
///
/// Shipments are assigned or unassigned as a whole: both legs are either in
/// the same route or both in `unassigned`.
#[derive(Debug, Clone)]
pub struct WorkingSolution<R: WorkingRoute> {
    routes: Vec<R>,
    unassigned: BTreeSet<JobIdx>,
}

impl<R: WorkingRoute> WorkingSolution<R> {
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        WorkingSolution {
            routes: VehicleIdx::all(problem.number_of_vehicles())
                .map(|vehicle_id| R::new(problem, vehicle_id))
                .collect(),
            unassigned: JobIdx::all(problem.number_of_jobs()).collect(),
        }
    }

    pub fn routes(&self) -> &[R] {
        &self.routes
    }

    pub fn route(&self, vehicle_id: VehicleIdx) -> &R {
        &self.routes[vehicle_id.get()]
    }

    pub fn route_mut(&mut self, vehicle_id: VehicleIdx) -> &mut R {
        &mut self.routes[vehicle_id.get()]
    }

    pub fn unassigned(&self) -> &BTreeSet<JobIdx> {
        &self.unassigned
    }

    pub fn is_unassigned(&self, job: JobIdx) -> bool {
        self.unassigned.contains(&job)
    }

    pub fn mark_assigned(&mut self, job: JobIdx) {
        self.unassigned.remove(&job);
    }

    pub fn mark_unassigned(&mut self, job: JobIdx) {
        self.unassigned.insert(job);
    }

    /// Inserts a single job before `rank`.
    pub fn insert_job(
        &mut self,
        problem: &VehicleRoutingProblem,
        vehicle_id: VehicleIdx,
        job: JobIdx,
        rank: usize,
    ) {
        self.route_mut(vehicle_id).add(problem, job, rank);
        self.unassigned.remove(&job);
    }

    /// Inserts a shipment with its pickup before `pickup_rank` and its delivery
    /// before `delivery_rank`, both ranks taken in the current route.
    pub fn insert_shipment(
        &mut self,
        problem: &VehicleRoutingProblem,
        vehicle_id: VehicleIdx,
        pickup: JobIdx,
        pickup_rank: usize,
        delivery_rank: usize,
    ) {
        let delivery = problem.delivery_of(pickup);
        let route = self.route_mut(vehicle_id);

        let mut sequence = Vec::with_capacity(delivery_rank - pickup_rank + 2);
        sequence.push(pickup);
        sequence.extend_from_slice(&route.jobs()[pickup_rank..delivery_rank]);
        sequence.push(delivery);
        route.replace(problem, &sequence, pickup_rank, delivery_rank);

        self.unassigned.remove(&pickup);
        self.unassigned.remove(&delivery);
    }

    pub fn insert(
        &mut self,
        problem: &VehicleRoutingProblem,
        vehicle_id: VehicleIdx,
        job: JobIdx,
        placement: Placement,
    ) {
        match placement {
            Placement::Single { rank } => self.insert_job(problem, vehicle_id, job, rank),
            Placement::Shipment {
                pickup_rank,
                delivery_rank,
            } => self.insert_shipment(problem, vehicle_id, job, pickup_rank, delivery_rank),
        }
    }

    pub fn eval(&self, problem: &VehicleRoutingProblem) -> Eval {
        self.routes.iter().map(|route| route.eval(problem)).sum()
    }

    pub fn used_vehicles(&self) -> usize {
        self.routes.iter().filter(|route| !route.is_empty()).count()
    }

    pub fn indicators(&self, problem: &VehicleRoutingProblem) -> SolutionIndicators {
        let mut priority_sum = 0;
        let mut assigned = 0;
        for route in &self.routes {
            assigned += route.len();
            priority_sum += route
                .jobs()
                .iter()
                .map(|&job| u64::from(problem.job(job).priority()))
                .sum::<u64>();
        }

        SolutionIndicators {
            priority_sum,
            assigned,
            cost: self.eval(problem).cost,
            used_vehicles: self.used_vehicles(),
        }
    }

    /// Every job appears exactly once, either routed or unassigned, and
    /// shipment legs share a route with the pickup first.
    pub fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool {
        let mut seen = vec![false; problem.number_of_jobs()];
        for &job in &self.unassigned {
            if std::mem::replace(&mut seen[job.get()], true) {
                return false;
            }
        }

        for route in &self.routes {
            for (rank, &job) in route.jobs().iter().enumerate() {
                if std::mem::replace(&mut seen[job.get()], true) {
                    return false;
                }

                if problem.job(job).is_pickup() {
                    let delivery = problem.delivery_of(job);
                    if !route.jobs()[rank + 1..].contains(&delivery) {
                        return false;
                    }
                }
            }
        }

        seen.into_iter().all(|seen| seen)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{job::JobIdx, vehicle::VehicleIdx},
        solver::solution::raw_route::RawRoute,
        test_utils::{self, TestJob},
    };

    use super::*;

    #[test]
    fn test_insert_shipment_around_existing_jobs() {
        let problem = test_utils::create_problem_with_jobs(
            vec![
                TestJob::delivery(1, 1),
                TestJob::delivery(2, 1),
                TestJob::shipment(3, 4, 2),
            ],
            vec![10],
            1,
        );

        let vehicle = VehicleIdx::new(0);
        let mut solution = WorkingSolution::<RawRoute>::new(&problem);
        solution.insert_job(&problem, vehicle, JobIdx::new(0), 0);
        solution.insert_job(&problem, vehicle, JobIdx::new(1), 1);
        solution.insert_shipment(&problem, vehicle, JobIdx::new(2), 1, 2);

        assert_eq!(
            solution.route(vehicle).jobs(),
            &[JobIdx::new(0), JobIdx::new(2), JobIdx::new(1), JobIdx::new(3)]
        );
        assert!(solution.unassigned().is_empty());
        assert!(solution.is_consistent(&problem));
    }

    #[test]
    fn test_indicators() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::delivery(1, 1), TestJob::delivery(2, 1)],
            vec![10],
            2,
        );

        let mut solution = WorkingSolution::<RawRoute>::new(&problem);
        solution.insert_job(&problem, VehicleIdx::new(1), JobIdx::new(1), 0);

        let indicators = solution.indicators(&problem);
        assert_eq!(indicators.assigned, 1);
        assert_eq!(indicators.used_vehicles, 1);
        // Depot to x = 2 and back.
        assert_eq!(solution.eval(&problem).duration, 400);
        assert_eq!(indicators.cost, solution.eval(&problem).cost);
    }
}
