use crate::problem::{
    amount::Amount,
    job::JobIdx,
    location::LocationIdx,
    vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::schedule::{RouteSchedule, ScheduledStep, ScheduledTask};

/// Ordered jobs of one vehicle with their load profile.
///
/// `loads[i]` is the load on board when arriving at rank `i`, `loads[len]`
/// the load when arriving at the vehicle end. Single-job deliveries are
/// loaded at the start, pickups are carried to the end.
#[derive(Debug, Clone)]
pub struct RawRoute {
    vehicle_id: VehicleIdx,
    jobs: Vec<JobIdx>,
    loads: Vec<Amount>,
    fwd_peaks: Vec<Amount>,
    bwd_peaks: Vec<Amount>,
    // Single-job amounts over ranks [0, i).
    fwd_deliveries: Vec<Amount>,
    fwd_pickups: Vec<Amount>,
    // Shipment legs over ranks [0, i).
    fwd_shipment_legs: Vec<usize>,
    // Shipments picked up and not yet delivered when arriving at rank i.
    open_shipments: Vec<usize>,
}

impl RawRoute {
    pub fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let mut route = Self {
            vehicle_id,
            jobs: Vec::new(),
            loads: Vec::new(),
            fwd_peaks: Vec::new(),
            bwd_peaks: Vec::new(),
            fwd_deliveries: Vec::new(),
            fwd_pickups: Vec::new(),
            fwd_shipment_legs: Vec::new(),
            open_shipments: Vec::new(),
        };
        route.update_amounts(problem);
        route
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn jobs(&self) -> &[JobIdx] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn load_at(&self, rank: usize) -> &Amount {
        &self.loads[rank]
    }

    /// Component-wise max of the loads arriving at ranks `[0, rank]`.
    pub fn fwd_peak(&self, rank: usize) -> &Amount {
        &self.fwd_peaks[rank]
    }

    /// Component-wise max of the loads arriving at ranks `[rank, len]`.
    pub fn bwd_peak(&self, rank: usize) -> &Amount {
        &self.bwd_peaks[rank]
    }

    pub fn max_load(&self) -> &Amount {
        &self.bwd_peaks[0]
    }

    /// Single-job deliveries over ranks `[first, last)`.
    pub fn delivery_in_range(&self, first: usize, last: usize) -> Amount {
        &self.fwd_deliveries[last] - &self.fwd_deliveries[first]
    }

    /// Single-job pickups over ranks `[first, last)`.
    pub fn pickup_in_range(&self, first: usize, last: usize) -> Amount {
        &self.fwd_pickups[last] - &self.fwd_pickups[first]
    }

    pub fn has_shipment_legs_in_range(&self, first: usize, last: usize) -> bool {
        self.fwd_shipment_legs[last] != self.fwd_shipment_legs[first]
    }

    /// No shipment is split when cutting the route before `rank`.
    pub fn is_shipment_free_cut(&self, rank: usize) -> bool {
        self.open_shipments[rank] == 0
    }

    /// Location visited right before `rank`, the vehicle start for rank 0.
    #[inline]
    pub fn location_before(&self, problem: &VehicleRoutingProblem, rank: usize) -> Option<LocationIdx> {
        if rank == 0 {
            problem.vehicle(self.vehicle_id).start()
        } else {
            Some(problem.job_location(self.jobs[rank - 1]))
        }
    }

    /// Location visited at `rank`, the vehicle end past the last job.
    #[inline]
    pub fn location_at(&self, problem: &VehicleRoutingProblem, rank: usize) -> Option<LocationIdx> {
        if rank == self.jobs.len() {
            problem.vehicle(self.vehicle_id).end()
        } else {
            Some(problem.job_location(self.jobs[rank]))
        }
    }

    /// Capacity check for inserting one job with the given amounts before `rank`.
    pub fn is_valid_addition_for_capacity(
        &self,
        problem: &VehicleRoutingProblem,
        pickup: &Amount,
        delivery: &Amount,
        rank: usize,
    ) -> bool {
        let capacity = problem.vehicle(self.vehicle_id).capacity();

        &self.fwd_peaks[rank] + delivery <= *capacity
            && &self.bwd_peaks[rank] + pickup <= *capacity
    }

    /// Capacity check for replacing ranks `[first, last)` with `jobs`.
    ///
    /// Shipments in `jobs` must either be complete or already cross the
    /// replaced range in this route.
    pub fn is_valid_replacement_for_capacity(
        &self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) -> bool {
        let capacity = problem.vehicle(self.vehicle_id).capacity();

        let mut added_delivery = problem.zero_amount().clone();
        let mut added_pickup = problem.zero_amount().clone();
        for &job_idx in jobs {
            let job = problem.job(job_idx);
            if job.is_single() {
                added_delivery += job.delivery();
                added_pickup += job.pickup();
            }
        }

        let delivery_delta = &added_delivery - &self.delivery_in_range(first, last);
        if !(&self.fwd_peaks[first] + &delivery_delta <= *capacity) {
            return false;
        }

        let mut load = &self.loads[first] + &delivery_delta;
        for &job_idx in jobs {
            let job = problem.job(job_idx);
            load -= job.delivery();
            load += job.pickup();
            if !(load <= *capacity) {
                return false;
            }
        }

        let pickup_delta = &added_pickup - &self.pickup_in_range(first, last);
        &self.bwd_peaks[last] + &pickup_delta <= *capacity
    }

    pub fn replace(
        &mut self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) {
        self.jobs.splice(first..last, jobs.iter().copied());
        self.update_amounts(problem);
    }

    /// Loads and peaks match a rebuild of the same sequence.
    pub fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool {
        let mut rebuilt = RawRoute::new(problem, self.vehicle_id);
        rebuilt.replace(problem, &self.jobs, 0, 0);

        rebuilt.loads == self.loads
            && rebuilt.fwd_peaks == self.fwd_peaks
            && rebuilt.bwd_peaks == self.bwd_peaks
    }

    fn update_amounts(&mut self, problem: &VehicleRoutingProblem) {
        let zero = problem.zero_amount();
        let len = self.jobs.len();

        self.fwd_deliveries.clear();
        self.fwd_pickups.clear();
        self.fwd_shipment_legs.clear();
        self.open_shipments.clear();
        self.fwd_deliveries.push(zero.clone());
        self.fwd_pickups.push(zero.clone());
        self.fwd_shipment_legs.push(0);
        self.open_shipments.push(0);

        for (rank, &job_idx) in self.jobs.iter().enumerate() {
            let job = problem.job(job_idx);
            let mut deliveries = self.fwd_deliveries[rank].clone();
            let mut pickups = self.fwd_pickups[rank].clone();
            let mut legs = self.fwd_shipment_legs[rank];
            let mut open = self.open_shipments[rank];

            if job.is_single() {
                deliveries += job.delivery();
                pickups += job.pickup();
            } else {
                legs += 1;
                if job.is_pickup() {
                    open += 1;
                } else {
                    open -= 1;
                }
            }

            self.fwd_deliveries.push(deliveries);
            self.fwd_pickups.push(pickups);
            self.fwd_shipment_legs.push(legs);
            self.open_shipments.push(open);
        }

        self.loads.clear();
        self.loads.push(self.fwd_deliveries[len].clone());
        for (rank, &job_idx) in self.jobs.iter().enumerate() {
            let job = problem.job(job_idx);
            let mut load = self.loads[rank].clone();
            load -= job.delivery();
            load += job.pickup();
            self.loads.push(load);
        }

        self.fwd_peaks.clear();
        let mut peak = self.loads[0].clone();
        for load in &self.loads {
            peak.update_max(load);
            self.fwd_peaks.push(peak.clone());
        }

        self.bwd_peaks.clear();
        self.bwd_peaks.resize(len + 1, zero.clone());
        let mut peak = self.loads[len].clone();
        for rank in (0..=len).rev() {
            peak.update_max(&self.loads[rank]);
            self.bwd_peaks[rank] = peak.clone();
        }
    }

    /// Schedule without waiting: the vehicle leaves at its time window start.
    pub fn schedule(&self, problem: &VehicleRoutingProblem) -> RouteSchedule {
        let vehicle = problem.vehicle(self.vehicle_id);
        let start = vehicle.time_window().start();

        let mut time = start;
        let mut location = vehicle.start();
        let mut steps = Vec::with_capacity(self.jobs.len());

        for (rank, &job_idx) in self.jobs.iter().enumerate() {
            let job = problem.job(job_idx);
            time += vehicle.eval_between(location, Some(job.location())).duration;
            steps.push(ScheduledStep {
                task: ScheduledTask::Job(job_idx),
                arrival: time,
                service_start: time,
                load: self.loads[rank].clone(),
            });
            time += job.service();
            location = Some(job.location());
        }

        time += vehicle.eval_between(location, vehicle.end()).duration;

        RouteSchedule {
            start,
            start_load: self.loads[0].clone(),
            steps,
            end: time,
            end_load: self.loads[self.jobs.len()].clone(),
        }
    }
}
