use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::InputError;

use super::{
    amount::Amount,
    job::{Job, JobIdx, JobType},
    location::{Location, LocationIdx},
    matrix::Matrix,
    units::{UserCost, UserDuration},
    vehicle::{Vehicle, VehicleIdx},
};

/// Immutable problem definition: jobs, vehicles and bound travel matrices.
#[derive(Debug)]
pub struct VehicleRoutingProblem {
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    amount_size: usize,
    zero_amount: Amount,
    has_time_windows: bool,
    has_shipments: bool,
    homogeneous: bool,
    vehicle_ok_with_job: Vec<Vec<bool>>,
    vehicle_ok_with_vehicle: Vec<Vec<bool>>,
}

impl VehicleRoutingProblem {
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, index: LocationIdx) -> &Location {
        &self.locations[index]
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    #[inline]
    pub fn job(&self, index: JobIdx) -> &Job {
        &self.jobs[index]
    }

    #[inline]
    pub fn job_location(&self, index: JobIdx) -> LocationIdx {
        self.jobs[index].location()
    }

    pub fn number_of_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    #[inline]
    pub fn vehicle(&self, index: VehicleIdx) -> &Vehicle {
        &self.vehicles[index]
    }

    pub fn number_of_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn amount_size(&self) -> usize {
        self.amount_size
    }

    pub fn zero_amount(&self) -> &Amount {
        &self.zero_amount
    }

    /// Jobs or vehicles carry a non-default time window, or vehicles have breaks.
    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }

    pub fn has_shipments(&self) -> bool {
        self.has_shipments
    }

    /// Same start, end, profile, cost factors and fixed cost for every vehicle.
    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous
    }

    /// Skills and capacity allow `vehicle` to serve `job`.
    #[inline]
    pub fn vehicle_ok_with_job(&self, vehicle: VehicleIdx, job: JobIdx) -> bool {
        self.vehicle_ok_with_job[vehicle.get()][job.get()]
    }

    /// Both vehicles can serve at least one common job.
    #[inline]
    pub fn vehicle_ok_with_vehicle(&self, first: VehicleIdx, second: VehicleIdx) -> bool {
        self.vehicle_ok_with_vehicle[first.get()][second.get()]
    }

    /// Delivery leg of the shipment picked up at `pickup`.
    #[inline]
    pub fn delivery_of(&self, pickup: JobIdx) -> JobIdx {
        debug_assert!(self.job(pickup).is_pickup());
        JobIdx::new(pickup.get() + 1)
    }

    /// Pickup leg of the shipment delivered at `delivery`.
    #[inline]
    pub fn pickup_of(&self, delivery: JobIdx) -> JobIdx {
        debug_assert!(self.job(delivery).is_delivery());
        JobIdx::new(delivery.get() - 1)
    }

    pub fn total_priority(&self) -> u64 {
        self.jobs.iter().map(|job| u64::from(job.priority())).sum()
    }
}

#[derive(Default, Debug)]
pub struct VehicleRoutingProblemBuilder {
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    durations: FxHashMap<String, Matrix<UserDuration>>,
    costs: FxHashMap<String, Matrix<UserCost>>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut Self {
        self.locations = locations;
        self
    }

    pub fn add_job(&mut self, job: Job) -> &mut Self {
        self.jobs.push(job);
        self
    }

    pub fn set_jobs(&mut self, jobs: Vec<Job>) -> &mut Self {
        self.jobs = jobs;
        self
    }

    /// Appends both legs, keeping the delivery right after its pickup.
    pub fn add_shipment(&mut self, (pickup, delivery): (Job, Job)) -> &mut Self {
        self.jobs.push(pickup);
        self.jobs.push(delivery);
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> &mut Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut Self {
        self.vehicles = vehicles;
        self
    }

    pub fn set_durations_matrix(
        &mut self,
        profile: impl Into<String>,
        matrix: Matrix<UserDuration>,
    ) -> &mut Self {
        self.durations.insert(profile.into(), matrix);
        self
    }

    pub fn set_costs_matrix(
        &mut self,
        profile: impl Into<String>,
        matrix: Matrix<UserCost>,
    ) -> &mut Self {
        self.costs.insert(profile.into(), matrix);
        self
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Vehicle profiles without a duration matrix, sorted.
    pub fn profiles_without_matrix(&self) -> Vec<String> {
        let mut profiles = self
            .vehicles
            .iter()
            .map(|vehicle| vehicle.profile().to_owned())
            .filter(|profile| !self.durations.contains_key(profile))
            .collect::<Vec<_>>();
        profiles.sort();
        profiles.dedup();
        profiles
    }

    pub fn build(mut self) -> Result<VehicleRoutingProblem, InputError> {
        check_unique_ids(&self.jobs, &self.vehicles)?;
        check_shipments(&self.jobs)?;

        let amount_size = self.amount_size()?;
        for job in &mut self.jobs {
            job.set_amounts_size(amount_size);
        }
        for vehicle in &mut self.vehicles {
            vehicle.set_capacity_size(amount_size);
        }

        self.bind_matrices()?;
        for vehicle in &self.vehicles {
            vehicle.check_empty_route()?;
        }

        let max_location = self
            .jobs
            .iter()
            .map(Job::location)
            .chain(self.vehicles.iter().flat_map(|v| v.start().into_iter().chain(v.end())))
            .map(|location| location.get() + 1)
            .max()
            .unwrap_or(0);
        while self.locations.len() < max_location {
            self.locations
                .push(Location::from_index(self.locations.len()));
        }

        let vehicle_ok_with_job = self
            .vehicles
            .iter()
            .map(|vehicle| {
                self.jobs
                    .iter()
                    .map(|job| vehicle.has_skills_for(job) && vehicle.fits_capacity(job))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let vehicle_ok_with_vehicle = vehicle_ok_with_job
            .iter()
            .map(|first| {
                vehicle_ok_with_job
                    .iter()
                    .map(|second| first.iter().zip(second).any(|(&a, &b)| a && b))
                    .collect()
            })
            .collect();

        let has_time_windows = self.jobs.iter().any(|job| !job.has_default_time_window())
            || self
                .vehicles
                .iter()
                .any(|vehicle| !vehicle.time_window().is_default() || vehicle.has_breaks());

        let homogeneous = self.vehicles.windows(2).all(|pair| {
            pair[0].has_same_locations(&pair[1])
                && pair[0].has_same_profile(&pair[1])
                && pair[0].cost_wrapper().is_equivalent(pair[1].cost_wrapper())
                && pair[0].fixed_cost() == pair[1].fixed_cost()
        });

        let has_shipments = self.jobs.iter().any(|job| !job.is_single());

        debug!(
            jobs = self.jobs.len(),
            vehicles = self.vehicles.len(),
            amount_size,
            has_time_windows,
            homogeneous,
            "problem built"
        );

        Ok(VehicleRoutingProblem {
            locations: self.locations,
            jobs: self.jobs,
            vehicles: self.vehicles,
            amount_size,
            zero_amount: Amount::with_dimensions(amount_size),
            has_time_windows,
            has_shipments,
            homogeneous,
            vehicle_ok_with_job,
            vehicle_ok_with_vehicle,
        })
    }

    fn amount_size(&self) -> Result<usize, InputError> {
        let sizes = self
            .vehicles
            .iter()
            .map(|vehicle| vehicle.capacity().len())
            .chain(
                self.jobs
                    .iter()
                    .flat_map(|job| [job.delivery().len(), job.pickup().len()]),
            )
            .filter(|&size| size > 0);

        let mut expected = None;
        for size in sizes {
            match expected {
                None => expected = Some(size),
                Some(expected) if expected != size => {
                    return Err(InputError::AmountSizeMismatch {
                        expected,
                        found: size,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(expected.unwrap_or(0))
    }

    fn bind_matrices(&mut self) -> Result<(), InputError> {
        let durations = std::mem::take(&mut self.durations)
            .into_iter()
            .map(|(profile, matrix)| (profile, Arc::new(matrix)))
            .collect::<FxHashMap<_, _>>();
        let costs = std::mem::take(&mut self.costs)
            .into_iter()
            .map(|(profile, matrix)| (profile, Arc::new(matrix)))
            .collect::<FxHashMap<_, _>>();

        for vehicle in &mut self.vehicles {
            let matrix = durations
                .get(vehicle.profile())
                .ok_or_else(|| InputError::MissingMatrix(vehicle.profile().to_owned()))?;

            for location in vehicle.start().into_iter().chain(vehicle.end()) {
                check_location(location, matrix.size())?;
            }

            let cost_matrix = costs.get(vehicle.profile()).cloned();
            if let Some(cost_matrix) = &cost_matrix
                && cost_matrix.size() != matrix.size()
            {
                return Err(InputError::MatrixNotSquare(vehicle.profile().to_owned()));
            }

            let wrapper = vehicle.cost_wrapper_mut();
            wrapper.set_durations_matrix(Arc::clone(matrix));
            if let Some(cost_matrix) = cost_matrix {
                wrapper.set_costs_matrix(cost_matrix);
            }
        }

        let min_size = self
            .vehicles
            .iter()
            .filter_map(|vehicle| durations.get(vehicle.profile()))
            .map(|matrix| matrix.size())
            .min()
            .unwrap_or(0);
        for job in &self.jobs {
            check_location(job.location(), min_size)?;
        }

        Ok(())
    }
}

fn check_location(location: LocationIdx, size: usize) -> Result<(), InputError> {
    if location.get() >= size {
        return Err(InputError::UnknownLocationIndex {
            index: location.get(),
            size,
        });
    }

    Ok(())
}

fn check_unique_ids(jobs: &[Job], vehicles: &[Vehicle]) -> Result<(), InputError> {
    let mut job_ids = FxHashSet::default();
    for job in jobs {
        if !job_ids.insert((job.job_type(), job.id())) {
            return Err(InputError::DuplicateJobId(job.id()));
        }
    }

    let mut vehicle_ids = FxHashSet::default();
    for vehicle in vehicles {
        if !vehicle_ids.insert(vehicle.id()) {
            return Err(InputError::DuplicateVehicleId(vehicle.id()));
        }
    }

    Ok(())
}

fn check_shipments(jobs: &[Job]) -> Result<(), InputError> {
    let mut index = 0;
    while index < jobs.len() {
        match jobs[index].job_type() {
            JobType::Single => index += 1,
            JobType::Pickup => {
                if jobs.get(index + 1).map(Job::job_type) != Some(JobType::Delivery) {
                    return Err(InputError::MalformedShipment(format!(
                        "pickup {} is not followed by its delivery",
                        jobs[index].id()
                    )));
                }
                index += 2;
            }
            JobType::Delivery => {
                return Err(InputError::MalformedShipment(format!(
                    "delivery {} has no pickup",
                    jobs[index].id()
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::problem::{
        amount::Amount,
        job::JobBuilder,
        time_window::TimeWindow,
        vehicle::{VehicleBreak, VehicleBuilder},
    };

    use super::*;

    fn job(id: u64, location: usize, delivery: Vec<i64>) -> Job {
        let mut builder = JobBuilder::default();
        builder
            .set_id(id)
            .set_location(location)
            .set_delivery(Amount::from_vec(delivery));
        builder.build().unwrap()
    }

    fn vehicle(id: u64, capacity: Vec<i64>) -> Vehicle {
        let mut builder = VehicleBuilder::default();
        builder
            .set_id(id)
            .set_start_location(0)
            .set_end_location(0)
            .set_capacity(Amount::from_vec(capacity));
        builder.build().unwrap()
    }

    fn matrix() -> Matrix<UserDuration> {
        Matrix::from_rows(vec![vec![0, 1, 2], vec![1, 0, 1], vec![2, 1, 0]])
    }

    #[test]
    fn test_build_problem() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_job(job(1, 1, vec![3]))
            .add_job(job(2, 2, vec![20]))
            .add_vehicle(vehicle(1, vec![10]))
            .set_durations_matrix("car", matrix());
        let problem = builder.build().unwrap();

        assert_eq!(problem.amount_size(), 1);
        assert_eq!(problem.locations().len(), 3);
        assert!(!problem.has_time_windows());
        assert!(problem.is_homogeneous());
        assert!(problem.vehicle_ok_with_job(VehicleIdx::new(0), JobIdx::new(0)));
        assert!(!problem.vehicle_ok_with_job(VehicleIdx::new(0), JobIdx::new(1)));
        assert_eq!(problem.job(JobIdx::new(0)).pickup(), &Amount::from_vec(vec![0]));
    }

    #[test]
    fn test_amount_size_mismatch() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_job(job(1, 1, vec![3, 1]))
            .add_vehicle(vehicle(1, vec![10]))
            .set_durations_matrix("car", matrix());

        assert_eq!(
            builder.build().unwrap_err(),
            InputError::AmountSizeMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_missing_matrix() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_vehicle(vehicle(1, vec![10]));

        assert_eq!(builder.profiles_without_matrix(), vec!["car".to_owned()]);
        assert_eq!(
            builder.build().unwrap_err(),
            InputError::MissingMatrix("car".into())
        );
    }

    #[test]
    fn test_unknown_location() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_job(job(1, 5, vec![1]))
            .add_vehicle(vehicle(1, vec![10]))
            .set_durations_matrix("car", matrix());

        assert_eq!(
            builder.build().unwrap_err(),
            InputError::UnknownLocationIndex { index: 5, size: 3 }
        );
    }

    fn vehicle_with_break(time_window: (u32, u32), break_window: (u32, u32)) -> Vehicle {
        let mut builder = VehicleBuilder::default();
        builder
            .set_id(7)
            .set_start_location(0)
            .set_end_location(2)
            .set_time_window(TimeWindow::new(time_window.0, time_window.1).unwrap())
            .set_breaks(vec![
                VehicleBreak::new(
                    1,
                    vec![TimeWindow::new(break_window.0, break_window.1).unwrap()],
                    10,
                    String::new(),
                    None,
                )
                .unwrap(),
            ]);
        builder.build().unwrap()
    }

    #[test]
    fn test_break_outside_vehicle_time_window() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_job(job(1, 1, vec![]))
            .add_vehicle(vehicle_with_break((0, 100), (500, 600)))
            .set_durations_matrix("car", matrix());

        assert_eq!(builder.build().unwrap_err(), InputError::InconsistentBreaks(7));
    }

    #[test]
    fn test_break_leaves_no_time_to_reach_end() {
        // Break over [85, 95], the end is reached at 97.
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_vehicle(vehicle_with_break((0, 96), (85, 90)))
            .set_durations_matrix("car", matrix());

        assert_eq!(builder.build().unwrap_err(), InputError::InconsistentBreaks(7));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_vehicle(vehicle_with_break((0, 100), (85, 90)))
            .set_durations_matrix("car", matrix());
        assert!(builder.build().unwrap().has_time_windows());
    }

    #[test]
    fn test_vehicle_end_out_of_reach() {
        let mut vehicle = VehicleBuilder::default();
        vehicle
            .set_id(3)
            .set_start_location(0)
            .set_end_location(2)
            .set_time_window(TimeWindow::new(10, 11).unwrap());

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_vehicle(vehicle.build().unwrap())
            .set_durations_matrix("car", matrix());

        assert_eq!(
            builder.build().unwrap_err(),
            InputError::UnreachableVehicleEnd(3)
        );
    }

    #[test]
    fn test_duplicate_job_id() {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_job(job(1, 1, vec![1]))
            .add_job(job(1, 2, vec![1]))
            .add_vehicle(vehicle(1, vec![10]))
            .set_durations_matrix("car", matrix());

        assert_eq!(builder.build().unwrap_err(), InputError::DuplicateJobId(1));
    }
}
