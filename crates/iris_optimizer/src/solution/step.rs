use serde::Serialize;

use crate::problem::{
    amount::Amount,
    job::{Job, JobType},
    location::{Coordinates, LocationIdx},
    units::UserDuration,
    vehicle::VehicleBreak,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::violation::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Start,
    Job,
    Pickup,
    Delivery,
    Break,
    End,
}

impl From<JobType> for StepType {
    fn from(job_type: JobType) -> Self {
        match job_type {
            JobType::Single => StepType::Job,
            JobType::Pickup => StepType::Pickup,
            JobType::Delivery => StepType::Delivery,
        }
    }
}

/// One visit of a route in user units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Job or break id, none for the route start and end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_index: Option<LocationIdx>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    pub arrival: UserDuration,
    /// Travel time accumulated since the route start.
    pub duration: UserDuration,
    pub service: UserDuration,
    pub waiting_time: UserDuration,
    /// Load on board when leaving the step.
    pub load: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub violations: Vec<Violation>,
}

impl Step {
    fn new(step_type: StepType, arrival: UserDuration, duration: UserDuration, load: Amount) -> Self {
        Step {
            step_type,
            id: None,
            location_index: None,
            location: None,
            arrival,
            duration,
            service: 0,
            waiting_time: 0,
            load,
            distance: None,
            description: String::new(),
            violations: Vec::new(),
        }
    }

    fn at(mut self, problem: &VehicleRoutingProblem, location: LocationIdx) -> Self {
        self.location_index = Some(location);
        self.location = problem.location(location).coordinates();
        self
    }

    pub(crate) fn start(
        problem: &VehicleRoutingProblem,
        location: LocationIdx,
        arrival: UserDuration,
        load: Amount,
    ) -> Self {
        Step::new(StepType::Start, arrival, 0, load).at(problem, location)
    }

    pub(crate) fn end(
        problem: &VehicleRoutingProblem,
        location: LocationIdx,
        arrival: UserDuration,
        duration: UserDuration,
        load: Amount,
    ) -> Self {
        Step::new(StepType::End, arrival, duration, load).at(problem, location)
    }

    pub(crate) fn job(
        problem: &VehicleRoutingProblem,
        job: &Job,
        arrival: UserDuration,
        duration: UserDuration,
        waiting_time: UserDuration,
        load: Amount,
    ) -> Self {
        let mut step =
            Step::new(job.job_type().into(), arrival, duration, load).at(problem, job.location());
        step.id = Some(job.id());
        step.service = job.user_service();
        step.waiting_time = waiting_time;
        step.description = job.description().to_owned();
        step
    }

    pub(crate) fn vehicle_break(
        vehicle_break: &VehicleBreak,
        arrival: UserDuration,
        duration: UserDuration,
        waiting_time: UserDuration,
        load: Amount,
    ) -> Self {
        let mut step = Step::new(StepType::Break, arrival, duration, load);
        step.id = Some(vehicle_break.id());
        step.service = vehicle_break.user_service();
        step.waiting_time = waiting_time;
        step.description = vehicle_break.description().to_owned();
        step
    }

    /// Service start in user units.
    pub fn service_start(&self) -> UserDuration {
        self.arrival + self.waiting_time
    }
}
