use crate::problem::{amount::Amount, job::JobIdx, units::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    Job(JobIdx),
    /// Index in the vehicle breaks.
    Break(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStep {
    pub task: ScheduledTask,
    pub arrival: Duration,
    pub service_start: Duration,
    /// Load on board when arriving.
    pub load: Amount,
}

impl ScheduledStep {
    pub fn waiting_time(&self) -> Duration {
        self.service_start - self.arrival
    }
}

/// Timed sequence of a route, from vehicle start to vehicle end.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSchedule {
    pub start: Duration,
    pub start_load: Amount,
    pub steps: Vec<ScheduledStep>,
    pub end: Duration,
    pub end_load: Amount,
}
