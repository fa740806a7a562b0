use fxhash::FxHashSet;
use serde::Serialize;

use crate::{define_index_newtype, error::InputError};

use super::{
    amount::Amount,
    location::LocationIdx,
    skill::Skill,
    time_window::{self, TimeWindow},
    units::{Duration, UserDuration, scale_from_user_duration, scale_to_user_duration},
};

define_index_newtype!(JobIdx, Job);

pub const MAX_PRIORITY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Single,
    Pickup,
    Delivery,
}

/// A task to serve: a single job or one leg of a shipment.
///
/// Shipment legs are stored consecutively, the pickup at index `i` and its
/// delivery at index `i + 1`.
#[derive(Debug, Clone)]
pub struct Job {
    id: u64,
    job_type: JobType,
    location: LocationIdx,
    service: Duration,
    delivery: Amount,
    pickup: Amount,
    skills: FxHashSet<Skill>,
    priority: u32,
    time_windows: Vec<TimeWindow>,
    description: String,
}

impl Job {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn is_single(&self) -> bool {
        self.job_type == JobType::Single
    }

    pub fn is_pickup(&self) -> bool {
        self.job_type == JobType::Pickup
    }

    pub fn is_delivery(&self) -> bool {
        self.job_type == JobType::Delivery
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }

    pub fn service(&self) -> Duration {
        self.service
    }

    pub fn user_service(&self) -> UserDuration {
        scale_to_user_duration(self.service)
    }

    /// Amount unloaded at this job.
    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    /// Amount loaded at this job.
    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn has_default_time_window(&self) -> bool {
        self.time_windows.len() == 1 && self.time_windows[0].is_default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Earliest service start at or after `time`, if any window allows it.
    pub fn earliest_start(&self, time: Duration) -> Option<Duration> {
        time_window::earliest_start(&self.time_windows, time)
    }

    /// Latest service start at or before `time`, if any window allows it.
    pub fn latest_start(&self, time: Duration) -> Option<Duration> {
        time_window::latest_start(&self.time_windows, time)
    }

    /// Start of the first window.
    pub fn first_start(&self) -> Duration {
        self.time_windows[0].start()
    }

    /// End of the last window.
    pub fn last_end(&self) -> Duration {
        self.time_windows[self.time_windows.len() - 1].end()
    }

    pub(crate) fn set_amounts_size(&mut self, size: usize) {
        if self.delivery.is_empty() {
            self.delivery = Amount::with_dimensions(size);
        }
        if self.pickup.is_empty() {
            self.pickup = Amount::with_dimensions(size);
        }
    }
}

#[derive(Default)]
pub struct JobBuilder {
    id: Option<u64>,
    location: Option<LocationIdx>,
    service: Option<UserDuration>,
    delivery: Option<Amount>,
    pickup: Option<Amount>,
    skills: Option<FxHashSet<Skill>>,
    priority: Option<u32>,
    time_windows: Option<Vec<TimeWindow>>,
    description: Option<String>,
}

impl JobBuilder {
    pub fn set_id(&mut self, id: u64) -> &mut JobBuilder {
        self.id = Some(id);
        self
    }

    pub fn set_location(&mut self, location: usize) -> &mut JobBuilder {
        self.location = Some(LocationIdx::new(location));
        self
    }

    pub fn set_service(&mut self, service: UserDuration) -> &mut JobBuilder {
        self.service = Some(service);
        self
    }

    pub fn set_delivery(&mut self, delivery: Amount) -> &mut JobBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_pickup(&mut self, pickup: Amount) -> &mut JobBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_skills(&mut self, skills: FxHashSet<Skill>) -> &mut JobBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn set_priority(&mut self, priority: u32) -> &mut JobBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_time_windows(&mut self, time_windows: Vec<TimeWindow>) -> &mut JobBuilder {
        self.time_windows = Some(time_windows);
        self
    }

    pub fn set_description(&mut self, description: String) -> &mut JobBuilder {
        self.description = Some(description);
        self
    }

    pub fn build(self) -> Result<Job, InputError> {
        let id = self.id.unwrap_or_default();
        let location = self
            .location
            .ok_or_else(|| InputError::MissingLocation(format!("job {id}")))?;

        build_job(JobParts {
            id,
            job_type: JobType::Single,
            location,
            service: self.service.unwrap_or(0),
            delivery: self.delivery.unwrap_or_default(),
            pickup: self.pickup.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            priority: self.priority.unwrap_or(0),
            time_windows: self.time_windows.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// One side of a shipment.
#[derive(Debug, Clone, Default)]
pub struct ShipmentStep {
    pub id: u64,
    pub location: usize,
    pub service: UserDuration,
    pub time_windows: Vec<TimeWindow>,
    pub description: String,
}

#[derive(Default)]
pub struct ShipmentBuilder {
    pickup: Option<ShipmentStep>,
    delivery: Option<ShipmentStep>,
    amount: Option<Amount>,
    skills: Option<FxHashSet<Skill>>,
    priority: Option<u32>,
}

impl ShipmentBuilder {
    pub fn set_pickup(&mut self, pickup: ShipmentStep) -> &mut ShipmentBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_delivery(&mut self, delivery: ShipmentStep) -> &mut ShipmentBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_amount(&mut self, amount: Amount) -> &mut ShipmentBuilder {
        self.amount = Some(amount);
        self
    }

    pub fn set_skills(&mut self, skills: FxHashSet<Skill>) -> &mut ShipmentBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn set_priority(&mut self, priority: u32) -> &mut ShipmentBuilder {
        self.priority = Some(priority);
        self
    }

    /// Builds the pickup and delivery legs, in that order.
    pub fn build(self) -> Result<(Job, Job), InputError> {
        let pickup = self
            .pickup
            .ok_or_else(|| InputError::MalformedShipment("missing pickup".into()))?;
        let delivery = self
            .delivery
            .ok_or_else(|| InputError::MalformedShipment("missing delivery".into()))?;
        let amount = self.amount.unwrap_or_default();
        let skills = self.skills.unwrap_or_default();
        let priority = self.priority.unwrap_or(0);

        let pickup_job = build_job(JobParts {
            id: pickup.id,
            job_type: JobType::Pickup,
            location: LocationIdx::new(pickup.location),
            service: pickup.service,
            delivery: Amount::with_dimensions(amount.len()),
            pickup: amount.clone(),
            skills: skills.clone(),
            priority,
            time_windows: pickup.time_windows,
            description: pickup.description,
        })?;

        let delivery_job = build_job(JobParts {
            id: delivery.id,
            job_type: JobType::Delivery,
            location: LocationIdx::new(delivery.location),
            service: delivery.service,
            delivery: amount.clone(),
            pickup: Amount::with_dimensions(amount.len()),
            skills,
            priority,
            time_windows: delivery.time_windows,
            description: delivery.description,
        })?;

        Ok((pickup_job, delivery_job))
    }
}

struct JobParts {
    id: u64,
    job_type: JobType,
    location: LocationIdx,
    service: UserDuration,
    delivery: Amount,
    pickup: Amount,
    skills: FxHashSet<Skill>,
    priority: u32,
    time_windows: Vec<TimeWindow>,
    description: String,
}

fn build_job(parts: JobParts) -> Result<Job, InputError> {
    if parts.priority > MAX_PRIORITY {
        return Err(InputError::InvalidPriority {
            job: parts.id,
            priority: parts.priority,
        });
    }

    if !parts.delivery.is_empty()
        && !parts.pickup.is_empty()
        && parts.delivery.len() != parts.pickup.len()
    {
        return Err(InputError::AmountSizeMismatch {
            expected: parts.delivery.len(),
            found: parts.pickup.len(),
        });
    }

    let time_windows = if parts.time_windows.is_empty() {
        vec![TimeWindow::default()]
    } else {
        parts.time_windows
    };
    time_window::validate_time_windows(&time_windows, &format!("job {}", parts.id))?;

    Ok(Job {
        id: parts.id,
        job_type: parts.job_type,
        location: parts.location,
        service: scale_from_user_duration(parts.service),
        delivery: parts.delivery,
        pickup: parts.pickup,
        skills: parts.skills,
        priority: parts.priority,
        time_windows,
        description: parts.description,
    })
}
