use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, error::InputError};

use super::{
    amount::Amount,
    cost_wrapper::CostWrapper,
    eval::Eval,
    job::Job,
    location::LocationIdx,
    skill::Skill,
    time_window::{self, TimeWindow},
    units::{
        Cost, DEFAULT_PER_HOUR, Duration, UserCost, UserDuration, scale_from_user_cost,
        scale_from_user_duration, scale_to_user_duration,
    },
};

define_index_newtype!(VehicleIdx, Vehicle);

pub const DEFAULT_PROFILE: &str = "car";
pub const MAX_SPEED_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleCosts {
    pub fixed: UserCost,
    pub per_hour: UserCost,
}

impl Default for VehicleCosts {
    fn default() -> Self {
        Self {
            fixed: 0,
            per_hour: DEFAULT_PER_HOUR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VehicleBreak {
    id: u64,
    time_windows: Vec<TimeWindow>,
    service: Duration,
    description: String,
    max_load: Option<Amount>,
}

impl VehicleBreak {
    pub fn new(
        id: u64,
        time_windows: Vec<TimeWindow>,
        service: UserDuration,
        description: String,
        max_load: Option<Amount>,
    ) -> Result<Self, InputError> {
        let time_windows = if time_windows.is_empty() {
            vec![TimeWindow::default()]
        } else {
            time_windows
        };
        time_window::validate_time_windows(&time_windows, &format!("break {id}"))?;

        Ok(Self {
            id,
            time_windows,
            service: scale_from_user_duration(service),
            description,
            max_load,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn service(&self) -> Duration {
        self.service
    }

    pub fn user_service(&self) -> UserDuration {
        scale_to_user_duration(self.service)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn max_load(&self) -> Option<&Amount> {
        self.max_load.as_ref()
    }

    /// Whether the break can be taken while carrying `load`.
    pub fn is_valid_for_load(&self, load: &Amount) -> bool {
        self.max_load.as_ref().is_none_or(|max_load| load <= max_load)
    }

    pub fn earliest_start(&self, time: Duration) -> Option<Duration> {
        time_window::earliest_start(&self.time_windows, time)
    }

    pub fn last_end(&self) -> Duration {
        self.time_windows[self.time_windows.len() - 1].end()
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    id: u64,
    start: Option<LocationIdx>,
    end: Option<LocationIdx>,
    profile: String,
    capacity: Amount,
    skills: FxHashSet<Skill>,
    time_window: TimeWindow,
    breaks: Vec<VehicleBreak>,
    description: String,
    costs: VehicleCosts,
    cost_wrapper: CostWrapper,
    max_tasks: usize,
    max_travel_time: Option<Duration>,
}

impl Vehicle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn start(&self) -> Option<LocationIdx> {
        self.start
    }

    pub fn end(&self) -> Option<LocationIdx> {
        self.end
    }

    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }

    pub fn has_end(&self) -> bool {
        self.end.is_some()
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn breaks(&self) -> &[VehicleBreak] {
        &self.breaks
    }

    pub fn has_breaks(&self) -> bool {
        !self.breaks.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    /// Scaled cost paid once when the route is used.
    pub fn fixed_cost(&self) -> Cost {
        scale_from_user_cost(self.costs.fixed)
    }

    pub fn cost_wrapper(&self) -> &CostWrapper {
        &self.cost_wrapper
    }

    pub(crate) fn cost_wrapper_mut(&mut self) -> &mut CostWrapper {
        &mut self.cost_wrapper
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_travel_time(&self) -> Duration {
        self.max_travel_time.unwrap_or(Duration::MAX)
    }

    pub fn has_max_travel_time(&self) -> bool {
        self.max_travel_time.is_some()
    }

    pub fn ok_for_travel_time(&self, duration: Duration) -> bool {
        duration <= self.max_travel_time()
    }

    #[inline]
    pub fn duration(&self, from: LocationIdx, to: LocationIdx) -> Duration {
        self.cost_wrapper.duration(from, to)
    }

    #[inline]
    pub fn cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        self.cost_wrapper.cost(from, to)
    }

    #[inline]
    pub fn eval(&self, from: LocationIdx, to: LocationIdx) -> Eval {
        self.cost_wrapper.eval(from, to)
    }

    /// Travel eval between two optional locations, zero when either is missing.
    #[inline]
    pub fn eval_between(&self, from: Option<LocationIdx>, to: Option<LocationIdx>) -> Eval {
        match (from, to) {
            (Some(from), Some(to)) => self.eval(from, to),
            _ => Eval::ZERO,
        }
    }

    /// Job skills are a subset of the vehicle skills.
    pub fn has_skills_for(&self, job: &Job) -> bool {
        job.skills().is_subset(&self.skills)
    }

    pub fn fits_capacity(&self, job: &Job) -> bool {
        job.delivery() <= &self.capacity && job.pickup() <= &self.capacity
    }

    pub fn has_same_locations(&self, other: &Vehicle) -> bool {
        self.start == other.start && self.end == other.end
    }

    pub fn has_same_profile(&self, other: &Vehicle) -> bool {
        self.profile == other.profile
    }

    /// The empty route fits in the vehicle time window, breaks included.
    /// Requires bound matrices.
    pub(crate) fn check_empty_route(&self) -> Result<(), InputError> {
        let travel = self.eval_between(self.start, self.end).duration;
        if self.time_window.start() + travel > self.time_window.end() {
            return Err(InputError::UnreachableVehicleEnd(self.id));
        }

        let empty = Amount::with_dimensions(self.capacity.len());
        let mut time = self.time_window.start();
        for vehicle_break in &self.breaks {
            let start = vehicle_break
                .earliest_start(time)
                .filter(|_| vehicle_break.is_valid_for_load(&empty))
                .ok_or(InputError::InconsistentBreaks(self.id))?;
            time = start + vehicle_break.service();
        }

        if time + travel > self.time_window.end() {
            return Err(InputError::InconsistentBreaks(self.id));
        }

        Ok(())
    }

    pub(crate) fn set_capacity_size(&mut self, size: usize) {
        if self.capacity.is_empty() {
            self.capacity = Amount::with_dimensions(size);
        }
    }
}

pub struct VehicleBuilder {
    id: Option<u64>,
    start: Option<LocationIdx>,
    end: Option<LocationIdx>,
    profile: Option<String>,
    capacity: Option<Amount>,
    skills: Option<FxHashSet<Skill>>,
    time_window: Option<TimeWindow>,
    breaks: Vec<VehicleBreak>,
    description: Option<String>,
    costs: VehicleCosts,
    speed_factor: f64,
    max_tasks: Option<usize>,
    max_travel_time: Option<UserDuration>,
}

impl Default for VehicleBuilder {
    fn default() -> Self {
        Self {
            id: None,
            start: None,
            end: None,
            profile: None,
            capacity: None,
            skills: None,
            time_window: None,
            breaks: Vec::new(),
            description: None,
            costs: VehicleCosts::default(),
            speed_factor: 1.0,
            max_tasks: None,
            max_travel_time: None,
        }
    }
}

impl VehicleBuilder {
    pub fn set_id(&mut self, id: u64) -> &mut VehicleBuilder {
        self.id = Some(id);
        self
    }

    pub fn set_start_location(&mut self, location: usize) -> &mut VehicleBuilder {
        self.start = Some(LocationIdx::new(location));
        self
    }

    pub fn set_end_location(&mut self, location: usize) -> &mut VehicleBuilder {
        self.end = Some(LocationIdx::new(location));
        self
    }

    pub fn set_profile(&mut self, profile: String) -> &mut VehicleBuilder {
        self.profile = Some(profile);
        self
    }

    pub fn set_capacity(&mut self, capacity: Amount) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_skills(&mut self, skills: FxHashSet<Skill>) -> &mut VehicleBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut VehicleBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_breaks(&mut self, breaks: Vec<VehicleBreak>) -> &mut VehicleBuilder {
        self.breaks = breaks;
        self
    }

    pub fn set_description(&mut self, description: String) -> &mut VehicleBuilder {
        self.description = Some(description);
        self
    }

    pub fn set_costs(&mut self, costs: VehicleCosts) -> &mut VehicleBuilder {
        self.costs = costs;
        self
    }

    pub fn set_speed_factor(&mut self, speed_factor: f64) -> &mut VehicleBuilder {
        self.speed_factor = speed_factor;
        self
    }

    pub fn set_max_tasks(&mut self, max_tasks: usize) -> &mut VehicleBuilder {
        self.max_tasks = Some(max_tasks);
        self
    }

    pub fn set_max_travel_time(&mut self, max_travel_time: UserDuration) -> &mut VehicleBuilder {
        self.max_travel_time = Some(max_travel_time);
        self
    }

    pub fn build(self) -> Result<Vehicle, InputError> {
        let id = self.id.unwrap_or_default();

        if self.start.is_none() && self.end.is_none() {
            return Err(InputError::MissingStartAndEnd(id));
        }

        if !(self.speed_factor > 0.0 && self.speed_factor <= MAX_SPEED_FACTOR) {
            return Err(InputError::InvalidSpeedFactor {
                vehicle: id,
                speed_factor: self.speed_factor.to_string(),
            });
        }

        let capacity = self.capacity.unwrap_or_default();

        let mut break_ids = FxHashSet::default();
        for vehicle_break in &self.breaks {
            if !break_ids.insert(vehicle_break.id()) {
                return Err(InputError::DuplicateBreakId(vehicle_break.id()));
            }

            if let Some(max_load) = vehicle_break.max_load()
                && max_load.len() != capacity.len()
            {
                return Err(InputError::InconsistentBreakMaxLoad(vehicle_break.id()));
            }
        }

        Ok(Vehicle {
            id,
            start: self.start,
            end: self.end,
            profile: self.profile.unwrap_or_else(|| DEFAULT_PROFILE.to_owned()),
            capacity,
            skills: self.skills.unwrap_or_default(),
            time_window: self.time_window.unwrap_or_default(),
            breaks: self.breaks,
            description: self.description.unwrap_or_default(),
            cost_wrapper: CostWrapper::new(self.speed_factor, self.costs.per_hour),
            costs: self.costs,
            max_tasks: self.max_tasks.unwrap_or(usize::MAX),
            max_travel_time: self.max_travel_time.map(scale_from_user_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_start_and_end() {
        let mut builder = VehicleBuilder::default();
        builder.set_id(4);

        assert_eq!(
            builder.build().unwrap_err().to_string(),
            "No start or end specified for vehicle 4."
        );
    }

    #[test]
    fn test_duplicate_break_id() {
        let mut builder = VehicleBuilder::default();
        builder.set_id(1).set_start_location(0).set_breaks(vec![
            VehicleBreak::new(2, vec![], 0, String::new(), None).unwrap(),
            VehicleBreak::new(2, vec![], 0, String::new(), None).unwrap(),
        ]);

        assert_eq!(builder.build().unwrap_err(), InputError::DuplicateBreakId(2));
    }

    #[test]
    fn test_inconsistent_break_max_load() {
        let mut builder = VehicleBuilder::default();
        builder
            .set_id(1)
            .set_start_location(0)
            .set_capacity(Amount::from_vec(vec![10, 10]))
            .set_breaks(vec![
                VehicleBreak::new(
                    9,
                    vec![],
                    0,
                    String::new(),
                    Some(Amount::from_vec(vec![5])),
                )
                .unwrap(),
            ]);

        assert_eq!(
            builder.build().unwrap_err().to_string(),
            "Inconsistent break max_load size for break: 9."
        );
    }

    #[test]
    fn test_invalid_speed_factor() {
        let mut builder = VehicleBuilder::default();
        builder.set_id(1).set_end_location(0).set_speed_factor(5.5);

        assert!(matches!(
            builder.build(),
            Err(InputError::InvalidSpeedFactor { vehicle: 1, .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let mut builder = VehicleBuilder::default();
        builder.set_id(1).set_start_location(0);
        let vehicle = builder.build().unwrap();

        assert_eq!(vehicle.profile(), DEFAULT_PROFILE);
        assert!(vehicle.time_window().is_default());
        assert_eq!(vehicle.max_tasks(), usize::MAX);
        assert_eq!(vehicle.fixed_cost(), 0);
        assert!(!vehicle.has_max_travel_time());
    }
}
