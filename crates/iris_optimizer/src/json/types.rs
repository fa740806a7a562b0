use fxhash::FxHashMap;
use serde::Deserialize;

use crate::problem::{
    skill::Skill,
    units::{UserCost, UserDuration},
};

/// Problem description in the usual VRP solver JSON layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonProblem {
    #[serde(default)]
    pub vehicles: Vec<JsonVehicle>,
    #[serde(default)]
    pub jobs: Vec<JsonJob>,
    #[serde(default)]
    pub shipments: Vec<JsonShipment>,
    /// Per routing profile.
    #[serde(default)]
    pub matrices: FxHashMap<String, JsonMatrices>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonMatrices {
    pub durations: Vec<Vec<UserDuration>>,
    pub costs: Option<Vec<Vec<UserCost>>>,
}

/// `[start, end]` in seconds.
pub type JsonTimeWindow = [UserDuration; 2];

/// `[lon, lat]`.
pub type JsonCoordinates = [f64; 2];

/// Skills may be given as numbers or names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonSkill {
    Number(u64),
    Name(String),
}

impl From<JsonSkill> for Skill {
    fn from(skill: JsonSkill) -> Self {
        match skill {
            JsonSkill::Number(number) => Skill::new(number.to_string()),
            JsonSkill::Name(name) => Skill::new(name),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonCosts {
    pub fixed: Option<UserCost>,
    pub per_hour: Option<UserCost>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBreak {
    pub id: u64,
    #[serde(default)]
    pub time_windows: Vec<JsonTimeWindow>,
    #[serde(default)]
    pub service: UserDuration,
    pub description: Option<String>,
    pub max_load: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonVehicle {
    pub id: u64,
    pub profile: Option<String>,
    pub start: Option<JsonCoordinates>,
    pub start_index: Option<usize>,
    pub end: Option<JsonCoordinates>,
    pub end_index: Option<usize>,
    pub capacity: Option<Vec<i64>>,
    pub skills: Option<Vec<JsonSkill>>,
    pub time_window: Option<JsonTimeWindow>,
    #[serde(default)]
    pub breaks: Vec<JsonBreak>,
    pub description: Option<String>,
    pub costs: Option<JsonCosts>,
    pub speed_factor: Option<f64>,
    pub max_tasks: Option<usize>,
    pub max_travel_time: Option<UserDuration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonJob {
    pub id: u64,
    pub location: Option<JsonCoordinates>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub service: UserDuration,
    pub delivery: Option<Vec<i64>>,
    pub pickup: Option<Vec<i64>>,
    pub skills: Option<Vec<JsonSkill>>,
    pub priority: Option<u32>,
    pub time_windows: Option<Vec<JsonTimeWindow>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonShipmentStep {
    pub id: u64,
    pub location: Option<JsonCoordinates>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub service: UserDuration,
    pub time_windows: Option<Vec<JsonTimeWindow>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonShipment {
    pub pickup: JsonShipmentStep,
    pub delivery: JsonShipmentStep,
    pub amount: Option<Vec<i64>>,
    pub skills: Option<Vec<JsonSkill>>,
    pub priority: Option<u32>,
}
