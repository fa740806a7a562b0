use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Fills vehicles one after the other in a fixed order.
    Basic,
    /// Picks the next vehicle to fill from the jobs left.
    Dynamic,
}

/// How the first job of a route is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Init {
    None,
    HigherAmount,
    Furthest,
}

/// One row of the construction tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicParameters {
    pub heuristic: Heuristic,
    pub init: Init,
    pub regret_coeff: f32,
}

impl HeuristicParameters {
    pub const fn new(heuristic: Heuristic, init: Init, regret_coeff: f32) -> Self {
        Self {
            heuristic,
            init,
            regret_coeff,
        }
    }
}

const fn basic(init: Init, regret_coeff: f32) -> HeuristicParameters {
    HeuristicParameters::new(Heuristic::Basic, init, regret_coeff)
}

const fn dynamic(init: Init, regret_coeff: f32) -> HeuristicParameters {
    HeuristicParameters::new(Heuristic::Dynamic, init, regret_coeff)
}

/// Rows tried when every vehicle shares locations, profile and costs.
pub static HOMOGENEOUS_PARAMETERS: [HeuristicParameters; 32] = [
    basic(Init::None, 0.3),
    basic(Init::HigherAmount, 0.1),
    basic(Init::HigherAmount, 0.5),
    basic(Init::Furthest, 0.3),
    //
    basic(Init::None, 0.7),
    basic(Init::HigherAmount, 0.3),
    basic(Init::HigherAmount, 2.1),
    basic(Init::Furthest, 0.2),
    //
    basic(Init::None, 0.1),
    basic(Init::None, 0.6),
    basic(Init::None, 0.9),
    basic(Init::HigherAmount, 2.4),
    //
    basic(Init::HigherAmount, 0.2),
    basic(Init::HigherAmount, 0.8),
    basic(Init::HigherAmount, 1.2),
    basic(Init::Furthest, 0.4),
    //
    basic(Init::None, 1.2),
    basic(Init::HigherAmount, 1.0),
    basic(Init::HigherAmount, 1.1),
    basic(Init::Furthest, 2.4),
    //
    basic(Init::None, 0.2),
    basic(Init::HigherAmount, 0.0),
    basic(Init::HigherAmount, 0.9),
    basic(Init::Furthest, 1.5),
    //
    basic(Init::None, 0.5),
    basic(Init::None, 1.3),
    basic(Init::HigherAmount, 1.5),
    basic(Init::Furthest, 0.1),
    //
    basic(Init::None, 0.4),
    basic(Init::None, 1.6),
    basic(Init::HigherAmount, 0.6),
    basic(Init::Furthest, 0.5),
];

pub static HETEROGENEOUS_PARAMETERS: [HeuristicParameters; 32] = [
    dynamic(Init::None, 0.4),
    dynamic(Init::HigherAmount, 0.2),
    dynamic(Init::Furthest, 0.1),
    dynamic(Init::Furthest, 0.3),
    //
    dynamic(Init::None, 0.3),
    dynamic(Init::None, 0.6),
    dynamic(Init::HigherAmount, 0.1),
    dynamic(Init::Furthest, 0.2),
    //
    dynamic(Init::None, 0.2),
    dynamic(Init::None, 0.9),
    dynamic(Init::HigherAmount, 0.3),
    dynamic(Init::Furthest, 0.4),
    //
    dynamic(Init::None, 0.1),
    dynamic(Init::None, 0.5),
    dynamic(Init::HigherAmount, 1.4),
    dynamic(Init::Furthest, 0.0),
    //
    dynamic(Init::None, 2.1),
    dynamic(Init::HigherAmount, 0.0),
    dynamic(Init::HigherAmount, 0.8),
    dynamic(Init::Furthest, 0.6),
    //
    dynamic(Init::None, 0.0),
    dynamic(Init::None, 0.8),
    dynamic(Init::HigherAmount, 0.4),
    dynamic(Init::HigherAmount, 0.5),
    //
    dynamic(Init::HigherAmount, 0.6),
    dynamic(Init::HigherAmount, 0.7),
    dynamic(Init::HigherAmount, 1.2),
    dynamic(Init::Furthest, 0.5),
    //
    dynamic(Init::None, 0.7),
    dynamic(Init::HigherAmount, 1.0),
    dynamic(Init::Furthest, 1.7),
    dynamic(Init::Furthest, 2.2),
];
