use std::sync::Arc;

use super::{
    eval::Eval,
    location::LocationIdx,
    matrix::Matrix,
    units::{COST_FACTOR, Cost, DURATION_FACTOR, Duration, UserCost, UserDuration},
};

/// Per-vehicle view over the profile matrices, turning raw lookups into
/// scaled integer durations and costs.
#[derive(Debug, Clone)]
pub struct CostWrapper {
    discrete_duration_factor: Duration,
    discrete_cost_factor: Cost,
    cost_based_on_duration: bool,
    durations: Arc<Matrix<UserDuration>>,
    costs: Arc<Matrix<UserCost>>,
}

impl CostWrapper {
    pub fn new(speed_factor: f64, per_hour: UserCost) -> Self {
        let duration_factor = DURATION_FACTOR as f64 / speed_factor;

        Self {
            discrete_duration_factor: duration_factor.round() as Duration,
            discrete_cost_factor: (duration_factor * f64::from(per_hour)).round() as Cost,
            cost_based_on_duration: true,
            durations: Arc::default(),
            costs: Arc::default(),
        }
    }

    pub fn set_durations_matrix(&mut self, durations: Arc<Matrix<UserDuration>>) {
        self.durations = durations;
    }

    /// Prices travel with a dedicated cost matrix instead of durations.
    pub fn set_costs_matrix(&mut self, costs: Arc<Matrix<UserCost>>) {
        self.costs = costs;
        self.discrete_cost_factor = DURATION_FACTOR * COST_FACTOR;
        self.cost_based_on_duration = false;
    }

    pub fn cost_based_on_duration(&self) -> bool {
        self.cost_based_on_duration
    }

    pub fn discrete_duration_factor(&self) -> Duration {
        self.discrete_duration_factor
    }

    pub fn discrete_cost_factor(&self) -> Cost {
        self.discrete_cost_factor
    }

    #[inline]
    pub fn duration(&self, from: LocationIdx, to: LocationIdx) -> Duration {
        self.discrete_duration_factor * Duration::from(self.durations.get(from, to))
    }

    #[inline]
    pub fn cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        let raw = if self.cost_based_on_duration {
            self.durations.get(from, to)
        } else {
            self.costs.get(from, to)
        };

        self.discrete_cost_factor * Cost::from(raw)
    }

    #[inline]
    pub fn eval(&self, from: LocationIdx, to: LocationIdx) -> Eval {
        Eval::new(self.cost(from, to), self.duration(from, to))
    }

    /// Same factors and same matrices.
    pub fn is_equivalent(&self, other: &CostWrapper) -> bool {
        self.discrete_duration_factor == other.discrete_duration_factor
            && self.discrete_cost_factor == other.discrete_cost_factor
            && self.cost_based_on_duration == other.cost_based_on_duration
            && Arc::ptr_eq(&self.durations, &other.durations)
            && (self.cost_based_on_duration || Arc::ptr_eq(&self.costs, &other.costs))
    }
}
