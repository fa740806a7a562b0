use std::cmp::Ordering;

use crate::problem::units::Cost;

/// Quality summary used to compare complete solutions.
///
/// Ordering puts the best solution first: higher priority sum, then more
/// assigned jobs, then lower cost, then fewer used vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolutionIndicators {
    pub priority_sum: u64,
    pub assigned: usize,
    pub cost: Cost,
    pub used_vehicles: usize,
}

impl Ord for SolutionIndicators {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority_sum
            .cmp(&self.priority_sum)
            .then(other.assigned.cmp(&self.assigned))
            .then(self.cost.cmp(&other.cost))
            .then(self.used_vehicles.cmp(&other.used_vehicles))
    }
}

impl PartialOrd for SolutionIndicators {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
