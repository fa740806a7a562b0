use iris_matrix_providers::routing_error::RoutingError;
use thiserror::Error;

use crate::problem::units::UserDuration;

/// Malformed or contradictory input, raised while building the problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("No start or end specified for vehicle {0}.")]
    MissingStartAndEnd(u64),

    #[error("Duplicate break id: {0}.")]
    DuplicateBreakId(u64),

    #[error("Inconsistent break max_load size for break: {0}.")]
    InconsistentBreakMaxLoad(u64),

    #[error("Inconsistent breaks for vehicle {0}.")]
    InconsistentBreaks(u64),

    #[error("Time window of vehicle {0} is too short to reach its end.")]
    UnreachableVehicleEnd(u64),

    #[error("Cannot read input: {0}")]
    Io(String),

    #[error("Invalid speed factor for vehicle {vehicle}: {speed_factor}.")]
    InvalidSpeedFactor { vehicle: u64, speed_factor: String },

    #[error("Invalid priority value for job {job}: {priority}.")]
    InvalidPriority { job: u64, priority: u32 },

    #[error("Inconsistent amount size: expected {expected}, got {found}.")]
    AmountSizeMismatch { expected: usize, found: usize },

    #[error("Invalid time window: [{start}, {end}].")]
    InvalidTimeWindow {
        start: UserDuration,
        end: UserDuration,
    },

    #[error("Unsorted or overlapping time windows for {0}.")]
    OverlappingTimeWindows(String),

    #[error("Duplicate job id: {0}.")]
    DuplicateJobId(u64),

    #[error("Duplicate vehicle id: {0}.")]
    DuplicateVehicleId(u64),

    #[error("Location index {index} exceeds matrix size {size}.")]
    UnknownLocationIndex { index: usize, size: usize },

    #[error("Missing location for {0}.")]
    MissingLocation(String),

    #[error("Missing matrix for profile {0}.")]
    MissingMatrix(String),

    #[error("Matrix for profile {0} is not square.")]
    MatrixNotSquare(String),

    #[error("Malformed shipment: {0}.")]
    MalformedShipment(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SolverError {
    /// Status code carried by the output solution.
    pub fn code(&self) -> u32 {
        match self {
            SolverError::Internal(_) => 1,
            SolverError::Input(_) => 2,
            SolverError::Routing(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use iris_matrix_providers::routing_error::UnfoundDirection;

    use super::*;

    #[test]
    fn test_error_codes() {
        let input: SolverError = InputError::DuplicateBreakId(3).into();
        assert_eq!(input.code(), 2);
        assert_eq!(input.to_string(), "Duplicate break id: 3.");

        let routing: SolverError = RoutingError::UnfoundRoute {
            direction: UnfoundDirection::To,
            location: 1,
            lon: 1.5,
            lat: 2.5,
        }
        .into();
        assert_eq!(routing.code(), 3);
        assert_eq!(routing.to_string(), "Unfound route(s) to location [1.5;2.5]");

        assert_eq!(SolverError::Internal("pool".into()).code(), 1);
    }
}
