use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfoundDirection {
    From,
    To,
}

impl fmt::Display for UnfoundDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnfoundDirection::From => write!(f, "from"),
            UnfoundDirection::To => write!(f, "to"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Unfound route(s) {direction} location [{lon};{lat}]")]
    UnfoundRoute {
        direction: UnfoundDirection,
        location: usize,
        lon: f64,
        lat: f64,
    },

    #[error("Location {0} has no coordinates")]
    MissingCoordinates(usize),

    #[error("Invalid routing response: {0}")]
    InvalidResponse(String),
}
