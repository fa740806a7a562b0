use serde::{Deserialize, Serialize};

use crate::routing_error::{RoutingError, UnfoundDirection};

/// TravelMatrices holds the travel durations (seconds) and distances (meters)
/// returned by a provider, stored as flat row-major vectors.
///
/// A `None` entry is a pair the provider could not route.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TravelMatrices {
    pub num_locations: usize,
    pub durations: Vec<Option<u32>>,
    pub distances: Vec<Option<u32>>,
}

impl TravelMatrices {
    pub fn with_size(num_locations: usize) -> Self {
        Self {
            num_locations,
            durations: vec![Some(0); num_locations * num_locations],
            distances: vec![Some(0); num_locations * num_locations],
        }
    }

    #[inline(always)]
    fn offset(&self, from: usize, to: usize) -> usize {
        from * self.num_locations + to
    }

    pub fn duration(&self, from: usize, to: usize) -> Option<u32> {
        self.durations[self.offset(from, to)]
    }

    pub fn distance(&self, from: usize, to: usize) -> Option<u32> {
        self.distances[self.offset(from, to)]
    }

    pub fn set(&mut self, from: usize, to: usize, duration: Option<u32>, distance: Option<u32>) {
        let offset = self.offset(from, to);
        self.durations[offset] = duration;
        self.distances[offset] = distance;
    }

    /// Fails with the location involved in the largest number of unfound
    /// routes, if any pair could not be routed.
    pub fn check_unfound(&self, points: &[geo_types::Point]) -> Result<(), RoutingError> {
        let n = self.num_locations;
        let mut unfound_from = vec![0usize; n];
        let mut unfound_to = vec![0usize; n];
        let mut any_unfound = false;

        for from in 0..n {
            for to in 0..n {
                if self.duration(from, to).is_none() {
                    unfound_from[from] += 1;
                    unfound_to[to] += 1;
                    any_unfound = true;
                }
            }
        }

        if !any_unfound {
            return Ok(());
        }

        let (from_location, from_count) = max_with_index(&unfound_from);
        let (to_location, to_count) = max_with_index(&unfound_to);

        let (direction, location) = if from_count >= to_count {
            (UnfoundDirection::From, from_location)
        } else {
            (UnfoundDirection::To, to_location)
        };

        let point = points
            .get(location)
            .ok_or(RoutingError::MissingCoordinates(location))?;

        tracing::warn!(location, %direction, "unfound routes in travel matrices");

        Err(RoutingError::UnfoundRoute {
            direction,
            location,
            lon: point.x(),
            lat: point.y(),
        })
    }
}

/// First index holding the maximum value.
fn max_with_index(values: &[usize]) -> (usize, usize) {
    values
        .iter()
        .enumerate()
        .fold((0, 0), |best, (index, &value)| {
            if value > best.1 { (index, value) } else { best }
        })
}
