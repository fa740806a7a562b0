use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl From<Coordinates> for geo_types::Point {
    fn from(coordinates: Coordinates) -> Self {
        geo_types::Point::new(coordinates.lon, coordinates.lat)
    }
}

/// A matrix index, optionally tied to real-world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    index: LocationIdx,
    coordinates: Option<Coordinates>,
}

impl Location {
    pub fn from_index(index: usize) -> Self {
        Self {
            index: LocationIdx::new(index),
            coordinates: None,
        }
    }

    pub fn with_coordinates(index: usize, lon: f64, lat: f64) -> Self {
        Self {
            index: LocationIdx::new(index),
            coordinates: Some(Coordinates { lon, lat }),
        }
    }

    pub fn index(&self) -> LocationIdx {
        self.index
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}
