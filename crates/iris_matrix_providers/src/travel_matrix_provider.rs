use crate::{routing_error::RoutingError, travel_matrices::TravelMatrices};

/// Travel details for an ordered sequence of points, one leg per consecutive pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteInfo {
    pub leg_durations: Vec<u32>,
    pub leg_distances: Vec<u32>,
    pub geometry: Option<String>,
}

impl RouteInfo {
    pub fn distance(&self) -> u32 {
        self.leg_distances.iter().sum()
    }
}

pub trait TravelMatrixProvider: Send + Sync {
    /// Routing profile served by this provider.
    fn profile(&self) -> &str;

    fn fetch_matrices(&self, points: &[geo_types::Point]) -> Result<TravelMatrices, RoutingError>;

    fn fetch_route_info(&self, points: &[geo_types::Point]) -> Result<RouteInfo, RoutingError>;
}
