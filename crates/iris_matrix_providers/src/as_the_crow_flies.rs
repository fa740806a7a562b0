use tracing::debug;

use crate::{
    routing_error::RoutingError,
    travel_matrices::TravelMatrices,
    travel_matrix_provider::{RouteInfo, TravelMatrixProvider},
};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub fn haversine_distance(from: geo_types::Point, to: geo_types::Point) -> f64 {
    let lat1_rad = from.y().to_radians();
    let lon1_rad = from.x().to_radians();
    let lat2_rad = to.y().to_radians();
    let lon2_rad = to.x().to_radians();

    let delta_lat = lat2_rad - lat1_rad;
    let delta_lon = lon2_rad - lon1_rad;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Straight-line provider travelling at a constant speed.
#[derive(Debug, Clone)]
pub struct AsTheCrowFlies {
    profile: String,
    speed_kmh: f64,
}

impl AsTheCrowFlies {
    pub fn new(profile: impl Into<String>, speed_kmh: f64) -> Self {
        Self {
            profile: profile.into(),
            speed_kmh,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    fn leg(&self, from: geo_types::Point, to: geo_types::Point) -> (u32, u32) {
        let meters = haversine_distance(from, to);
        let meters_per_second = self.speed_kmh / 3.6;

        (
            (meters / meters_per_second).round() as u32,
            meters.round() as u32,
        )
    }
}

impl TravelMatrixProvider for AsTheCrowFlies {
    fn profile(&self) -> &str {
        &self.profile
    }

    fn fetch_matrices(&self, points: &[geo_types::Point]) -> Result<TravelMatrices, RoutingError> {
        if self.speed_kmh <= 0.0 {
            return Err(RoutingError::InvalidResponse(format!(
                "speed must be positive, got {} km/h",
                self.speed_kmh
            )));
        }

        let mut matrices = TravelMatrices::with_size(points.len());

        for (i, &from) in points.iter().enumerate() {
            for (j, &to) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (duration, distance) = self.leg(from, to);
                matrices.set(i, j, Some(duration), Some(distance));
            }
        }

        debug!(
            profile = %self.profile,
            locations = points.len(),
            "computed crow-flies matrices"
        );

        Ok(matrices)
    }

    fn fetch_route_info(&self, points: &[geo_types::Point]) -> Result<RouteInfo, RoutingError> {
        let (leg_durations, leg_distances) = points
            .windows(2)
            .map(|pair| self.leg(pair[0], pair[1]))
            .unzip();

        let coordinates = points
            .iter()
            .map(|point| format!("{} {}", point.x(), point.y()))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(RouteInfo {
            leg_durations,
            leg_distances,
            geometry: Some(format!("LINESTRING({coordinates})")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        let paris = geo_types::Point::new(2.3522, 48.8566);
        let lyon = geo_types::Point::new(4.8357, 45.7640);

        let distance = haversine_distance(paris, lyon);
        assert!((distance - 391_500.0).abs() < 2_000.0, "{distance}");
    }

    #[test]
    fn test_fetch_matrices() {
        let provider = AsTheCrowFlies::new("car", 36.0);
        let points = vec![
            geo_types::Point::new(0.0, 0.0),
            geo_types::Point::new(0.0, 0.01),
        ];

        let matrices = provider.fetch_matrices(&points).unwrap();
        assert_eq!(matrices.duration(0, 0), Some(0));

        let distance = matrices.distance(0, 1).unwrap();
        assert!((1110..=1113).contains(&distance), "{distance}");

        // 10 m/s
        assert_eq!(matrices.duration(0, 1), Some((distance as f64 / 10.0).round() as u32));
        assert_eq!(matrices.duration(1, 0), matrices.duration(0, 1));
    }

    #[test]
    fn test_fetch_route_info() {
        let provider = AsTheCrowFlies::new("car", 36.0);
        let points = vec![
            geo_types::Point::new(0.0, 0.0),
            geo_types::Point::new(0.0, 0.01),
            geo_types::Point::new(0.0, 0.0),
        ];

        let info = provider.fetch_route_info(&points).unwrap();
        assert_eq!(info.leg_durations.len(), 2);
        assert_eq!(info.leg_distances[0], info.leg_distances[1]);
        assert_eq!(
            info.geometry.as_deref(),
            Some("LINESTRING(0 0, 0 0.01, 0 0)")
        );
    }
}
