use iris_matrix_providers::{
    routing_error::RoutingError, travel_matrix_provider::TravelMatrixProvider,
};
use tracing::{Level, debug, instrument};

use crate::{
    problem::{
        location::Location, matrix::Matrix, units::UserDuration,
        vehicle_routing_problem::VehicleRoutingProblemBuilder,
    },
    solution::{route::Route, step::StepType},
};

/// Adapts a travel matrix provider to what the solver consumes: complete
/// duration matrices and route details for formatted routes.
pub struct RoutingWrapper<P: TravelMatrixProvider> {
    provider: P,
}

impl<P: TravelMatrixProvider> RoutingWrapper<P> {
    pub fn new(provider: P) -> Self {
        RoutingWrapper { provider }
    }

    pub fn profile(&self) -> &str {
        self.provider.profile()
    }

    /// Durations between every pair of `locations`, indexed like the slice.
    /// Fails on the location with the most unreachable pairs.
    #[instrument(skip_all, fields(profile = self.profile()), level = Level::DEBUG)]
    pub fn get_matrix(&self, locations: &[Location]) -> Result<Matrix<UserDuration>, RoutingError> {
        let points = locations
            .iter()
            .map(|location| {
                location
                    .coordinates()
                    .map(geo_types::Point::from)
                    .ok_or(RoutingError::MissingCoordinates(location.index().get()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let matrices = self.provider.fetch_matrices(&points)?;
        matrices.check_unfound(&points)?;

        let mut matrix = Matrix::new(points.len());
        for from in 0..points.len() {
            for to in 0..points.len() {
                let duration = matrices.duration(from, to).ok_or_else(|| {
                    RoutingError::InvalidResponse(format!("missing duration {from} -> {to}"))
                })?;
                matrix.set(from, to, duration);
            }
        }

        debug!(size = points.len(), "fetched duration matrix");
        Ok(matrix)
    }

    /// Fills distances and geometry of an already formatted route. Schedules
    /// are left untouched.
    pub fn add_route_info(&self, route: &mut Route) -> Result<(), RoutingError> {
        let points = route
            .located_steps()
            .map(|step| {
                step.location.map(geo_types::Point::from).ok_or(
                    RoutingError::MissingCoordinates(
                        step.location_index.map_or(0, |location| location.get()),
                    ),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if points.len() < 2 {
            route.distance = Some(0);
            for step in &mut route.steps {
                step.distance = Some(0);
            }
            return Ok(());
        }

        let info = self.provider.fetch_route_info(&points)?;
        if info.leg_distances.len() + 1 != points.len() {
            return Err(RoutingError::InvalidResponse(format!(
                "expected {} legs, got {}",
                points.len() - 1,
                info.leg_distances.len()
            )));
        }

        let mut legs = info.leg_distances.iter();
        let mut distance = 0;
        let mut first = true;
        for step in &mut route.steps {
            if step.step_type != StepType::Break {
                if !first {
                    distance += legs.next().copied().unwrap_or(0);
                }
                first = false;
            }
            step.distance = Some(distance);
        }

        route.distance = Some(info.distance());
        route.geometry = info.geometry;
        Ok(())
    }
}

/// Fetches a duration matrix for every vehicle profile the input left
/// without one, using the provider returned by `provider_for`.
pub fn complete_matrices<P, F>(
    builder: &mut VehicleRoutingProblemBuilder,
    provider_for: F,
) -> Result<(), RoutingError>
where
    P: TravelMatrixProvider,
    F: Fn(&str) -> P,
{
    for profile in builder.profiles_without_matrix() {
        let wrapper = RoutingWrapper::new(provider_for(&profile));
        let matrix = wrapper.get_matrix(builder.locations())?;
        builder.set_durations_matrix(profile, matrix);
    }
    Ok(())
}
