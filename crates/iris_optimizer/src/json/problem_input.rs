use fxhash::{FxHashMap, FxHashSet};
use tracing::{Level, instrument};

use crate::{
    error::InputError,
    problem::{
        amount::Amount,
        job::{JobBuilder, ShipmentBuilder, ShipmentStep},
        location::Location,
        matrix::Matrix,
        skill::Skill,
        time_window::TimeWindow,
        vehicle::{VehicleBreak, VehicleBuilder, VehicleCosts},
        vehicle_routing_problem::VehicleRoutingProblemBuilder,
    },
};

use super::types::{
    JsonCoordinates, JsonMatrices, JsonProblem, JsonShipmentStep, JsonSkill, JsonTimeWindow,
};

/// Assigns matrix indices to places. With user matrices every place must
/// give its index, otherwise places are numbered by first appearance of
/// their coordinates.
struct LocationRegistry {
    use_indices: bool,
    coordinates: Vec<Option<JsonCoordinates>>,
    by_coordinates: FxHashMap<(u64, u64), usize>,
}

impl LocationRegistry {
    fn new(use_indices: bool) -> Self {
        LocationRegistry {
            use_indices,
            coordinates: Vec::new(),
            by_coordinates: FxHashMap::default(),
        }
    }

    fn resolve(
        &mut self,
        owner: impl FnOnce() -> String,
        index: Option<usize>,
        coordinates: Option<JsonCoordinates>,
    ) -> Result<usize, InputError> {
        if self.use_indices {
            let index = index.ok_or_else(|| InputError::MissingLocation(owner()))?;
            if self.coordinates.len() <= index {
                self.coordinates.resize(index + 1, None);
            }
            if coordinates.is_some() {
                self.coordinates[index] = coordinates;
            }
            return Ok(index);
        }

        let coordinates = coordinates.ok_or_else(|| InputError::MissingLocation(owner()))?;
        let key = (coordinates[0].to_bits(), coordinates[1].to_bits());
        let next = self.coordinates.len();
        let index = *self.by_coordinates.entry(key).or_insert(next);
        if index == next {
            self.coordinates.push(Some(coordinates));
        }
        Ok(index)
    }

    fn into_locations(self) -> Vec<Location> {
        self.coordinates
            .into_iter()
            .enumerate()
            .map(|(index, coordinates)| match coordinates {
                Some([lon, lat]) => Location::with_coordinates(index, lon, lat),
                None => Location::from_index(index),
            })
            .collect()
    }
}

fn time_windows(windows: &[JsonTimeWindow]) -> Result<Vec<TimeWindow>, InputError> {
    windows
        .iter()
        .map(|&[start, end]| TimeWindow::new(start, end))
        .collect()
}

fn skills(skills: Option<Vec<JsonSkill>>) -> FxHashSet<Skill> {
    skills
        .unwrap_or_default()
        .into_iter()
        .map(Skill::from)
        .collect()
}

fn square_matrix<T: Copy + Default>(
    profile: &str,
    rows: Vec<Vec<T>>,
) -> Result<Matrix<T>, InputError> {
    if rows.iter().any(|row| row.len() != rows.len()) {
        return Err(InputError::MatrixNotSquare(profile.to_owned()));
    }
    Ok(Matrix::from_rows(rows))
}

fn shipment_step(
    registry: &mut LocationRegistry,
    step: JsonShipmentStep,
    side: &str,
) -> Result<ShipmentStep, InputError> {
    let id = step.id;
    let location = registry.resolve(
        || format!("shipment {side} {id}"),
        step.location_index,
        step.location,
    )?;

    Ok(ShipmentStep {
        id,
        location,
        service: step.service,
        time_windows: time_windows(&step.time_windows.unwrap_or_default())?,
        description: step.description.unwrap_or_default(),
    })
}

impl JsonProblem {
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        serde_json::from_str(input).map_err(|error| InputError::InvalidJson(error.to_string()))
    }

    /// Problem builder with every entity converted. Profiles without a user
    /// matrix are left for a routing provider to fill.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn into_builder(self) -> Result<VehicleRoutingProblemBuilder, InputError> {
        let mut builder = VehicleRoutingProblemBuilder::default();
        let mut registry = LocationRegistry::new(!self.matrices.is_empty());

        for vehicle in self.vehicles {
            let id = vehicle.id;
            let mut vehicle_builder = VehicleBuilder::default();
            vehicle_builder.set_id(id);

            if vehicle.start.is_some() || vehicle.start_index.is_some() {
                let start = registry.resolve(
                    || format!("vehicle {id} start"),
                    vehicle.start_index,
                    vehicle.start,
                )?;
                vehicle_builder.set_start_location(start);
            }
            if vehicle.end.is_some() || vehicle.end_index.is_some() {
                let end = registry.resolve(
                    || format!("vehicle {id} end"),
                    vehicle.end_index,
                    vehicle.end,
                )?;
                vehicle_builder.set_end_location(end);
            }

            if let Some(profile) = vehicle.profile {
                vehicle_builder.set_profile(profile);
            }
            if let Some(capacity) = vehicle.capacity {
                vehicle_builder.set_capacity(Amount::from_vec(capacity));
            }
            if let Some([start, end]) = vehicle.time_window {
                vehicle_builder.set_time_window(TimeWindow::new(start, end)?);
            }
            if let Some(description) = vehicle.description {
                vehicle_builder.set_description(description);
            }
            if let Some(costs) = vehicle.costs {
                let defaults = VehicleCosts::default();
                vehicle_builder.set_costs(VehicleCosts {
                    fixed: costs.fixed.unwrap_or(defaults.fixed),
                    per_hour: costs.per_hour.unwrap_or(defaults.per_hour),
                });
            }
            if let Some(speed_factor) = vehicle.speed_factor {
                vehicle_builder.set_speed_factor(speed_factor);
            }
            if let Some(max_tasks) = vehicle.max_tasks {
                vehicle_builder.set_max_tasks(max_tasks);
            }
            if let Some(max_travel_time) = vehicle.max_travel_time {
                vehicle_builder.set_max_travel_time(max_travel_time);
            }

            let breaks = vehicle
                .breaks
                .into_iter()
                .map(|vehicle_break| {
                    VehicleBreak::new(
                        vehicle_break.id,
                        time_windows(&vehicle_break.time_windows)?,
                        vehicle_break.service,
                        vehicle_break.description.unwrap_or_default(),
                        vehicle_break.max_load.map(Amount::from_vec),
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;

            vehicle_builder
                .set_skills(skills(vehicle.skills))
                .set_breaks(breaks);
            builder.add_vehicle(vehicle_builder.build()?);
        }

        for job in self.jobs {
            let id = job.id;
            let location =
                registry.resolve(|| format!("job {id}"), job.location_index, job.location)?;

            let mut job_builder = JobBuilder::default();
            job_builder
                .set_id(id)
                .set_location(location)
                .set_service(job.service)
                .set_skills(skills(job.skills))
                .set_priority(job.priority.unwrap_or(0));
            if let Some(delivery) = job.delivery {
                job_builder.set_delivery(Amount::from_vec(delivery));
            }
            if let Some(pickup) = job.pickup {
                job_builder.set_pickup(Amount::from_vec(pickup));
            }
            if let Some(windows) = job.time_windows {
                job_builder.set_time_windows(time_windows(&windows)?);
            }
            if let Some(description) = job.description {
                job_builder.set_description(description);
            }
            builder.add_job(job_builder.build()?);
        }

        for shipment in self.shipments {
            let mut shipment_builder = ShipmentBuilder::default();
            shipment_builder
                .set_pickup(shipment_step(&mut registry, shipment.pickup, "pickup")?)
                .set_delivery(shipment_step(&mut registry, shipment.delivery, "delivery")?)
                .set_skills(skills(shipment.skills))
                .set_priority(shipment.priority.unwrap_or(0));
            if let Some(amount) = shipment.amount {
                shipment_builder.set_amount(Amount::from_vec(amount));
            }
            builder.add_shipment(shipment_builder.build()?);
        }

        for (profile, JsonMatrices { durations, costs }) in self.matrices {
            builder.set_durations_matrix(profile.clone(), square_matrix(&profile, durations)?);
            if let Some(costs) = costs {
                builder.set_costs_matrix(profile.clone(), square_matrix(&profile, costs)?);
            }
        }

        builder.set_locations(registry.into_locations());
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::{job::JobIdx, location::LocationIdx, vehicle::VehicleIdx};

    use super::*;

    const WITH_MATRIX: &str = r#"{
        "vehicles": [
            { "id": 7, "start_index": 0, "end_index": 0, "capacity": [4], "skills": [1, "cold"] }
        ],
        "jobs": [
            { "id": 1, "location_index": 1, "delivery": [1], "service": 30 },
            { "id": 2, "location_index": 2, "pickup": [2], "priority": 5,
              "time_windows": [[0, 100], [200, 300]] }
        ],
        "shipments": [
            { "pickup": { "id": 3, "location_index": 1 },
              "delivery": { "id": 3, "location_index": 2 },
              "amount": [1] }
        ],
        "matrices": {
            "car": { "durations": [[0, 5, 9], [5, 0, 4], [9, 4, 0]] }
        }
    }"#;

    #[test]
    fn test_problem_with_matrix() {
        let builder = JsonProblem::from_json(WITH_MATRIX)
            .unwrap()
            .into_builder()
            .unwrap();
        let problem = builder.build().unwrap();

        assert_eq!(problem.number_of_jobs(), 4);
        assert_eq!(problem.number_of_vehicles(), 1);
        assert!(problem.has_time_windows());
        assert!(problem.has_shipments());

        let vehicle = problem.vehicle(VehicleIdx::new(0));
        assert_eq!(vehicle.id(), 7);
        assert_eq!(vehicle.skills().len(), 2);
        assert_eq!(vehicle.duration(LocationIdx::new(0), LocationIdx::new(2)), 900);

        assert_eq!(problem.job(JobIdx::new(0)).user_service(), 30);
        assert_eq!(problem.job(JobIdx::new(1)).time_windows().len(), 2);
        assert!(problem.job(JobIdx::new(2)).is_pickup());
        assert_eq!(problem.delivery_of(JobIdx::new(2)), JobIdx::new(3));
    }

    #[test]
    fn test_coordinates_are_deduplicated() {
        let input = r#"{
            "vehicles": [{ "id": 1, "start": [4.35, 50.85], "end": [4.35, 50.85] }],
            "jobs": [
                { "id": 1, "location": [4.40, 50.85] },
                { "id": 2, "location": [4.35, 50.85] }
            ]
        }"#;

        let builder = JsonProblem::from_json(input).unwrap().into_builder().unwrap();

        assert_eq!(builder.locations().len(), 2);
        assert_eq!(builder.profiles_without_matrix(), vec!["car".to_owned()]);
    }

    #[test]
    fn test_missing_location_index() {
        let input = r#"{
            "vehicles": [{ "id": 1, "start_index": 0 }],
            "jobs": [{ "id": 9, "location": [4.40, 50.85] }],
            "matrices": { "car": { "durations": [[0]] } }
        }"#;

        let error = JsonProblem::from_json(input).unwrap().into_builder().unwrap_err();

        assert_eq!(error, InputError::MissingLocation("job 9".into()));
    }

    #[test]
    fn test_matrix_not_square() {
        let input = r#"{
            "vehicles": [{ "id": 1, "start_index": 0 }],
            "matrices": { "car": { "durations": [[0, 1], [1]] } }
        }"#;

        let error = JsonProblem::from_json(input).unwrap().into_builder().unwrap_err();

        assert_eq!(error, InputError::MatrixNotSquare("car".into()));
    }

    #[test]
    fn test_invalid_json() {
        let error = JsonProblem::from_json(r#"{ "vehicles": [{ "idx": 1 }] }"#).unwrap_err();

        assert!(matches!(error, InputError::InvalidJson(_)));
    }

    #[test]
    fn test_vehicle_without_start_or_end() {
        let input = r#"{ "vehicles": [{ "id": 3 }], "jobs": [] }"#;

        let error = JsonProblem::from_json(input).unwrap().into_builder().unwrap_err();

        assert_eq!(error, InputError::MissingStartAndEnd(3));
    }
}
