use fxhash::FxHashSet;
use iris_matrix_providers::{
    as_the_crow_flies::AsTheCrowFlies, routing_error::RoutingError,
    travel_matrices::TravelMatrices,
    travel_matrix_provider::{RouteInfo, TravelMatrixProvider},
};
use iris_optimizer::{
    Solution, SolverParams, Threads,
    error::{InputError, SolverError},
    json::types::JsonProblem,
    problem::{amount::Amount, vehicle_routing_problem::VehicleRoutingProblem},
    routing::{RoutingWrapper, complete_matrices},
    solution::step::StepType,
    solve,
};
use jiff::SignedDuration;

fn problem_from_json(input: &str) -> VehicleRoutingProblem {
    JsonProblem::from_json(input)
        .unwrap()
        .into_builder()
        .unwrap()
        .build()
        .unwrap()
}

fn assert_consistent(problem: &VehicleRoutingProblem, solution: &Solution) {
    assert!(solution.is_ok());
    assert!(solution.summary.violations.is_empty());

    let mut seen = FxHashSet::default();
    for route in &solution.routes {
        assert!(route.violations.is_empty());
        for pair in route.steps.windows(2) {
            assert!(pair[0].arrival <= pair[1].arrival);
        }
        for step in &route.steps {
            if matches!(
                step.step_type,
                StepType::Job | StepType::Pickup | StepType::Delivery
            ) {
                assert!(seen.insert((step.step_type, step.id)));
            }
        }
    }
    for job in &solution.unassigned {
        assert!(seen.insert((StepType::from(job.job_type), Some(job.id))));
    }
    assert_eq!(seen.len(), problem.number_of_jobs());
}

#[test]
fn test_capacity_leaves_one_job_out() {
    let problem = problem_from_json(
        r#"{
            "vehicles": [{ "id": 1, "start_index": 0, "end_index": 0, "capacity": [10] }],
            "jobs": [
                { "id": 1, "location_index": 1, "delivery": [3] },
                { "id": 2, "location_index": 2, "delivery": [4] },
                { "id": 3, "location_index": 3, "delivery": [5] }
            ],
            "matrices": {
                "car": { "durations": [
                    [0, 10, 10, 10],
                    [10, 0, 10, 10],
                    [10, 10, 0, 10],
                    [10, 10, 10, 0]
                ] }
            }
        }"#,
    );

    let solution = solve(&problem, SolverParams::default()).unwrap();

    assert_consistent(&problem, &solution);
    assert_eq!(solution.unassigned.len(), 1);
    assert_eq!(solution.routes.len(), 1);
    assert!(solution.summary.delivery.iter().all(|delivered| delivered <= 10));
}

#[test]
fn test_symmetric_jobs_are_split_evenly() {
    let problem = problem_from_json(
        r#"{
            "vehicles": [
                { "id": 1, "start_index": 0, "end_index": 0, "capacity": [2] },
                { "id": 2, "start_index": 0, "end_index": 0, "capacity": [2] }
            ],
            "jobs": [
                { "id": 1, "location_index": 1, "delivery": [1] },
                { "id": 2, "location_index": 2, "delivery": [1] },
                { "id": 3, "location_index": 3, "delivery": [1] },
                { "id": 4, "location_index": 4, "delivery": [1] }
            ],
            "matrices": {
                "car": { "durations": [
                    [0, 10, 10, 10, 10],
                    [10, 0, 5, 20, 20],
                    [10, 5, 0, 20, 20],
                    [10, 20, 20, 0, 5],
                    [10, 20, 20, 5, 0]
                ] }
            }
        }"#,
    );

    let solution = solve(&problem, SolverParams::default()).unwrap();

    assert_consistent(&problem, &solution);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.routes.len(), 2);
    assert_eq!(solution.routes[0].delivery, solution.routes[1].delivery);
    assert_eq!(solution.summary.cost, 50);
    for route in &solution.routes {
        assert_eq!(route.cost, 25);
        assert_eq!(route.steps.len(), 4);
    }
}

/// Routes nothing into the last point.
struct DeadEndProvider;

impl TravelMatrixProvider for DeadEndProvider {
    fn profile(&self) -> &str {
        "car"
    }

    fn fetch_matrices(&self, points: &[geo_types::Point]) -> Result<TravelMatrices, RoutingError> {
        let n = points.len();
        let mut matrices = TravelMatrices::with_size(n);
        for from in 0..n {
            if from != n - 1 {
                matrices.set(from, n - 1, None, None);
            }
        }
        Ok(matrices)
    }

    fn fetch_route_info(&self, _points: &[geo_types::Point]) -> Result<RouteInfo, RoutingError> {
        Ok(RouteInfo::default())
    }
}

#[test]
fn test_unreachable_location_fails_the_solve() {
    let mut builder = JsonProblem::from_json(
        r#"{
            "vehicles": [{ "id": 1, "start": [4.35, 50.85] }],
            "jobs": [
                { "id": 1, "location": [4.40, 50.85] },
                { "id": 2, "location": [2.35, 48.85] }
            ]
        }"#,
    )
    .unwrap()
    .into_builder()
    .unwrap();

    let error = complete_matrices(&mut builder, |_| DeadEndProvider).unwrap_err();
    let solution = Solution::from_error(&SolverError::from(error));

    assert_eq!(solution.code, 3);
    assert_eq!(
        solution.error.as_deref(),
        Some("Unfound route(s) to location [2.35;48.85]")
    );
}

#[test]
fn test_coordinates_with_crow_flies_routing() {
    let mut builder = JsonProblem::from_json(
        r#"{
            "vehicles": [{ "id": 1, "start": [4.35, 50.85], "end": [4.35, 50.85] }],
            "jobs": [
                { "id": 1, "location": [4.40, 50.85], "service": 60 },
                { "id": 2, "location": [4.40, 50.90], "service": 60 },
                { "id": 3, "location": [4.35, 50.90], "service": 60 }
            ]
        }"#,
    )
    .unwrap()
    .into_builder()
    .unwrap();
    complete_matrices(&mut builder, |profile| AsTheCrowFlies::new(profile, 36.0)).unwrap();
    let problem = builder.build().unwrap();

    let mut solution = solve(&problem, SolverParams::default()).unwrap();
    let wrapper = RoutingWrapper::new(AsTheCrowFlies::new("car", 36.0));
    for route in &mut solution.routes {
        wrapper.add_route_info(route).unwrap();
    }
    solution.update_summary(problem.amount_size());

    assert_consistent(&problem, &solution);
    assert_eq!(solution.routes.len(), 1);
    assert_eq!(solution.summary.service, 180);
    let distance = solution.summary.distance.unwrap();
    assert!(distance > 0);
    assert_eq!(solution.routes[0].steps.last().unwrap().distance, Some(distance as u32));
}

#[test]
fn test_solve_is_deterministic() {
    let input = r#"{
        "vehicles": [
            { "id": 1, "start": [4.35, 50.85], "capacity": [5], "time_window": [0, 36000] },
            { "id": 2, "start": [4.36, 50.86], "capacity": [5], "time_window": [0, 36000] }
        ],
        "jobs": [
            { "id": 1, "location": [4.40, 50.85], "delivery": [2], "time_windows": [[0, 3600]] },
            { "id": 2, "location": [4.41, 50.87], "delivery": [1] },
            { "id": 3, "location": [4.33, 50.82], "delivery": [2], "priority": 10 },
            { "id": 4, "location": [4.38, 50.90], "delivery": [3] },
            { "id": 5, "location": [4.30, 50.88], "delivery": [1], "service": 300 }
        ],
        "shipments": [
            { "pickup": { "id": 6, "location": [4.37, 50.84] },
              "delivery": { "id": 6, "location": [4.42, 50.86] },
              "amount": [1] }
        ]
    }"#;
    let mut builder = JsonProblem::from_json(input).unwrap().into_builder().unwrap();
    complete_matrices(&mut builder, |profile| AsTheCrowFlies::new(profile, 36.0)).unwrap();
    let problem = builder.build().unwrap();

    let params = |threads| SolverParams {
        threads: Threads::Multi(threads),
        ..SolverParams::default()
    };
    let first = solve(&problem, params(1)).unwrap();
    let second = solve(&problem, params(4)).unwrap();

    assert_consistent(&problem, &first);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_zero_timeout_returns_construction() {
    let problem = problem_from_json(
        r#"{
            "vehicles": [{ "id": 1, "start_index": 0, "capacity": [4] }],
            "jobs": [
                { "id": 1, "location_index": 1, "delivery": [1] },
                { "id": 2, "location_index": 2, "delivery": [1] },
                { "id": 3, "location_index": 3, "delivery": [1] }
            ],
            "matrices": {
                "car": { "durations": [
                    [0, 3, 6, 9],
                    [3, 0, 3, 6],
                    [6, 3, 0, 3],
                    [9, 6, 3, 0]
                ] }
            }
        }"#,
    );

    let solution = solve(
        &problem,
        SolverParams {
            timeout: Some(SignedDuration::ZERO),
            exploration_level: 0,
            ..SolverParams::default()
        },
    )
    .unwrap();

    assert_consistent(&problem, &solution);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.routes[0].steps.len(), 4);
}

#[test]
fn test_time_window_reached_through_costly_detour() {
    // Job 2 is only reachable in time through job 1, which costs far more.
    let problem = problem_from_json(
        r#"{
            "vehicles": [{ "id": 1, "start_index": 0, "end_index": 0 }],
            "jobs": [
                { "id": 1, "location_index": 1 },
                { "id": 2, "location_index": 2, "time_windows": [[0, 10]] }
            ],
            "matrices": {
                "car": {
                    "durations": [[0, 1, 100], [1, 0, 1], [100, 1, 0]],
                    "costs": [[0, 50, 1], [50, 0, 50], [1, 50, 0]]
                }
            }
        }"#,
    );

    let solution = solve(&problem, SolverParams::default()).unwrap();

    assert_consistent(&problem, &solution);
    assert!(solution.unassigned.is_empty());
    let ids: Vec<_> = solution.routes[0]
        .steps
        .iter()
        .filter_map(|step| step.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(solution.routes[0].steps[2].arrival, 2);
}

fn four_points_input(vehicle: &str, jobs: &str) -> String {
    format!(
        r#"{{
            "vehicles": [{vehicle}],
            "jobs": [{jobs}],
            "matrices": {{
                "car": {{ "durations": [
                    [0, 10, 10, 10],
                    [10, 0, 10, 10],
                    [10, 10, 0, 10],
                    [10, 10, 10, 0]
                ] }}
            }}
        }}"#
    )
}

#[test]
fn test_breaks_are_scheduled() {
    let problem = problem_from_json(&four_points_input(
        r#"{ "id": 1, "start_index": 0, "end_index": 0, "time_window": [0, 1000],
             "breaks": [{ "id": 7, "time_windows": [[20, 40]], "service": 10 }] }"#,
        r#"{ "id": 1, "location_index": 1, "service": 5 },
           { "id": 2, "location_index": 2, "service": 5 },
           { "id": 3, "location_index": 3, "service": 5 }"#,
    ));

    let solution = solve(&problem, SolverParams::default()).unwrap();

    assert_consistent(&problem, &solution);
    assert!(solution.unassigned.is_empty());
    let breaks: Vec<_> = solution.routes[0]
        .steps
        .iter()
        .filter(|step| step.step_type == StepType::Break)
        .collect();
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0].id, Some(7));
    assert!((20..=40).contains(&breaks[0].service_start()));
    assert_eq!(solution.summary.service, 25);
}

#[test]
fn test_break_max_load_waits_for_empty_vehicle() {
    let problem = problem_from_json(&four_points_input(
        r#"{ "id": 1, "start_index": 0, "end_index": 0, "capacity": [4],
             "breaks": [{ "id": 7, "service": 10, "max_load": [0] }] }"#,
        r#"{ "id": 1, "location_index": 1, "delivery": [1] },
           { "id": 2, "location_index": 2, "delivery": [1] },
           { "id": 3, "location_index": 3, "delivery": [1] }"#,
    ));

    let solution = solve(&problem, SolverParams::default()).unwrap();

    assert_consistent(&problem, &solution);
    let steps = &solution.routes[0].steps;
    let last_task = &steps[steps.len() - 2];
    assert_eq!(last_task.step_type, StepType::Break);
    assert_eq!(last_task.load, Amount::from_vec(vec![0]));
}

#[test]
fn test_break_outside_vehicle_time_window_is_rejected() {
    let error = JsonProblem::from_json(&four_points_input(
        r#"{ "id": 1, "start_index": 0, "end_index": 0, "time_window": [0, 100],
             "breaks": [{ "id": 7, "time_windows": [[500, 600]], "service": 10 }] }"#,
        r#"{ "id": 1, "location_index": 1 }"#,
    ))
    .unwrap()
    .into_builder()
    .unwrap()
    .build()
    .unwrap_err();

    assert_eq!(error, InputError::InconsistentBreaks(1));
    let solution = Solution::from_error(&SolverError::from(error));
    assert_eq!(solution.code, 2);
    assert_eq!(
        solution.error.as_deref(),
        Some("Inconsistent breaks for vehicle 1.")
    );
}
