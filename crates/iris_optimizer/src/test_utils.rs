use crate::{
    problem::{
        amount::Amount,
        eval::Eval,
        job::{JobBuilder, JobIdx, ShipmentBuilder, ShipmentStep},
        location::Location,
        matrix::Matrix,
        time_window::TimeWindow,
        units::UserDuration,
        vehicle::{DEFAULT_PROFILE, VehicleBuilder, VehicleIdx},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        ls::{
            r#move::{
                LocalSearchMove, LocalSearchOperator, Neighbourhood, OperatorNeighbourhood,
            },
            search_context::SearchContext,
        },
        neighbours::Neighbours,
        solution::{
            solution_state::SolutionState, working_route::WorkingRoute,
            working_solution::WorkingSolution,
        },
    },
};

#[derive(Debug, Clone, Copy)]
enum TestJobKind {
    Delivery,
    Pickup,
    Shipment { delivery_id: u64 },
}

/// Job description for test problems. Each job (each shipment leg) gets its
/// own location unless `at` pins it to an explicit point index.
#[derive(Debug, Clone)]
pub struct TestJob {
    id: u64,
    kind: TestJobKind,
    amount: i64,
    service: UserDuration,
    time_window: Option<TimeWindow>,
    priority: u32,
    location: Option<usize>,
}

impl TestJob {
    fn new(id: u64, kind: TestJobKind, amount: i64) -> Self {
        TestJob {
            id,
            kind,
            amount,
            service: 0,
            time_window: None,
            priority: 0,
            location: None,
        }
    }

    pub fn delivery(id: u64, amount: i64) -> Self {
        Self::new(id, TestJobKind::Delivery, amount)
    }

    pub fn pickup(id: u64, amount: i64) -> Self {
        Self::new(id, TestJobKind::Pickup, amount)
    }

    pub fn shipment(pickup_id: u64, delivery_id: u64, amount: i64) -> Self {
        Self::new(pickup_id, TestJobKind::Shipment { delivery_id }, amount)
    }

    pub fn with_service(mut self, service: UserDuration) -> Self {
        self.service = service;
        self
    }

    pub fn with_time_window(mut self, time_window: TimeWindow) -> Self {
        self.time_window = Some(time_window);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Pins a single job to a point index.
    pub fn at(mut self, location: usize) -> Self {
        self.location = Some(location);
        self
    }

    fn legs(&self) -> usize {
        match self.kind {
            TestJobKind::Shipment { .. } => 2,
            _ => 1,
        }
    }
}

/// Manhattan travel times in seconds between integer points.
pub fn manhattan_matrix(points: &[(i64, i64)]) -> Matrix<UserDuration> {
    Matrix::from_rows(
        points
            .iter()
            .map(|&(x1, y1)| {
                points
                    .iter()
                    .map(|&(x2, y2)| ((x1 - x2).abs() + (y1 - y2).abs()) as UserDuration)
                    .collect()
            })
            .collect(),
    )
}

pub fn create_location_grid(rows: usize, cols: usize) -> Vec<(i64, i64)> {
    let mut points = Vec::with_capacity(rows * cols);
    for y in 0..rows {
        for x in 0..cols {
            points.push((x as i64, y as i64));
        }
    }
    points
}

/// Vehicle starting and ending at point 0.
pub fn depot_vehicle(id: u64, capacity: Vec<i64>) -> VehicleBuilder {
    let mut builder = VehicleBuilder::default();
    builder
        .set_id(id)
        .set_start_location(0)
        .set_end_location(0)
        .set_capacity(Amount::from_vec(capacity));
    builder
}

/// Problem on explicit points; jobs without a pinned location take points
/// 1, 2, ... in job order.
pub fn create_test_problem(
    points: &[(i64, i64)],
    jobs: Vec<TestJob>,
    vehicles: Vec<VehicleBuilder>,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder.set_locations(
        points
            .iter()
            .enumerate()
            .map(|(index, &(x, y))| Location::with_coordinates(index, x as f64, y as f64))
            .collect(),
    );

    let mut next_location = 1;
    for job in jobs {
        let time_windows = job.time_window.into_iter().collect::<Vec<_>>();
        match job.kind {
            TestJobKind::Delivery | TestJobKind::Pickup => {
                let location = job.location.unwrap_or(next_location);
                next_location += 1;

                let amount = Amount::from_vec(vec![job.amount]);
                let mut job_builder = JobBuilder::default();
                job_builder
                    .set_id(job.id)
                    .set_location(location)
                    .set_service(job.service)
                    .set_priority(job.priority)
                    .set_time_windows(time_windows);
                if matches!(job.kind, TestJobKind::Delivery) {
                    job_builder.set_delivery(amount);
                } else {
                    job_builder.set_pickup(amount);
                }
                builder.add_job(job_builder.build().unwrap());
            }
            TestJobKind::Shipment { delivery_id } => {
                let mut shipment = ShipmentBuilder::default();
                shipment
                    .set_pickup(ShipmentStep {
                        id: job.id,
                        location: next_location,
                        service: job.service,
                        time_windows: time_windows.clone(),
                        ..ShipmentStep::default()
                    })
                    .set_delivery(ShipmentStep {
                        id: delivery_id,
                        location: next_location + 1,
                        service: job.service,
                        time_windows,
                        ..ShipmentStep::default()
                    })
                    .set_amount(Amount::from_vec(vec![job.amount]))
                    .set_priority(job.priority);
                next_location += 2;
                builder.add_shipment(shipment.build().unwrap());
            }
        }
    }

    for vehicle in vehicles {
        builder.add_vehicle(vehicle.build().unwrap());
    }
    builder.set_durations_matrix(DEFAULT_PROFILE, manhattan_matrix(points));

    builder.build().unwrap()
}

/// Jobs on a line: the depot at x = 0 and job (leg) `i` at x = i + 1.
pub fn create_problem_with_jobs(
    jobs: Vec<TestJob>,
    capacity: Vec<i64>,
    number_of_vehicles: usize,
) -> VehicleRoutingProblem {
    let legs: usize = jobs.iter().map(TestJob::legs).sum();
    let points = (0..=legs as i64).map(|x| (x, 0)).collect::<Vec<_>>();
    let vehicles = (0..number_of_vehicles)
        .map(|id| depot_vehicle(id as u64, capacity.clone()))
        .collect();

    create_test_problem(&points, jobs, vehicles)
}

pub struct TestRoute {
    pub vehicle_id: usize,
    pub job_ids: Vec<usize>,
}

pub fn create_test_working_solution<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    routes: Vec<TestRoute>,
) -> WorkingSolution<R> {
    let mut solution: WorkingSolution<R> = WorkingSolution::new(problem);

    for route in routes {
        let jobs = route
            .job_ids
            .iter()
            .copied()
            .map(JobIdx::new)
            .collect::<Vec<_>>();
        solution
            .route_mut(VehicleIdx::new(route.vehicle_id))
            .replace(problem, &jobs, 0, 0);
        for job in jobs {
            solution.mark_assigned(job);
        }
    }

    solution
}

/// Problem, solution and state wired together for operator tests.
pub struct TestSearch<R: WorkingRoute> {
    pub problem: VehicleRoutingProblem,
    pub neighbours: Neighbours,
    pub solution: WorkingSolution<R>,
    pub state: SolutionState,
}

impl<R: WorkingRoute> TestSearch<R> {
    pub fn new(problem: VehicleRoutingProblem, routes: Vec<TestRoute>) -> Self {
        let solution = create_test_working_solution(&problem, routes);
        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);

        TestSearch {
            neighbours: Neighbours::new(&problem),
            problem,
            solution,
            state,
        }
    }

    pub fn ctx(&self) -> SearchContext<'_, R> {
        SearchContext {
            problem: &self.problem,
            neighbours: &self.neighbours,
            solution: &self.solution,
            state: &self.state,
        }
    }

    /// Applies a valid move, checks the announced gain against the solution
    /// cost and the incremental state against a fresh one.
    pub fn apply(&mut self, op: impl Into<LocalSearchMove>) -> Eval {
        let op = op.into();
        let gain = {
            let ctx = self.ctx();
            assert!(op.is_valid(&ctx), "{} move is not valid", op.operator_name());
            op.gain(&ctx)
        };

        let before = self.solution.eval(&self.problem);
        let updated = op.apply(&self.problem, &self.neighbours, &mut self.solution, &self.state);
        for &vehicle_id in &updated {
            self.state.update(&self.problem, self.solution.route(vehicle_id));
        }

        assert_eq!(before - gain, self.solution.eval(&self.problem));
        assert!(self.solution.is_consistent(&self.problem));
        for &vehicle_id in &updated {
            assert!(
                self.solution.route(vehicle_id).is_consistent(&self.problem),
                "route {vehicle_id} is not consistent after {}",
                op.operator_name()
            );
        }

        let mut fresh = SolutionState::new(&self.problem);
        fresh.setup(&self.problem, &self.solution);
        assert_eq!(self.state, fresh);

        gain
    }

    pub fn is_valid(&self, op: impl Into<LocalSearchMove>) -> bool {
        op.into().is_valid(&self.ctx())
    }

    /// Best move of one operator family on a route pair.
    pub fn best_move<O>(&self, s: usize, t: usize) -> Option<(Eval, LocalSearchMove)>
    where
        O: LocalSearchOperator + Into<LocalSearchMove>,
    {
        OperatorNeighbourhood::<O>::default().best_move(
            &self.ctx(),
            (VehicleIdx::new(s), VehicleIdx::new(t)),
            0,
        )
    }

    pub fn route_job_ids(&self, vehicle_id: usize) -> Vec<usize> {
        self.solution
            .route(VehicleIdx::new(vehicle_id))
            .jobs()
            .iter()
            .map(|job| job.get())
            .collect()
    }
}
