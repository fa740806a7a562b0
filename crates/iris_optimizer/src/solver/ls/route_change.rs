use smallvec::{SmallVec, smallvec};

use crate::{
    problem::{
        eval::Eval, job::JobIdx, location::LocationIdx, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        ls::search_context::SearchContext,
        solution::{working_route::WorkingRoute, working_solution::WorkingSolution},
    },
};

/// Building block of a modified route, read from the current solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePiece {
    /// Ranks `[first, last)` of the current route of `route`.
    Jobs {
        route: VehicleIdx,
        first: usize,
        last: usize,
        reversed: bool,
    },
    Job(JobIdx),
}

impl RoutePiece {
    pub fn jobs(route: VehicleIdx, first: usize, last: usize) -> Self {
        RoutePiece::Jobs {
            route,
            first,
            last,
            reversed: false,
        }
    }

    pub fn reversed(route: VehicleIdx, first: usize, last: usize) -> Self {
        RoutePiece::Jobs {
            route,
            first,
            last,
            reversed: true,
        }
    }

    pub fn with_reversal(route: VehicleIdx, first: usize, last: usize, reversed: bool) -> Self {
        RoutePiece::Jobs {
            route,
            first,
            last,
            reversed,
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            RoutePiece::Jobs { first, last, .. } => last - first,
            RoutePiece::Job(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First and last job visited, in travel order.
    fn bounds<R: WorkingRoute>(&self, solution: &WorkingSolution<R>) -> (JobIdx, JobIdx) {
        match *self {
            RoutePiece::Jobs {
                route,
                first,
                last,
                reversed,
            } => {
                let jobs = solution.route(route).jobs();
                if reversed {
                    (jobs[last - 1], jobs[first])
                } else {
                    (jobs[first], jobs[last - 1])
                }
            }
            RoutePiece::Job(job) => (job, job),
        }
    }

    fn push_jobs<R: WorkingRoute>(&self, solution: &WorkingSolution<R>, out: &mut Vec<JobIdx>) {
        match *self {
            RoutePiece::Jobs {
                route,
                first,
                last,
                reversed,
            } => {
                let jobs = &solution.route(route).jobs()[first..last];
                if reversed {
                    out.extend(jobs.iter().rev());
                } else {
                    out.extend_from_slice(jobs);
                }
            }
            RoutePiece::Job(job) => out.push(job),
        }
    }
}

/// Replacement of ranks `[first, last)` of one route by a sequence of pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub vehicle_id: VehicleIdx,
    pub first: usize,
    pub last: usize,
    pub inserted: SmallVec<[RoutePiece; 4]>,
}

pub type RouteChanges = SmallVec<[RouteChange; 3]>;

impl RouteChange {
    pub fn new(
        vehicle_id: VehicleIdx,
        first: usize,
        last: usize,
        inserted: impl IntoIterator<Item = RoutePiece>,
    ) -> Self {
        debug_assert!(first <= last);
        RouteChange {
            vehicle_id,
            first,
            last,
            inserted: inserted.into_iter().filter(|piece| !piece.is_empty()).collect(),
        }
    }

    /// Removes ranks `[first, last)`.
    pub fn removal(vehicle_id: VehicleIdx, first: usize, last: usize) -> Self {
        RouteChange {
            vehicle_id,
            first,
            last,
            inserted: SmallVec::new(),
        }
    }

    /// Removes the job at `rank` and inserts `job` before rank `gap` of the
    /// current route. `gap == rank` replaces the job in place.
    pub fn remove_and_insert(vehicle_id: VehicleIdx, rank: usize, gap: usize, job: JobIdx) -> Self {
        if gap <= rank {
            RouteChange::new(
                vehicle_id,
                gap,
                rank + 1,
                [RoutePiece::Job(job), RoutePiece::jobs(vehicle_id, gap, rank)],
            )
        } else {
            RouteChange::new(
                vehicle_id,
                rank,
                gap,
                [RoutePiece::jobs(vehicle_id, rank + 1, gap), RoutePiece::Job(job)],
            )
        }
    }

    pub fn inserted_len(&self) -> usize {
        self.inserted.iter().map(RoutePiece::len).sum()
    }

    /// Jobs replacing ranks `[first, last)`.
    pub fn inserted_jobs<R: WorkingRoute>(&self, solution: &WorkingSolution<R>) -> Vec<JobIdx> {
        let mut jobs = Vec::with_capacity(self.inserted_len());
        for piece in &self.inserted {
            piece.push_jobs(solution, &mut jobs);
        }
        jobs
    }

    fn pieces<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> SmallVec<[RoutePiece; 6]> {
        let len = ctx.route(self.vehicle_id).len();
        let mut pieces: SmallVec<[RoutePiece; 6]> = smallvec![];
        if self.first > 0 {
            pieces.push(RoutePiece::jobs(self.vehicle_id, 0, self.first));
        }
        pieces.extend(self.inserted.iter().copied());
        if self.last < len {
            pieces.push(RoutePiece::jobs(self.vehicle_id, self.last, len));
        }
        pieces
    }

    /// Eval of the whole route once changed, fixed cost included when used.
    pub fn new_eval<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> Eval {
        let problem = ctx.problem;
        let vehicle = problem.vehicle(self.vehicle_id);
        let location = |job: JobIdx| -> Option<LocationIdx> { Some(problem.job_location(job)) };

        let pieces = self.pieces(ctx);
        if pieces.is_empty() {
            return Eval::ZERO;
        }

        let mut eval = Eval::new(vehicle.fixed_cost(), 0);
        let mut previous = vehicle.start();
        for piece in &pieces {
            let (first_job, last_job) = piece.bounds(ctx.solution);
            eval += vehicle.eval_between(previous, location(first_job));
            if let RoutePiece::Jobs {
                route,
                first,
                last,
                reversed,
            } = *piece
            {
                eval += ctx
                    .state
                    .path_eval(route, self.vehicle_id, first, last, reversed);
            }
            previous = location(last_job);
        }

        eval + vehicle.eval_between(previous, vehicle.end())
    }

    pub fn gain<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> Eval {
        ctx.state.route_eval(self.vehicle_id) - self.new_eval(ctx)
    }

    pub fn is_valid<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> bool {
        let problem = ctx.problem;
        let route = ctx.route(self.vehicle_id);
        let vehicle = problem.vehicle(self.vehicle_id);

        for piece in &self.inserted {
            let compatible = match *piece {
                RoutePiece::Job(job) => problem.vehicle_ok_with_job(self.vehicle_id, job),
                RoutePiece::Jobs {
                    route, first, last, ..
                } => {
                    route == self.vehicle_id
                        || ctx
                            .state
                            .is_compatible_range(route, self.vehicle_id, first, last)
                }
            };
            if !compatible {
                return false;
            }
        }

        if route.len() - (self.last - self.first) + self.inserted_len() > vehicle.max_tasks() {
            return false;
        }

        if vehicle.has_max_travel_time()
            && !vehicle.ok_for_travel_time(self.new_eval(ctx).duration)
        {
            return false;
        }

        let jobs = self.inserted_jobs(ctx.solution);

        self.is_valid_for_precedence(ctx, &jobs)
            && route
                .raw()
                .is_valid_replacement_for_capacity(problem, &jobs, self.first, self.last)
            && route.is_valid_addition_for_tw(problem, &jobs, self.first, self.last)
    }

    /// Every shipment leg in `jobs` keeps its partner in this route, on the
    /// right side.
    fn is_valid_for_precedence<R: WorkingRoute>(
        &self,
        ctx: &SearchContext<R>,
        jobs: &[JobIdx],
    ) -> bool {
        let problem = ctx.problem;
        if !problem.has_shipments() {
            return true;
        }

        let legs: SmallVec<[(JobIdx, usize); 8]> = jobs
            .iter()
            .enumerate()
            .filter(|&(_, &job)| !problem.job(job).is_single())
            .map(|(position, &job)| (job, position))
            .collect();

        legs.iter().all(|&(job, position)| {
            let is_pickup = problem.job(job).is_pickup();
            let partner = if is_pickup {
                problem.delivery_of(job)
            } else {
                problem.pickup_of(job)
            };

            if let Some(&(_, partner_position)) = legs.iter().find(|&&(other, _)| other == partner)
            {
                return (partner_position > position) == is_pickup;
            }

            // The partner must stay in this route outside the replaced ranks.
            if ctx.state.job_route(partner) != Some(self.vehicle_id) {
                return false;
            }
            let partner_rank = ctx.state.job_rank(partner);
            if is_pickup {
                partner_rank >= self.last
            } else {
                partner_rank < self.first
            }
        })
    }
}

pub fn changes_gain<R: WorkingRoute>(ctx: &SearchContext<R>, changes: &[RouteChange]) -> Eval {
    changes.iter().map(|change| change.gain(ctx)).sum()
}

pub fn changes_are_valid<R: WorkingRoute>(ctx: &SearchContext<R>, changes: &[RouteChange]) -> bool {
    changes.iter().all(|change| change.is_valid(ctx))
}

/// Applies all changes at once; pieces are read before any route is modified.
pub fn apply_changes<R: WorkingRoute>(
    problem: &VehicleRoutingProblem,
    solution: &mut WorkingSolution<R>,
    changes: &[RouteChange],
) {
    let sequences: SmallVec<[Vec<JobIdx>; 3]> = changes
        .iter()
        .map(|change| change.inserted_jobs(solution))
        .collect();

    for (change, jobs) in changes.iter().zip(sequences) {
        solution
            .route_mut(change.vehicle_id)
            .replace(problem, &jobs, change.first, change.last);
    }
}
