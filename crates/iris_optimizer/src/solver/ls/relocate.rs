use smallvec::smallvec;
use tracing::{Level, instrument};

use crate::{
    problem::vehicle::VehicleIdx,
    solver::{
        ls::{
            r#move::{LocalSearchOperator, RoutePair},
            route_change::{RouteChange, RouteChanges, RoutePiece},
            search_context::SearchContext,
        },
        solution::working_route::WorkingRoute,
    },
};

/// **Relocate**
///
/// Moves the job at `from` in route `s` before rank `to` of route `t`.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [J] -> (B) ...
///    t: ... (X) -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> (B) ...
///    t: ... (X) -> [J] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct RelocateOperator {
    params: RelocateOperatorParams,
}

#[derive(Debug)]
pub struct RelocateOperatorParams {
    pub from_route_id: VehicleIdx,
    pub to_route_id: VehicleIdx,
    pub from: usize,
    pub to: usize,
}

impl RelocateOperator {
    pub fn new(params: RelocateOperatorParams) -> Self {
        if params.from_route_id == params.to_route_id {
            panic!("RelocateOperator requires two different routes, use IntraRelocateOperator instead");
        }

        Self { params }
    }
}

impl LocalSearchOperator for RelocateOperator {
    const NAME: &'static str = "relocate";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s == t {
            return;
        }

        let problem = ctx.problem;
        let from_route = ctx.route(s);
        let to_route = ctx.route(t);

        for (from, &job) in from_route.jobs().iter().enumerate() {
            if !problem.job(job).is_single() || !problem.vehicle_ok_with_job(t, job) {
                continue;
            }

            let (begin, end) = ctx.state.insertion_ranks(t, job);
            for to in begin..end.min(to_route.len() + 1) {
                if !ctx.neighbours.is_candidate_gap(to_route, job, to) {
                    continue;
                }

                consumer(RelocateOperator::new(RelocateOperatorParams {
                    from_route_id: s,
                    to_route_id: t,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let RelocateOperatorParams {
            from_route_id: s,
            to_route_id: t,
            from,
            to,
        } = self.params;
        let job = ctx.route(s).jobs()[from];

        smallvec![
            RouteChange::removal(s, from, from + 1),
            RouteChange::new(t, to, to, [RoutePiece::Job(job)]),
        ]
    }
}
