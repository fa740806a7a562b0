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

/// **Exchange**
///
/// Swaps the job at `first` in route `s` with the job at `second` in route `t`.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S] -> (B) ...
///    t: ... (X) -> [T] -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> [T] -> (B) ...
///    t: ... (X) -> [S] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct ExchangeOperator {
    params: ExchangeOperatorParams,
}

#[derive(Debug)]
pub struct ExchangeOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
}

impl ExchangeOperator {
    pub fn new(params: ExchangeOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("ExchangeOperator requires two different routes, use IntraExchangeOperator instead");
        }

        Self { params }
    }
}

impl LocalSearchOperator for ExchangeOperator {
    const NAME: &'static str = "exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s >= t {
            return;
        }

        let problem = ctx.problem;
        let first_route = ctx.route(s);
        let second_route = ctx.route(t);

        for (first, &first_job) in first_route.jobs().iter().enumerate() {
            if !problem.job(first_job).is_single() || !problem.vehicle_ok_with_job(t, first_job) {
                continue;
            }

            for (second, &second_job) in second_route.jobs().iter().enumerate() {
                if !problem.job(second_job).is_single()
                    || !problem.vehicle_ok_with_job(s, second_job)
                {
                    continue;
                }

                consumer(ExchangeOperator::new(ExchangeOperatorParams {
                    first_route_id: s,
                    second_route_id: t,
                    first,
                    second,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let ExchangeOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
        } = self.params;
        let first_job = ctx.route(s).jobs()[first];
        let second_job = ctx.route(t).jobs()[second];

        smallvec![
            RouteChange::new(s, first, first + 1, [RoutePiece::Job(second_job)]),
            RouteChange::new(t, second, second + 1, [RoutePiece::Job(first_job)]),
        ]
    }
}
