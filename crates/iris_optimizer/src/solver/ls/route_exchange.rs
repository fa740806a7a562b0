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

/// **Route-Exchange**
///
/// Swaps the whole job sequences of two vehicles.
///
/// ```text
/// BEFORE:
///    s: (start s) -> A1 -> A2 -> (end s)
///    t: (start t) -> B1 -> (end t)
///
/// AFTER:
///    s: (start s) -> B1 -> (end s)
///    t: (start t) -> A1 -> A2 -> (end t)
/// ```
#[derive(Debug)]
pub struct RouteExchangeOperator {
    params: RouteExchangeOperatorParams,
}

#[derive(Debug)]
pub struct RouteExchangeOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
}

impl RouteExchangeOperator {
    pub fn new(params: RouteExchangeOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("RouteExchangeOperator requires two different routes");
        }

        Self { params }
    }
}

impl LocalSearchOperator for RouteExchangeOperator {
    const NAME: &'static str = "route-exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s >= t || (ctx.route(s).is_empty() && ctx.route(t).is_empty()) {
            return;
        }

        consumer(RouteExchangeOperator::new(RouteExchangeOperatorParams {
            first_route_id: s,
            second_route_id: t,
        }));
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let RouteExchangeOperatorParams {
            first_route_id: s,
            second_route_id: t,
        } = self.params;
        let first_len = ctx.route(s).len();
        let second_len = ctx.route(t).len();

        smallvec![
            RouteChange::new(s, 0, first_len, [RoutePiece::jobs(t, 0, second_len)]),
            RouteChange::new(t, 0, second_len, [RoutePiece::jobs(s, 0, first_len)]),
        ]
    }
}
