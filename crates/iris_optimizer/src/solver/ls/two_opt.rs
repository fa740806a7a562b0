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

/// **2-Opt\***
///
/// Swaps the tails of two routes: everything from `first` on in route `s`
/// with everything from `second` on in route `t`.
///
/// ```text
/// BEFORE:
///    s: (start) -> A1 -> A2 | A3 -> A4 -> (end)
///    t: (start) -> B1 | B2 -> B3 -> (end)
///
/// AFTER:
///    s: (start) -> A1 -> A2 -> B2 -> B3 -> (end)
///    t: (start) -> B1 -> A3 -> A4 -> (end)
/// ```
#[derive(Debug)]
pub struct TwoOptOperator {
    params: TwoOptOperatorParams,
}

#[derive(Debug)]
pub struct TwoOptOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    /// Cut rank in `s`, the tail starts here.
    pub first: usize,
    /// Cut rank in `t`.
    pub second: usize,
}

impl TwoOptOperator {
    pub fn new(params: TwoOptOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("TwoOptOperator requires two different routes");
        }

        Self { params }
    }
}

impl LocalSearchOperator for TwoOptOperator {
    const NAME: &'static str = "two-opt";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s >= t {
            return;
        }

        let first_len = ctx.route(s).len();
        let second_len = ctx.route(t).len();

        for first in 0..=first_len {
            for second in 0..=second_len {
                // Swapping two empty tails changes nothing, swapping the
                // whole routes is a route exchange.
                if (first == first_len && second == second_len) || (first == 0 && second == 0) {
                    continue;
                }

                consumer(TwoOptOperator::new(TwoOptOperatorParams {
                    first_route_id: s,
                    second_route_id: t,
                    first,
                    second,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let TwoOptOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
        } = self.params;
        let first_len = ctx.route(s).len();
        let second_len = ctx.route(t).len();

        smallvec![
            RouteChange::new(s, first, first_len, [RoutePiece::jobs(t, second, second_len)]),
            RouteChange::new(t, second, second_len, [RoutePiece::jobs(s, first, first_len)]),
        ]
    }
}
