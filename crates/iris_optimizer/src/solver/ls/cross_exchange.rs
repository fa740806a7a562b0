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

/// **Cross-Exchange**
///
/// Swaps the two-job segment starting at `first` in route `s` with the
/// two-job segment starting at `second` in route `t`. Each segment may be
/// inserted reversed.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S1 -> S2] -> (B) ...
///    t: ... (X) -> [T1 -> T2] -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> [T1 -> T2] -> (B) ...
///    t: ... (X) -> [S1 -> S2] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct CrossExchangeOperator {
    params: CrossExchangeOperatorParams,
}

#[derive(Debug)]
pub struct CrossExchangeOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
    /// Segment of `s` is inserted reversed in `t`.
    pub reverse_first: bool,
    /// Segment of `t` is inserted reversed in `s`.
    pub reverse_second: bool,
}

impl CrossExchangeOperator {
    pub fn new(params: CrossExchangeOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("CrossExchangeOperator requires two different routes");
        }

        Self { params }
    }
}

impl LocalSearchOperator for CrossExchangeOperator {
    const NAME: &'static str = "cross-exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s >= t {
            return;
        }

        let first_route = ctx.route(s);
        let second_route = ctx.route(t);
        if first_route.len() < 2 || second_route.len() < 2 {
            return;
        }

        for first in 0..first_route.len() - 1 {
            for second in 0..second_route.len() - 1 {
                for (reverse_first, reverse_second) in
                    [(false, false), (true, false), (false, true), (true, true)]
                {
                    consumer(CrossExchangeOperator::new(CrossExchangeOperatorParams {
                        first_route_id: s,
                        second_route_id: t,
                        first,
                        second,
                        reverse_first,
                        reverse_second,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        let CrossExchangeOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
            reverse_first,
            reverse_second,
        } = self.params;

        smallvec![
            RouteChange::new(
                s,
                first,
                first + 2,
                [RoutePiece::with_reversal(t, second, second + 2, reverse_second)],
            ),
            RouteChange::new(
                t,
                second,
                second + 2,
                [RoutePiece::with_reversal(s, first, first + 2, reverse_first)],
            ),
        ]
    }
}
