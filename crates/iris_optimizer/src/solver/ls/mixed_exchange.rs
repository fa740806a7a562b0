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

/// **Mixed-Exchange**
///
/// Swaps the job at `first` in route `s` with the two-job segment starting at
/// `second` in route `t`, the segment possibly reversed.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S1] -> (B) ...
///    t: ... (X) -> [T1 -> T2] -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> [T2 -> T1] -> (B) ...
///    t: ... (X) -> [S1] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct MixedExchangeOperator {
    params: MixedExchangeOperatorParams,
}

#[derive(Debug)]
pub struct MixedExchangeOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
    pub reverse_segment: bool,
}

impl MixedExchangeOperator {
    pub fn new(params: MixedExchangeOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("MixedExchangeOperator requires two different routes");
        }

        Self { params }
    }
}

impl LocalSearchOperator for MixedExchangeOperator {
    const NAME: &'static str = "mixed-exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s == t {
            return;
        }

        let first_route = ctx.route(s);
        let second_route = ctx.route(t);
        if first_route.is_empty() || second_route.len() < 2 {
            return;
        }

        for first in 0..first_route.len() {
            for second in 0..second_route.len() - 1 {
                for reverse_segment in [false, true] {
                    consumer(MixedExchangeOperator::new(MixedExchangeOperatorParams {
                        first_route_id: s,
                        second_route_id: t,
                        first,
                        second,
                        reverse_segment,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let MixedExchangeOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
            reverse_segment,
        } = self.params;
        let job = ctx.route(s).jobs()[first];

        smallvec![
            RouteChange::new(
                s,
                first,
                first + 1,
                [RoutePiece::with_reversal(t, second, second + 2, reverse_segment)],
            ),
            RouteChange::new(t, second, second + 2, [RoutePiece::Job(job)]),
        ]
    }
}
