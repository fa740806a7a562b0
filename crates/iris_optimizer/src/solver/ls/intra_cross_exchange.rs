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

/// **Intra-Cross-Exchange**
///
/// Swaps two non-overlapping two-job segments of the same route, each one
/// possibly reversed.
///
/// ```text
/// BEFORE:
///    ... (A) -> [F1 -> F2] -> ... -> [S1 -> S2] -> (B) ...
///
/// AFTER:
///    ... (A) -> [S1 -> S2] -> ... -> [F1 -> F2] -> (B) ...
/// ```
#[derive(Debug)]
pub struct IntraCrossExchangeOperator {
    params: IntraCrossExchangeOperatorParams,
}

#[derive(Debug)]
pub struct IntraCrossExchangeOperatorParams {
    pub route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
    pub reverse_first: bool,
    pub reverse_second: bool,
}

impl IntraCrossExchangeOperator {
    pub fn new(params: IntraCrossExchangeOperatorParams) -> Self {
        if params.first + 2 > params.second {
            panic!("IntraCrossExchangeOperator segments overlap");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraCrossExchangeOperator {
    const NAME: &'static str = "intra-cross-exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s != t {
            return;
        }

        let len = ctx.route(s).len();
        if len < 4 {
            return;
        }

        for first in 0..len - 3 {
            for second in first + 2..len - 1 {
                for (reverse_first, reverse_second) in
                    [(false, false), (true, false), (false, true), (true, true)]
                {
                    consumer(IntraCrossExchangeOperator::new(
                        IntraCrossExchangeOperatorParams {
                            route_id: s,
                            first,
                            second,
                            reverse_first,
                            reverse_second,
                        },
                    ));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        let IntraCrossExchangeOperatorParams {
            route_id,
            first,
            second,
            reverse_first,
            reverse_second,
        } = self.params;

        smallvec![RouteChange::new(
            route_id,
            first,
            second + 2,
            [
                RoutePiece::with_reversal(route_id, second, second + 2, reverse_second),
                RoutePiece::jobs(route_id, first + 2, second),
                RoutePiece::with_reversal(route_id, first, first + 2, reverse_first),
            ],
        )]
    }
}
