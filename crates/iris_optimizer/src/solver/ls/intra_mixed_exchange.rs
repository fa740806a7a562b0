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

/// **Intra-Mixed-Exchange**
///
/// Swaps the job at `single` with the two-job segment starting at `segment`
/// in the same route. The segment may come before or after the job and may
/// be reversed.
///
/// ```text
/// BEFORE:
///    ... (A) -> [J] -> (B) ... (X) -> [S1 -> S2] -> (Y) ...
///
/// AFTER:
///    ... (A) -> [S1 -> S2] -> (B) ... (X) -> [J] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct IntraMixedExchangeOperator {
    params: IntraMixedExchangeOperatorParams,
}

#[derive(Debug)]
pub struct IntraMixedExchangeOperatorParams {
    pub route_id: VehicleIdx,
    pub single: usize,
    pub segment: usize,
    pub reverse_segment: bool,
}

impl IntraMixedExchangeOperator {
    pub fn new(params: IntraMixedExchangeOperatorParams) -> Self {
        if params.single >= params.segment && params.single < params.segment + 2 {
            panic!("IntraMixedExchangeOperator job is part of the segment");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraMixedExchangeOperator {
    const NAME: &'static str = "intra-mixed-exchange";

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
        if len < 3 {
            return;
        }

        for single in 0..len {
            for segment in 0..len - 1 {
                if single >= segment && single < segment + 2 {
                    continue;
                }

                for reverse_segment in [false, true] {
                    consumer(IntraMixedExchangeOperator::new(
                        IntraMixedExchangeOperatorParams {
                            route_id: s,
                            single,
                            segment,
                            reverse_segment,
                        },
                    ));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let IntraMixedExchangeOperatorParams {
            route_id,
            single,
            segment,
            reverse_segment,
        } = self.params;
        let job = RoutePiece::Job(ctx.route(route_id).jobs()[single]);
        let moved = RoutePiece::with_reversal(route_id, segment, segment + 2, reverse_segment);

        let change = if single < segment {
            RouteChange::new(
                route_id,
                single,
                segment + 2,
                [moved, RoutePiece::jobs(route_id, single + 1, segment), job],
            )
        } else {
            RouteChange::new(
                route_id,
                segment,
                single + 1,
                [job, RoutePiece::jobs(route_id, segment + 2, single), moved],
            )
        };

        smallvec![change]
    }
}
