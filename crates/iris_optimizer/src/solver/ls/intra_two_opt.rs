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

/// **Intra-2-Opt**
///
/// Reverses the portion of the route between `from` and `to`, both included.
///
/// ```text
/// BEFORE:
///    ... (A) -> [B -> C -> D] -> (E) ...
///
/// AFTER:
///    ... (A) -> [D -> C -> B] -> (E) ...
/// ```
#[derive(Debug)]
pub struct IntraTwoOptOperator {
    params: IntraTwoOptOperatorParams,
}

#[derive(Debug)]
pub struct IntraTwoOptOperatorParams {
    pub route_id: VehicleIdx,
    pub from: usize,
    pub to: usize,
}

impl IntraTwoOptOperator {
    pub fn new(params: IntraTwoOptOperatorParams) -> Self {
        if params.from >= params.to {
            panic!("IntraTwoOptOperator requires from < to");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraTwoOptOperator {
    const NAME: &'static str = "intra-two-opt";

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
        for from in 0..len {
            for to in from + 1..len {
                consumer(IntraTwoOptOperator::new(IntraTwoOptOperatorParams {
                    route_id: s,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        let IntraTwoOptOperatorParams { route_id, from, to } = self.params;

        smallvec![RouteChange::new(
            route_id,
            from,
            to + 1,
            [RoutePiece::reversed(route_id, from, to + 1)],
        )]
    }
}
