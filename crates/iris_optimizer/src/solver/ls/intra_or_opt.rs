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

/// **Intra-Or-Opt**
///
/// Moves the two-job segment starting at `from` before rank `to` of the same
/// route, possibly reversed.
///
/// ```text
/// BEFORE:
///    ... (A) -> [S1 -> S2] -> (B) ... (X) -> (Y) ...
///
/// AFTER:
///    ... (A) -> (B) ... (X) -> [S1 -> S2] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct IntraOrOptOperator {
    params: IntraOrOptOperatorParams,
}

#[derive(Debug)]
pub struct IntraOrOptOperatorParams {
    pub route_id: VehicleIdx,
    pub from: usize,
    pub to: usize,
    pub reversed: bool,
}

impl IntraOrOptOperator {
    pub fn new(params: IntraOrOptOperatorParams) -> Self {
        if params.to >= params.from && params.to <= params.from + 2 {
            panic!("IntraOrOptOperator target gap touches the segment");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraOrOptOperator {
    const NAME: &'static str = "intra-or-opt";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s != t {
            return;
        }

        let route = ctx.route(s);
        if route.len() < 3 {
            return;
        }

        for from in 0..route.len() - 1 {
            let first_job = route.jobs()[from];
            let second_job = route.jobs()[from + 1];

            for to in 0..=route.len() {
                if to >= from && to <= from + 2 {
                    continue;
                }

                if !ctx.neighbours.is_candidate_gap(route, first_job, to)
                    && !ctx.neighbours.is_candidate_gap(route, second_job, to)
                {
                    continue;
                }

                for reversed in [false, true] {
                    consumer(IntraOrOptOperator::new(IntraOrOptOperatorParams {
                        route_id: s,
                        from,
                        to,
                        reversed,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        let IntraOrOptOperatorParams {
            route_id,
            from,
            to,
            reversed,
        } = self.params;
        let segment = RoutePiece::with_reversal(route_id, from, from + 2, reversed);

        let change = if to < from {
            RouteChange::new(
                route_id,
                to,
                from + 2,
                [segment, RoutePiece::jobs(route_id, to, from)],
            )
        } else {
            RouteChange::new(
                route_id,
                from,
                to,
                [RoutePiece::jobs(route_id, from + 2, to), segment],
            )
        };

        smallvec![change]
    }
}
