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

/// **Or-Opt**
///
/// Moves the two-job segment starting at `from` in route `s` before rank
/// `to` of route `t`, possibly reversed.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S1 -> S2] -> (B) ...
///    t: ... (X) -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> (B) ...
///    t: ... (X) -> [S1 -> S2] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct OrOptOperator {
    params: OrOptOperatorParams,
}

#[derive(Debug)]
pub struct OrOptOperatorParams {
    pub from_route_id: VehicleIdx,
    pub to_route_id: VehicleIdx,
    pub from: usize,
    pub to: usize,
    pub reversed: bool,
}

impl OrOptOperator {
    pub fn new(params: OrOptOperatorParams) -> Self {
        if params.from_route_id == params.to_route_id {
            panic!("OrOptOperator requires two different routes, use IntraOrOptOperator instead");
        }

        Self { params }
    }
}

impl LocalSearchOperator for OrOptOperator {
    const NAME: &'static str = "or-opt";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s == t {
            return;
        }

        let from_route = ctx.route(s);
        let to_route = ctx.route(t);
        if from_route.len() < 2 {
            return;
        }

        for from in 0..from_route.len() - 1 {
            if !ctx.state.is_compatible_range(s, t, from, from + 2) {
                continue;
            }

            let first_job = from_route.jobs()[from];
            let second_job = from_route.jobs()[from + 1];

            for to in 0..=to_route.len() {
                if !ctx.neighbours.is_candidate_gap(to_route, first_job, to)
                    && !ctx.neighbours.is_candidate_gap(to_route, second_job, to)
                {
                    continue;
                }

                for reversed in [false, true] {
                    consumer(OrOptOperator::new(OrOptOperatorParams {
                        from_route_id: s,
                        to_route_id: t,
                        from,
                        to,
                        reversed,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        let OrOptOperatorParams {
            from_route_id: s,
            to_route_id: t,
            from,
            to,
            reversed,
        } = self.params;

        smallvec![
            RouteChange::removal(s, from, from + 2),
            RouteChange::new(t, to, to, [RoutePiece::with_reversal(s, from, from + 2, reversed)]),
        ]
    }
}
