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

/// **PD-Shift**
///
/// Moves a whole shipment from route `s` to route `t`: the pickup goes before
/// rank `pickup_to` and the delivery before rank `delivery_to` of `t`.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [P] -> ... -> [D] -> (B) ...
///    t: ... (X) -> (Y) ... (Z) ...
///
/// AFTER:
///    s: ... (A) -> ... -> (B) ...
///    t: ... (X) -> [P] -> (Y) ... [D] -> (Z) ...
/// ```
#[derive(Debug)]
pub struct PdShiftOperator {
    params: PdShiftOperatorParams,
}

#[derive(Debug)]
pub struct PdShiftOperatorParams {
    pub from_route_id: VehicleIdx,
    pub to_route_id: VehicleIdx,
    pub pickup_from: usize,
    pub delivery_from: usize,
    pub pickup_to: usize,
    pub delivery_to: usize,
}

impl PdShiftOperator {
    pub fn new(params: PdShiftOperatorParams) -> Self {
        if params.from_route_id == params.to_route_id {
            panic!("PdShiftOperator requires two different routes");
        }

        if params.pickup_from >= params.delivery_from || params.pickup_to > params.delivery_to {
            panic!("PdShiftOperator pickup must come before its delivery");
        }

        Self { params }
    }
}

impl LocalSearchOperator for PdShiftOperator {
    const NAME: &'static str = "pd-shift";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s == t {
            return;
        }

        let problem = ctx.problem;
        let from_route = ctx.route(s);
        let to_route = ctx.route(t);

        for (pickup_from, &pickup) in from_route.jobs().iter().enumerate() {
            if !problem.job(pickup).is_pickup() || !problem.vehicle_ok_with_job(t, pickup) {
                continue;
            }

            // Nothing to win if taking the shipment out saves nothing.
            if ctx.state.pd_gain(s, pickup_from).cost <= 0 {
                continue;
            }

            let delivery_from = ctx.state.matching_rank(s, pickup_from);
            for pickup_to in 0..=to_route.len() {
                if !ctx.neighbours.is_candidate_gap(to_route, pickup, pickup_to) {
                    continue;
                }

                for delivery_to in pickup_to..=to_route.len() {
                    consumer(PdShiftOperator::new(PdShiftOperatorParams {
                        from_route_id: s,
                        to_route_id: t,
                        pickup_from,
                        delivery_from,
                        pickup_to,
                        delivery_to,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let PdShiftOperatorParams {
            from_route_id: s,
            to_route_id: t,
            pickup_from,
            delivery_from,
            pickup_to,
            delivery_to,
        } = self.params;
        let jobs = ctx.route(s).jobs();

        smallvec![
            RouteChange::new(
                s,
                pickup_from,
                delivery_from + 1,
                [RoutePiece::jobs(s, pickup_from + 1, delivery_from)],
            ),
            RouteChange::new(
                t,
                pickup_to,
                delivery_to,
                [
                    RoutePiece::Job(jobs[pickup_from]),
                    RoutePiece::jobs(t, pickup_to, delivery_to),
                    RoutePiece::Job(jobs[delivery_from]),
                ],
            ),
        ]
    }
}
