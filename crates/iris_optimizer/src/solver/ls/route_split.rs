use smallvec::{SmallVec, smallvec};
use tracing::{Level, instrument};

use crate::{
    problem::{units::Cost, vehicle::VehicleIdx},
    solver::{
        ls::{
            r#move::{LocalSearchOperator, RoutePair},
            route_change::{RouteChange, RouteChanges, RoutePiece},
            search_context::SearchContext,
        },
        solution::working_route::WorkingRoute,
    },
};

/// Cheapest empty vehicles for one half of the split route.
type BestVehicles = SmallVec<[(Cost, VehicleIdx); 2]>;

/// **Route-Split**
///
/// Cuts route `s` before `rank` and hands both halves to two empty vehicles.
///
/// ```text
/// BEFORE:
///    s:     (start s) -> A1 -> A2 -> [rank] B1 -> B2 -> (end s)
///    begin: empty
///    end:   empty
///
/// AFTER:
///    s:     empty
///    begin: (start) -> A1 -> A2 -> (end)
///    end:   (start) -> B1 -> B2 -> (end)
/// ```
#[derive(Debug)]
pub struct RouteSplitOperator {
    params: RouteSplitOperatorParams,
}

#[derive(Debug)]
pub struct RouteSplitOperatorParams {
    pub route_id: VehicleIdx,
    pub rank: usize,
    pub begin_route_id: VehicleIdx,
    pub end_route_id: VehicleIdx,
}

impl RouteSplitOperator {
    pub fn new(params: RouteSplitOperatorParams) -> Self {
        if params.begin_route_id == params.end_route_id
            || params.begin_route_id == params.route_id
            || params.end_route_id == params.route_id
        {
            panic!("RouteSplitOperator requires three different routes");
        }

        if params.rank == 0 {
            panic!("RouteSplitOperator requires a non-empty first half");
        }

        Self { params }
    }
}

fn keep_best(best: &mut BestVehicles, cost: Cost, vehicle_id: VehicleIdx) {
    let position = best
        .iter()
        .position(|&(other, _)| cost < other)
        .unwrap_or(best.len());
    if position < 2 {
        if best.len() == 2 {
            best.pop();
        }
        best.insert(position, (cost, vehicle_id));
    }
}

impl LocalSearchOperator for RouteSplitOperator {
    const NAME: &'static str = "route-split";

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
        let len = route.len();
        if len < 2 {
            return;
        }

        let empty_vehicles: Vec<VehicleIdx> = ctx
            .solution
            .routes()
            .iter()
            .filter(|other| other.is_empty())
            .map(|other| other.vehicle_id())
            .collect();
        if empty_vehicles.len() < 2 {
            return;
        }

        for rank in 1..len {
            if !route.raw().is_shipment_free_cut(rank) {
                continue;
            }

            let mut best_begin = BestVehicles::new();
            let mut best_end = BestVehicles::new();

            for &vehicle_id in &empty_vehicles {
                if ctx.state.is_compatible_range(s, vehicle_id, 0, rank) {
                    let begin =
                        RouteChange::new(vehicle_id, 0, 0, [RoutePiece::jobs(s, 0, rank)]);
                    keep_best(&mut best_begin, begin.new_eval(ctx).cost, vehicle_id);
                }

                if ctx.state.is_compatible_range(s, vehicle_id, rank, len) {
                    let end = RouteChange::new(vehicle_id, 0, 0, [RoutePiece::jobs(s, rank, len)]);
                    keep_best(&mut best_end, end.new_eval(ctx).cost, vehicle_id);
                }
            }

            for &(_, begin_route_id) in &best_begin {
                for &(_, end_route_id) in &best_end {
                    if begin_route_id == end_route_id {
                        continue;
                    }

                    consumer(RouteSplitOperator::new(RouteSplitOperatorParams {
                        route_id: s,
                        rank,
                        begin_route_id,
                        end_route_id,
                    }));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let RouteSplitOperatorParams {
            route_id,
            rank,
            begin_route_id,
            end_route_id,
        } = self.params;
        let len = ctx.route(route_id).len();

        smallvec![
            RouteChange::removal(route_id, 0, len),
            RouteChange::new(begin_route_id, 0, 0, [RoutePiece::jobs(route_id, 0, rank)]),
            RouteChange::new(end_route_id, 0, 0, [RoutePiece::jobs(route_id, rank, len)]),
        ]
    }
}
