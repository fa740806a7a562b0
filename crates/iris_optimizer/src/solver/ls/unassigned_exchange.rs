use smallvec::smallvec;
use tracing::{Level, instrument};

use crate::{
    problem::{job::JobIdx, vehicle::VehicleIdx},
    solver::{
        ls::{
            r#move::{LocalSearchOperator, RoutePair, UnassignedChange},
            route_change::{RouteChange, RouteChanges},
            search_context::SearchContext,
        },
        solution::working_route::WorkingRoute,
    },
};

/// **Unassigned Exchange**
///
/// Takes the job at `rank` out of the route and brings an unassigned job of
/// at least the same priority in, before rank `gap`.
///
/// ```text
/// BEFORE:
///    Route:      ... (A) -> [rank] -> (B) ... (X) -> (Y) ...
///    Unassigned: { U }
///
/// AFTER:
///    Route:      ... (A) -> (B) ... (X) -> [U] -> (Y) ...
///    Unassigned: { rank }
/// ```
#[derive(Debug)]
pub struct UnassignedExchangeOperator {
    params: UnassignedExchangeOperatorParams,
}

#[derive(Debug)]
pub struct UnassignedExchangeOperatorParams {
    pub route_id: VehicleIdx,
    pub rank: usize,
    pub removed: JobIdx,
    /// Rank in the current route the unassigned job goes before.
    pub gap: usize,
    pub unassigned: JobIdx,
}

impl UnassignedExchangeOperator {
    pub fn new(params: UnassignedExchangeOperatorParams) -> Self {
        if params.gap == params.rank + 1 {
            panic!("UnassignedExchangeOperator gap right after the removed job duplicates the in-place exchange");
        }

        Self { params }
    }
}

impl LocalSearchOperator for UnassignedExchangeOperator {
    const NAME: &'static str = "unassigned-exchange";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s != t {
            return;
        }

        let problem = ctx.problem;
        let route = ctx.route(s);

        for &unassigned in ctx.solution.unassigned() {
            let job = problem.job(unassigned);
            if !job.is_single() || !problem.vehicle_ok_with_job(s, unassigned) {
                continue;
            }

            let (begin, end) = ctx.state.insertion_ranks(s, unassigned);

            for (rank, &routed) in route.jobs().iter().enumerate() {
                let routed_job = problem.job(routed);
                if !routed_job.is_single() || routed_job.priority() > job.priority() {
                    continue;
                }

                for gap in 0..=route.len() {
                    if gap == rank + 1 {
                        continue;
                    }

                    let in_place = gap == rank;
                    if !in_place
                        && (gap < begin
                            || gap >= end
                            || !ctx.neighbours.is_candidate_gap(route, unassigned, gap))
                    {
                        continue;
                    }

                    consumer(UnassignedExchangeOperator::new(
                        UnassignedExchangeOperatorParams {
                            route_id: s,
                            rank,
                            removed: routed,
                            gap,
                            unassigned,
                        },
                    ));
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, _ctx: &SearchContext<R>) -> RouteChanges {
        smallvec![RouteChange::remove_and_insert(
            self.params.route_id,
            self.params.rank,
            self.params.gap,
            self.params.unassigned,
        )]
    }

    fn unassigned_change(&self) -> Option<UnassignedChange> {
        Some(UnassignedChange {
            assigned: self.params.unassigned,
            unassigned: self.params.removed,
        })
    }
}
