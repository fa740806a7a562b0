use smallvec::{SmallVec, smallvec};
use tracing::{Level, instrument};

use crate::{
    problem::{job::JobIdx, units::Cost, vehicle::VehicleIdx},
    solver::{
        insertion::addition_eval,
        ls::{
            r#move::{LocalSearchOperator, RoutePair},
            route_change::{RouteChange, RouteChanges},
            search_context::SearchContext,
        },
        solution::working_route::WorkingRoute,
    },
};

const TOP_INSERTIONS: usize = 3;

/// Cheapest insertion gaps of one job in the other route, best first.
type TopInsertions = SmallVec<[(Cost, usize); TOP_INSERTIONS]>;

/// **SWAP\***
///
/// Exchanges the job at `first` in route `s` with the job at `second` in
/// route `t`, each one being reinserted at one of its cheapest positions in
/// the other route instead of in place.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S] -> (B) ... (C) -> (D) ...
///    t: ... (X) -> [T] -> (Y) ...
///
/// AFTER:
///    s: ... (A) -> (B) ... (C) -> [T] -> (D) ...
///    t: ... (X) -> [S] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct SwapStarOperator {
    params: SwapStarOperatorParams,
}

#[derive(Debug)]
pub struct SwapStarOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
    /// Gap of route `s` receiving the job of `t`.
    pub first_gap: usize,
    /// Gap of route `t` receiving the job of `s`.
    pub second_gap: usize,
}

impl SwapStarOperator {
    pub fn new(params: SwapStarOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("SwapStarOperator requires two different routes");
        }

        if params.first_gap == params.first + 1 || params.second_gap == params.second + 1 {
            panic!("SwapStarOperator gap right after the removed job duplicates the in-place swap");
        }

        Self { params }
    }
}

/// Keeps the `TOP_INSERTIONS` cheapest gaps for `job` in route `route_id`.
fn top_insertions<R: WorkingRoute>(
    ctx: &SearchContext<R>,
    route_id: VehicleIdx,
    job: JobIdx,
) -> TopInsertions {
    let route = ctx.route(route_id);
    let mut top = TopInsertions::new();

    for gap in 0..=route.len() {
        let cost = addition_eval(ctx.problem, route, job, gap).cost;
        let position = top.iter().position(|&(other, _)| cost < other);
        match position {
            Some(position) => {
                if top.len() == TOP_INSERTIONS {
                    top.pop();
                }
                top.insert(position, (cost, gap));
            }
            None if top.len() < TOP_INSERTIONS => top.push((cost, gap)),
            None => {}
        }
    }

    top
}

/// Gaps worth trying once the job at `removed` is taken out: the cached ones
/// that do not touch it, and the freed position itself.
fn candidate_gaps(top: &TopInsertions, removed: usize) -> SmallVec<[usize; 4]> {
    let mut gaps: SmallVec<[usize; 4]> = smallvec![removed];
    gaps.extend(
        top.iter()
            .map(|&(_, gap)| gap)
            .filter(|&gap| gap != removed && gap != removed + 1),
    );
    gaps
}

impl LocalSearchOperator for SwapStarOperator {
    const NAME: &'static str = "swap-star";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s >= t {
            return;
        }

        let problem = ctx.problem;
        let first_route = ctx.route(s);
        let second_route = ctx.route(t);
        if first_route.is_empty() || second_route.is_empty() {
            return;
        }

        let movable = |job: JobIdx, to: VehicleIdx| {
            problem.job(job).is_single() && problem.vehicle_ok_with_job(to, job)
        };

        let first_tops: Vec<Option<TopInsertions>> = first_route
            .jobs()
            .iter()
            .map(|&job| movable(job, t).then(|| top_insertions(ctx, t, job)))
            .collect();
        let second_tops: Vec<Option<TopInsertions>> = second_route
            .jobs()
            .iter()
            .map(|&job| movable(job, s).then(|| top_insertions(ctx, s, job)))
            .collect();

        for (first, first_top) in first_tops.iter().enumerate() {
            let Some(first_top) = first_top else {
                continue;
            };

            for (second, second_top) in second_tops.iter().enumerate() {
                let Some(second_top) = second_top else {
                    continue;
                };

                // The job of `t` lands in `s` around the removed job of `s`.
                let first_gaps = candidate_gaps(second_top, first);
                let second_gaps = candidate_gaps(first_top, second);

                for &first_gap in &first_gaps {
                    for &second_gap in &second_gaps {
                        consumer(SwapStarOperator::new(SwapStarOperatorParams {
                            first_route_id: s,
                            second_route_id: t,
                            first,
                            second,
                            first_gap,
                            second_gap,
                        }));
                    }
                }
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let SwapStarOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
            first_gap,
            second_gap,
        } = self.params;
        let first_job = ctx.route(s).jobs()[first];
        let second_job = ctx.route(t).jobs()[second];

        smallvec![
            RouteChange::remove_and_insert(s, first, first_gap, second_job),
            RouteChange::remove_and_insert(t, second, second_gap, first_job),
        ]
    }
}
