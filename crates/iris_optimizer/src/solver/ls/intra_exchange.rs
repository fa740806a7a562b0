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

/// **Intra-Exchange**
///
/// Swaps the jobs at `first` and `second` within the same route.
///
/// ```text
/// BEFORE:
///    ... (A) -> [F] -> (B) ... (X) -> [S] -> (Y) ...
///
/// AFTER:
///    ... (A) -> [S] -> (B) ... (X) -> [F] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct IntraExchangeOperator {
    params: IntraExchangeOperatorParams,
}

#[derive(Debug)]
pub struct IntraExchangeOperatorParams {
    pub route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
}

impl IntraExchangeOperator {
    pub fn new(params: IntraExchangeOperatorParams) -> Self {
        if params.first >= params.second {
            panic!("IntraExchangeOperator requires first < second");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraExchangeOperator {
    const NAME: &'static str = "intra-exchange";

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
        for first in 0..len {
            for second in first + 1..len {
                consumer(IntraExchangeOperator::new(IntraExchangeOperatorParams {
                    route_id: s,
                    first,
                    second,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let IntraExchangeOperatorParams {
            route_id,
            first,
            second,
        } = self.params;
        let jobs = ctx.route(route_id).jobs();

        smallvec![RouteChange::new(
            route_id,
            first,
            second + 1,
            [
                RoutePiece::Job(jobs[second]),
                RoutePiece::jobs(route_id, first + 1, second),
                RoutePiece::Job(jobs[first]),
            ],
        )]
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::solution::raw_route::RawRoute,
        test_utils::{self, TestJob, TestRoute, TestSearch},
    };

    use super::*;

    #[test]
    fn test_intra_exchange() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=4).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![10],
            1,
        );
        let mut search = TestSearch::<RawRoute>::new(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![2, 1, 0, 3],
            }],
        );

        let gain = search.apply(IntraExchangeOperator::new(IntraExchangeOperatorParams {
            route_id: VehicleIdx::new(0),
            first: 0,
            second: 2,
        }));

        assert_eq!(gain.duration, 400);
        assert_eq!(search.route_job_ids(0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_intra_exchange_adjacent_shipment_legs() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::shipment(1, 2, 1)],
            vec![10],
            1,
        );
        let search = TestSearch::<RawRoute>::new(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 1],
            }],
        );

        assert!(!search.is_valid(IntraExchangeOperator::new(IntraExchangeOperatorParams {
            route_id: VehicleIdx::new(0),
            first: 0,
            second: 1,
        })));
    }
}
