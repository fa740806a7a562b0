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

/// **Reverse 2-Opt\***
///
/// The tail of route `s` (from `first` on) and the head of route `t` (up to
/// `second`, excluded) are swapped, each one reversed.
///
/// ```text
/// BEFORE:
///    s: (start) -> A1 | A2 -> A3 -> (end)
///    t: (start) -> B1 -> B2 | B3 -> (end)
///
/// AFTER:
///    s: (start) -> A1 -> B2 -> B1 -> (end)
///    t: (start) -> A3 -> A2 -> B3 -> (end)
/// ```
#[derive(Debug)]
pub struct ReverseTwoOptOperator {
    params: ReverseTwoOptOperatorParams,
}

#[derive(Debug)]
pub struct ReverseTwoOptOperatorParams {
    pub first_route_id: VehicleIdx,
    pub second_route_id: VehicleIdx,
    pub first: usize,
    pub second: usize,
}

impl ReverseTwoOptOperator {
    pub fn new(params: ReverseTwoOptOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("ReverseTwoOptOperator requires two different routes");
        }

        Self { params }
    }
}

impl LocalSearchOperator for ReverseTwoOptOperator {
    const NAME: &'static str = "reverse-two-opt";

    #[instrument(skip_all, level = Level::TRACE)]
    fn generate_moves<R, C>(ctx: &SearchContext<R>, (s, t): RoutePair, mut consumer: C)
    where
        R: WorkingRoute,
        C: FnMut(Self),
    {
        if s == t {
            return;
        }

        let first_len = ctx.route(s).len();
        let second_len = ctx.route(t).len();

        for first in 0..=first_len {
            for second in 0..=second_len {
                if first == first_len && second == 0 {
                    continue;
                }

                consumer(ReverseTwoOptOperator::new(ReverseTwoOptOperatorParams {
                    first_route_id: s,
                    second_route_id: t,
                    first,
                    second,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let ReverseTwoOptOperatorParams {
            first_route_id: s,
            second_route_id: t,
            first,
            second,
        } = self.params;
        let first_len = ctx.route(s).len();

        smallvec![
            RouteChange::new(s, first, first_len, [RoutePiece::reversed(t, 0, second)]),
            RouteChange::new(t, 0, second, [RoutePiece::reversed(s, first, first_len)]),
        ]
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
    fn test_reverse_two_opt() {
        // Route 0 goes east then north, route 1 too but further out.
        let points = [(0, 0), (5, 0), (0, 5), (6, 0), (0, 6)];
        let problem = test_utils::create_test_problem(
            &points,
            (1..=4).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![
                test_utils::depot_vehicle(0, vec![10]),
                test_utils::depot_vehicle(1, vec![10]),
            ],
        );
        let mut search = TestSearch::<RawRoute>::new(
            problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![2, 3],
                },
            ],
        );

        let gain = search.apply(ReverseTwoOptOperator::new(ReverseTwoOptOperatorParams {
            first_route_id: VehicleIdx::new(0),
            second_route_id: VehicleIdx::new(1),
            first: 1,
            second: 1,
        }));

        assert_eq!(gain.duration, 2000);
        assert_eq!(search.route_job_ids(0), vec![0, 2]);
        assert_eq!(search.route_job_ids(1), vec![1, 3]);
    }

    #[test]
    fn test_reverse_two_opt_keeps_shipment_order() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::shipment(1, 2, 1), TestJob::delivery(3, 1)],
            vec![10],
            2,
        );
        let search = TestSearch::<RawRoute>::new(
            problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![2],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![0, 1],
                },
            ],
        );

        // Head [P, D] of route 1 reversed into route 0 gives D before P.
        assert!(!search.is_valid(ReverseTwoOptOperator::new(ReverseTwoOptOperatorParams {
            first_route_id: VehicleIdx::new(0),
            second_route_id: VehicleIdx::new(1),
            first: 1,
            second: 2,
        })));
    }
}
