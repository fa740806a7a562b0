use smallvec::smallvec;
use tracing::{Level, instrument};

use crate::{
    problem::vehicle::VehicleIdx,
    solver::{
        ls::{
            r#move::{LocalSearchOperator, RoutePair},
            route_change::{RouteChange, RouteChanges},
            search_context::SearchContext,
        },
        solution::working_route::WorkingRoute,
    },
};

/// **Intra-Relocate**
///
/// Moves the job at `from` before rank `to` of the same route, ranks being
/// read on the route before the move.
///
/// ```text
/// BEFORE:
///    ... (A) -> [J] -> (B) ... (X) -> (Y) ...
///
/// AFTER:
///    ... (A) -> (B) ... (X) -> [J] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct IntraRelocateOperator {
    params: IntraRelocateOperatorParams,
}

#[derive(Debug)]
pub struct IntraRelocateOperatorParams {
    pub route_id: VehicleIdx,
    pub from: usize,
    pub to: usize,
}

impl IntraRelocateOperator {
    pub fn new(params: IntraRelocateOperatorParams) -> Self {
        if params.to == params.from || params.to == params.from + 1 {
            panic!("IntraRelocateOperator target gap leaves the route unchanged");
        }

        Self { params }
    }
}

impl LocalSearchOperator for IntraRelocateOperator {
    const NAME: &'static str = "intra-relocate";

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
        for (from, &job) in route.jobs().iter().enumerate() {
            for to in 0..=route.len() {
                if to == from || to == from + 1 {
                    continue;
                }

                if !ctx.neighbours.is_candidate_gap(route, job, to) {
                    continue;
                }

                consumer(IntraRelocateOperator::new(IntraRelocateOperatorParams {
                    route_id: s,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes<R: WorkingRoute>(&self, ctx: &SearchContext<R>) -> RouteChanges {
        let IntraRelocateOperatorParams { route_id, from, to } = self.params;
        let job = ctx.route(route_id).jobs()[from];

        smallvec![RouteChange::remove_and_insert(route_id, from, to, job)]
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
    fn test_intra_relocate_forward() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=3).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![10],
            1,
        );
        let mut search = TestSearch::<RawRoute>::new(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![1, 0, 2],
            }],
        );

        let gain = search.apply(IntraRelocateOperator::new(IntraRelocateOperatorParams {
            route_id: VehicleIdx::new(0),
            from: 0,
            to: 2,
        }));

        assert_eq!(gain.duration, 200);
        assert_eq!(search.route_job_ids(0), vec![0, 1, 2]);
    }

    #[test]
    fn test_intra_relocate_backward() {
        let problem = test_utils::create_problem_with_jobs(
            (1..=3).map(|id| TestJob::delivery(id, 1)).collect(),
            vec![10],
            1,
        );
        let mut search = TestSearch::<RawRoute>::new(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![1, 0, 2],
            }],
        );

        let gain = search.apply(IntraRelocateOperator::new(IntraRelocateOperatorParams {
            route_id: VehicleIdx::new(0),
            from: 1,
            to: 0,
        }));

        assert_eq!(gain.duration, 200);
        assert_eq!(search.route_job_ids(0), vec![0, 1, 2]);
    }

    #[test]
    fn test_intra_relocate_delivery_before_pickup() {
        let problem = test_utils::create_problem_with_jobs(
            vec![TestJob::shipment(1, 2, 1), TestJob::delivery(3, 1)],
            vec![10],
            1,
        );
        let search = TestSearch::<RawRoute>::new(
            problem,
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 2, 1],
            }],
        );

        assert!(!search.is_valid(IntraRelocateOperator::new(IntraRelocateOperatorParams {
            route_id: VehicleIdx::new(0),
            from: 2,
            to: 0,
        })));
        assert!(search.is_valid(IntraRelocateOperator::new(IntraRelocateOperatorParams {
            route_id: VehicleIdx::new(0),
            from: 2,
            to: 1,
        })));
    }
}
