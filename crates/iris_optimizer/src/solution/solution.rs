use serde::Serialize;

use crate::{
    error::SolverError,
    problem::{
        job::{Job, JobType},
        location::{Coordinates, LocationIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{working_route::WorkingRoute, working_solution::WorkingSolution},
};

use super::{route::Route, summary::Summary};

pub const OK_CODE: u32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnassignedJob {
    pub id: u64,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub location_index: LocationIdx,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl UnassignedJob {
    fn new(problem: &VehicleRoutingProblem, job: &Job) -> Self {
        UnassignedJob {
            id: job.id(),
            job_type: job.job_type(),
            location_index: job.location(),
            location: problem.location(job.location()).coordinates(),
            description: job.description().to_owned(),
        }
    }
}

/// Final answer of a solve: the used routes in vehicle order and the jobs
/// left out, or the error that stopped the solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary: Summary,
    pub unassigned: Vec<UnassignedJob>,
    pub routes: Vec<Route>,
}

impl Solution {
    pub fn from_working<R: WorkingRoute>(
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution<R>,
    ) -> Self {
        let routes: Vec<Route> = solution
            .routes()
            .iter()
            .filter(|route| !route.is_empty())
            .map(|route| Route::from_working(problem, route))
            .collect();
        let unassigned: Vec<UnassignedJob> = solution
            .unassigned()
            .iter()
            .map(|&job| UnassignedJob::new(problem, problem.job(job)))
            .collect();

        Solution {
            code: OK_CODE,
            error: None,
            summary: Summary::new(&routes, unassigned.len(), problem.amount_size()),
            unassigned,
            routes,
        }
    }

    pub fn from_error(error: &SolverError) -> Self {
        Solution {
            code: error.code(),
            error: Some(error.to_string()),
            summary: Summary::default(),
            unassigned: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }

    /// Recomputes the summary once routes changed, e.g. after distances and
    /// geometries were added.
    pub fn update_summary(&mut self, amount_size: usize) {
        self.summary = Summary::new(&self.routes, self.unassigned.len(), amount_size);
    }
}
