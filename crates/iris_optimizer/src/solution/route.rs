use serde::Serialize;

use crate::{
    problem::{
        amount::Amount,
        units::{Duration, UserCost, UserDuration, scale_to_user_cost, scale_to_user_duration},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{schedule::ScheduledTask, working_route::WorkingRoute},
};

use super::{
    step::{Step, StepType},
    violation::{Violation, merge_violations},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub vehicle: u64,
    pub steps: Vec<Step>,
    /// Travel cost, fixed cost included.
    pub cost: UserCost,
    pub delivery: Amount,
    pub pickup: Amount,
    pub service: UserDuration,
    /// Travel time from start to end.
    pub duration: UserDuration,
    pub waiting_time: UserDuration,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub violations: Vec<Violation>,
}

impl Route {
    /// Formats a non-empty working route, checking every constraint again on
    /// the way.
    pub fn from_working<R: WorkingRoute>(problem: &VehicleRoutingProblem, route: &R) -> Self {
        let vehicle = problem.vehicle(route.vehicle_id());
        let schedule = route.schedule(problem);

        let mut steps = Vec::with_capacity(schedule.steps.len() + 2);
        let mut travel: Duration = 0;
        let mut previous = vehicle.start();
        let mut delivery = problem.zero_amount().clone();
        let mut pickup = problem.zero_amount().clone();
        let mut service = 0;
        let mut priority = 0;

        if let Some(start) = vehicle.start() {
            steps.push(Step::start(
                problem,
                start,
                scale_to_user_duration(schedule.start),
                schedule.start_load.clone(),
            ));
        }

        for scheduled in &schedule.steps {
            let arrival = scale_to_user_duration(scheduled.arrival);
            let waiting_time = scale_to_user_duration(scheduled.waiting_time());

            let step = match scheduled.task {
                ScheduledTask::Job(job_idx) => {
                    let job = problem.job(job_idx);
                    let location = Some(job.location());
                    travel += vehicle.eval_between(previous, location).duration;
                    previous = location;

                    delivery += job.delivery();
                    pickup += job.pickup();
                    service += job.user_service();
                    priority += job.priority();

                    let load = &(&scheduled.load - job.delivery()) + job.pickup();
                    let mut step = Step::job(
                        problem,
                        job,
                        arrival,
                        scale_to_user_duration(travel),
                        waiting_time,
                        load,
                    );
                    if !job
                        .time_windows()
                        .iter()
                        .any(|tw| tw.contains(scheduled.service_start))
                    {
                        step.violations.push(Violation::Delay);
                    }
                    if !(scheduled.load <= *vehicle.capacity() && step.load <= *vehicle.capacity())
                    {
                        step.violations.push(Violation::Load);
                    }
                    step
                }
                ScheduledTask::Break(break_index) => {
                    let vehicle_break = &vehicle.breaks()[break_index];
                    service += vehicle_break.user_service();

                    let mut step = Step::vehicle_break(
                        vehicle_break,
                        arrival,
                        scale_to_user_duration(travel),
                        waiting_time,
                        scheduled.load.clone(),
                    );
                    if !vehicle_break
                        .time_windows()
                        .iter()
                        .any(|tw| tw.contains(scheduled.service_start))
                    {
                        step.violations.push(Violation::Delay);
                    }
                    if !vehicle_break.is_valid_for_load(&scheduled.load) {
                        step.violations.push(Violation::Load);
                    }
                    step
                }
            };

            steps.push(step);
        }

        if let Some(end) = vehicle.end() {
            travel += vehicle.eval_between(previous, Some(end)).duration;
            steps.push(Step::end(
                problem,
                end,
                scale_to_user_duration(schedule.end),
                scale_to_user_duration(travel),
                schedule.end_load.clone(),
            ));
        }

        let mut violations = Vec::new();
        for step in &steps {
            merge_violations(&mut violations, &step.violations);
        }
        if route.len() > vehicle.max_tasks() {
            merge_violations(&mut violations, &[Violation::MaxTasks]);
        }
        if !vehicle.ok_for_travel_time(travel) {
            merge_violations(&mut violations, &[Violation::MaxTravelTime]);
        }
        let breaks = steps
            .iter()
            .filter(|step| step.step_type == StepType::Break)
            .count();
        if breaks < vehicle.breaks().len() {
            merge_violations(&mut violations, &[Violation::MissingBreak]);
        }

        Route {
            vehicle: vehicle.id(),
            waiting_time: steps.iter().map(|step| step.waiting_time).sum(),
            steps,
            cost: scale_to_user_cost(route.eval(problem).cost),
            delivery,
            pickup,
            service,
            duration: scale_to_user_duration(travel),
            priority,
            distance: None,
            geometry: None,
            description: vehicle.description().to_owned(),
            violations,
        }
    }

    /// Steps standing at a location of their own, breaks excluded.
    pub fn located_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps
            .iter()
            .filter(|step| step.step_type != StepType::Break)
    }
}
