use crate::problem::{
    amount::Amount,
    job::JobIdx,
    units::Duration,
    vehicle::{Vehicle, VehicleIdx},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    raw_route::RawRoute,
    schedule::{RouteSchedule, ScheduledStep, ScheduledTask},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledBreak {
    break_index: usize,
    /// Taken right before travelling to this rank, `len` for the route end.
    before_rank: usize,
    start: Duration,
}

/// Route with time-window bookkeeping on top of its raw sequence.
///
/// Without breaks, `earliest[i]`/`latest[i]` bound the service start at rank
/// `i` so that insertions are checked in time proportional to the inserted
/// sequence. Vehicles with breaks are checked by replaying the whole route.
#[derive(Debug, Clone)]
pub struct TwRoute {
    raw: RawRoute,
    arrivals: Vec<Duration>,
    earliest: Vec<Duration>,
    latest: Vec<Duration>,
    earliest_end: Duration,
    breaks: Vec<ScheduledBreak>,
}

struct Simulation {
    arrivals: Vec<Duration>,
    starts: Vec<Duration>,
    breaks: Vec<ScheduledBreak>,
    end: Duration,
}

/// Forward pass from the vehicle start, waiting for windows and placing
/// breaks greedily. A break goes before the next job when it fits in the
/// waiting time or would be missed otherwise, and is postponed while the
/// load on board exceeds its max load. `None` when a window or a break max
/// load is violated.
fn simulate(
    problem: &VehicleRoutingProblem,
    vehicle: &Vehicle,
    jobs: &[JobIdx],
) -> Option<Simulation> {
    let breaks = vehicle.breaks();

    let mut load = problem.zero_amount().clone();
    for &job_idx in jobs {
        let job = problem.job(job_idx);
        if job.is_single() {
            load += job.delivery();
        }
    }

    let mut time = vehicle.time_window().start();
    let mut location = vehicle.start();
    let mut next_break = 0;
    let mut simulation = Simulation {
        arrivals: Vec::with_capacity(jobs.len()),
        starts: Vec::with_capacity(jobs.len()),
        breaks: Vec::new(),
        end: 0,
    };

    for (rank, &job_idx) in jobs.iter().enumerate() {
        let job = problem.job(job_idx);
        let travel = vehicle.eval_between(location, Some(job.location())).duration;

        while let Some(vehicle_break) = breaks.get(next_break) {
            let break_start = vehicle_break.earliest_start(time)?;
            let job_start = job.earliest_start(time + travel)?;
            let done = job_start + job.service();

            let fits_in_waiting = break_start + vehicle_break.service() + travel <= job_start;
            let forced = vehicle_break.earliest_start(done).is_none();
            if !fits_in_waiting && !forced {
                break;
            }

            if !vehicle_break.is_valid_for_load(&load) {
                if forced {
                    return None;
                }
                break;
            }
            simulation.breaks.push(ScheduledBreak {
                break_index: next_break,
                before_rank: rank,
                start: break_start,
            });
            time = break_start + vehicle_break.service();
            next_break += 1;
        }

        let arrival = time + travel;
        let start = job.earliest_start(arrival)?;
        simulation.arrivals.push(arrival);
        simulation.starts.push(start);

        time = start + job.service();
        location = Some(job.location());
        load -= job.delivery();
        load += job.pickup();
    }

    for (break_index, vehicle_break) in breaks.iter().enumerate().skip(next_break) {
        let break_start = vehicle_break.earliest_start(time)?;
        if !vehicle_break.is_valid_for_load(&load) {
            return None;
        }
        simulation.breaks.push(ScheduledBreak {
            break_index,
            before_rank: jobs.len(),
            start: break_start,
        });
        time = break_start + vehicle_break.service();
    }

    simulation.end = time + vehicle.eval_between(location, vehicle.end()).duration;
    if simulation.end > vehicle.time_window().end() {
        return None;
    }

    Some(simulation)
}

impl TwRoute {
    /// Empty route, the problem build guarantees its breaks fit the vehicle
    /// time window.
    pub fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let mut route = Self {
            raw: RawRoute::new(problem, vehicle_id),
            arrivals: Vec::new(),
            earliest: Vec::new(),
            latest: Vec::new(),
            earliest_end: 0,
            breaks: Vec::new(),
        };
        route.update_schedule(problem);
        route
    }

    pub fn raw(&self) -> &RawRoute {
        &self.raw
    }

    pub fn earliest(&self, rank: usize) -> Duration {
        self.earliest[rank]
    }

    pub fn latest(&self, rank: usize) -> Duration {
        self.latest[rank]
    }

    pub fn earliest_end(&self) -> Duration {
        self.earliest_end
    }

    /// Time-window check for replacing ranks `[first, last)` with `jobs`.
    pub fn is_valid_addition_for_tw(
        &self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) -> bool {
        let vehicle = problem.vehicle(self.raw.vehicle_id());

        if vehicle.has_breaks() {
            let route = self.raw.jobs();
            let mut candidate = Vec::with_capacity(route.len() + jobs.len() - (last - first));
            candidate.extend_from_slice(&route[..first]);
            candidate.extend_from_slice(jobs);
            candidate.extend_from_slice(&route[last..]);

            return simulate(problem, vehicle, &candidate).is_some();
        }

        let (mut time, mut location) = if first == 0 {
            (vehicle.time_window().start(), vehicle.start())
        } else {
            let previous = self.raw.jobs()[first - 1];
            (
                self.earliest[first - 1] + problem.job(previous).service(),
                Some(problem.job_location(previous)),
            )
        };

        for &job_idx in jobs {
            let job = problem.job(job_idx);
            let arrival = time + vehicle.eval_between(location, Some(job.location())).duration;
            let Some(start) = job.earliest_start(arrival) else {
                return false;
            };
            time = start + job.service();
            location = Some(job.location());
        }

        if last < self.raw.len() {
            let next = self.raw.jobs()[last];
            let arrival =
                time + vehicle.eval_between(location, Some(problem.job_location(next))).duration;
            arrival <= self.latest[last]
        } else {
            time + vehicle.eval_between(location, vehicle.end()).duration
                <= vehicle.time_window().end()
        }
    }

    pub fn replace(
        &mut self,
        problem: &VehicleRoutingProblem,
        jobs: &[JobIdx],
        first: usize,
        last: usize,
    ) {
        debug_assert!(
            self.is_valid_addition_for_tw(problem, jobs, first, last),
            "time-window infeasible replacement on vehicle {}",
            self.raw.vehicle_id()
        );

        self.raw.replace(problem, jobs, first, last);
        self.update_schedule(problem);
    }

    fn update_schedule(&mut self, problem: &VehicleRoutingProblem) {
        let vehicle = problem.vehicle(self.raw.vehicle_id());
        let jobs = self.raw.jobs();

        let Some(simulation) = simulate(problem, vehicle, jobs) else {
            panic!(
                "committed route for vehicle {} violates its time windows",
                vehicle.id()
            );
        };

        self.arrivals = simulation.arrivals;
        self.earliest = simulation.starts;
        self.breaks = simulation.breaks;
        self.earliest_end = simulation.end;

        // Latest service starts, ignoring breaks which only push times later.
        self.latest.clear();
        self.latest.resize(jobs.len(), 0);
        let mut next_location = vehicle.end();
        let mut next_latest = vehicle.time_window().end();
        for rank in (0..jobs.len()).rev() {
            let job = problem.job(jobs[rank]);
            let travel = vehicle
                .eval_between(Some(job.location()), next_location)
                .duration;
            let bound = next_latest - travel - job.service();
            let latest = job.latest_start(bound).unwrap_or(self.earliest[rank]);

            self.latest[rank] = latest;
            next_latest = latest;
            next_location = Some(job.location());
        }
    }

    /// Ranks `[begin, end)` where `job` may be inserted without an obvious
    /// time-window violation.
    pub fn insertion_ranks(&self, problem: &VehicleRoutingProblem, job_idx: JobIdx) -> (usize, usize) {
        let vehicle = problem.vehicle(self.raw.vehicle_id());
        let job = problem.job(job_idx);
        let jobs = self.raw.jobs();

        let mut begin = 0;
        let mut end = jobs.len() + 1;

        for (rank, &other_idx) in jobs.iter().enumerate() {
            let other = problem.job(other_idx);

            let job_first_done = job.first_start() + job.service();
            if job_first_done + vehicle.duration(job.location(), other.location()) > self.latest[rank] {
                begin = rank + 1;
            }

            let other_done = self.earliest[rank] + other.service();
            if end == jobs.len() + 1
                && other_done + vehicle.duration(other.location(), job.location()) > job.last_end()
            {
                end = rank + 1;
            }
        }

        (begin, end.max(begin))
    }

    pub fn schedule(&self, problem: &VehicleRoutingProblem) -> RouteSchedule {
        let vehicle = problem.vehicle(self.raw.vehicle_id());
        let jobs = self.raw.jobs();

        let mut steps = Vec::with_capacity(jobs.len() + self.breaks.len());
        let mut breaks = self.breaks.iter().peekable();

        // Breaks are taken where the vehicle stands, arrival equals departure
        // from the previous task.
        let mut time = vehicle.time_window().start();
        for rank in 0..=jobs.len() {
            while let Some(scheduled) = breaks.next_if(|b| b.before_rank == rank) {
                let vehicle_break = &vehicle.breaks()[scheduled.break_index];
                steps.push(ScheduledStep {
                    task: ScheduledTask::Break(scheduled.break_index),
                    arrival: time,
                    service_start: scheduled.start,
                    load: self.raw.load_at(rank).clone(),
                });
                time = scheduled.start + vehicle_break.service();
            }

            if rank < jobs.len() {
                steps.push(ScheduledStep {
                    task: ScheduledTask::Job(jobs[rank]),
                    arrival: self.arrivals[rank],
                    service_start: self.earliest[rank],
                    load: self.raw.load_at(rank).clone(),
                });
                time = self.earliest[rank] + problem.job(jobs[rank]).service();
            }
        }

        RouteSchedule {
            start: vehicle.time_window().start(),
            start_load: self.raw.load_at(0).clone(),
            steps,
            end: self.earliest_end,
            end_load: self.raw.load_at(jobs.len()).clone(),
        }
    }

    /// Loads and schedule agree with a replay from scratch.
    pub fn is_consistent(&self, problem: &VehicleRoutingProblem) -> bool {
        let vehicle = problem.vehicle(self.raw.vehicle_id());
        simulate(problem, vehicle, self.raw.jobs()).is_some_and(|simulation| {
            simulation.starts == self.earliest
                && simulation.end == self.earliest_end
                && simulation
                    .starts
                    .iter()
                    .zip(self.raw.jobs())
                    .all(|(&start, &job)| {
                        problem
                            .job(job)
                            .time_windows()
                            .iter()
                            .any(|tw| tw.contains(start))
                    })
        }) && self.capacity_respected(problem)
    }

    fn capacity_respected(&self, problem: &VehicleRoutingProblem) -> bool {
        let capacity: &Amount = problem.vehicle(self.raw.vehicle_id()).capacity();
        self.raw.max_load() <= capacity
    }
}
