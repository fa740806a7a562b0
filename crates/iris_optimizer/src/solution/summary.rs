use serde::Serialize;

use crate::problem::amount::Amount;

use super::{
    route::Route,
    violation::{Violation, merge_violations},
};

/// Totals over every route of a solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub cost: u64,
    pub routes: usize,
    pub unassigned: usize,
    pub delivery: Amount,
    pub pickup: Amount,
    pub service: u64,
    pub duration: u64,
    pub waiting_time: u64,
    pub priority: u64,
    /// Only set when every route knows its distance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u64>,
    pub violations: Vec<Violation>,
}

impl Summary {
    pub fn new(routes: &[Route], unassigned: usize, amount_size: usize) -> Self {
        let mut summary = Summary {
            routes: routes.len(),
            unassigned,
            delivery: Amount::with_dimensions(amount_size),
            pickup: Amount::with_dimensions(amount_size),
            distance: Some(0),
            ..Summary::default()
        };

        for route in routes {
            summary.cost += u64::from(route.cost);
            summary.delivery += &route.delivery;
            summary.pickup += &route.pickup;
            summary.service += u64::from(route.service);
            summary.duration += u64::from(route.duration);
            summary.waiting_time += u64::from(route.waiting_time);
            summary.priority += u64::from(route.priority);
            summary.distance = summary
                .distance
                .zip(route.distance)
                .map(|(total, distance)| total + u64::from(distance));
            merge_violations(&mut summary.violations, &route.violations);
        }

        if routes.is_empty() {
            summary.distance = None;
        }

        summary
    }
}
