use serde::Serialize;

/// Constraint broken by a step or a route.
///
/// Solutions produced by the solver never carry any, the check runs when
/// formatting the output and flags any route the search would have got
/// wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "cause")]
pub enum Violation {
    Delay,
    Load,
    MaxTasks,
    MaxTravelTime,
    MissingBreak,
}

/// Adds `violations` to `target`, keeping it sorted and free of duplicates.
pub(crate) fn merge_violations(target: &mut Vec<Violation>, violations: &[Violation]) {
    for &violation in violations {
        if let Err(position) = target.binary_search(&violation) {
            target.insert(position, violation);
        }
    }
}
