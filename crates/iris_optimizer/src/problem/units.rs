/// Durations as given by users, in seconds.
pub type UserDuration = u32;
/// Costs as given by users.
pub type UserCost = u32;

/// Internal scaled duration.
pub type Duration = i64;
/// Internal scaled cost.
pub type Cost = i64;

pub const DURATION_FACTOR: Duration = 100;
pub const COST_FACTOR: Cost = 3600;

pub const DEFAULT_PER_HOUR: UserCost = 3600;

pub fn scale_from_user_duration(duration: UserDuration) -> Duration {
    DURATION_FACTOR * Duration::from(duration)
}

pub fn scale_to_user_duration(duration: Duration) -> UserDuration {
    round_div(duration, DURATION_FACTOR) as UserDuration
}

pub fn scale_from_user_cost(cost: UserCost) -> Cost {
    DURATION_FACTOR * COST_FACTOR * Cost::from(cost)
}

pub fn scale_to_user_cost(cost: Cost) -> UserCost {
    round_div(cost, DURATION_FACTOR * COST_FACTOR) as UserCost
}

/// Rounds half away from zero, inputs are non-negative in practice.
fn round_div(value: i64, divisor: i64) -> i64 {
    if value >= 0 {
        (value + divisor / 2) / divisor
    } else {
        (value - divisor / 2) / divisor
    }
}
