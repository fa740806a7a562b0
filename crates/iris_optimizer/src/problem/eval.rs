use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::Serialize;

use super::units::{Cost, Duration};

/// Cost and travel duration of a route, a route part or a delta between two of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Eval {
    pub cost: Cost,
    pub duration: Duration,
}

impl Eval {
    pub const ZERO: Eval = Eval::new(0, 0);
    pub const NO_EVAL: Eval = Eval::new(Cost::MAX, 0);

    pub const fn new(cost: Cost, duration: Duration) -> Self {
        Self { cost, duration }
    }
}

impl Add for Eval {
    type Output = Eval;

    fn add(self, rhs: Eval) -> Eval {
        Eval::new(self.cost + rhs.cost, self.duration + rhs.duration)
    }
}

impl Sub for Eval {
    type Output = Eval;

    fn sub(self, rhs: Eval) -> Eval {
        Eval::new(self.cost - rhs.cost, self.duration - rhs.duration)
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Eval {
        Eval::new(-self.cost, -self.duration)
    }
}

impl AddAssign for Eval {
    fn add_assign(&mut self, rhs: Eval) {
        self.cost += rhs.cost;
        self.duration += rhs.duration;
    }
}

impl SubAssign for Eval {
    fn sub_assign(&mut self, rhs: Eval) {
        self.cost -= rhs.cost;
        self.duration -= rhs.duration;
    }
}

impl std::iter::Sum for Eval {
    fn sum<I: Iterator<Item = Eval>>(iter: I) -> Eval {
        iter.fold(Eval::ZERO, |acc, eval| acc + eval)
    }
}
