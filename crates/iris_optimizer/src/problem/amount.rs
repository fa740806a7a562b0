use std::{
    cmp::Ordering,
    ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[i64; 4]>;

/// Multi-dimensional quantity, one entry per good dimension.
///
/// Ordering is component-wise: `a <= b` holds when every component of `a`
/// is lower or equal to the matching one in `b`, amounts of different
/// sizes are not comparable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Vector);

impl Amount {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Amount(smallvec::smallvec![0; dimensions])
    }

    pub fn from_vec(vec: Vec<i64>) -> Self {
        Amount(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&value| value == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn update_max(&mut self, other: &Amount) {
        for (value, &other) in self.0.iter_mut().zip(other.0.iter()) {
            *value = (*value).max(other);
        }
    }

    /// Lexicographic comparison, used to rank jobs by demand size.
    pub fn lexicographic_cmp(&self, other: &Amount) -> Ordering {
        self.0.cmp(&other.0)
    }

    pub fn set_zero(&mut self) {
        self.0.iter_mut().for_each(|value| *value = 0);
    }
}

impl Index<usize> for Amount {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Amount {
    fn index_mut(&mut self, index: usize) -> &mut i64 {
        &mut self.0[index]
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Amount) -> Option<Ordering> {
        if self.len() != other.len() {
            return None;
        }

        let mut ordering = Ordering::Equal;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.cmp(b) {
                Ordering::Equal => {}
                component if ordering == Ordering::Equal => ordering = component,
                component if component != ordering => return None,
                _ => {}
            }
        }

        Some(ordering)
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, rhs: &Amount) -> Amount {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        debug_assert_eq!(self.len(), rhs.len());
        for (value, &other) in self.0.iter_mut().zip(rhs.0.iter()) {
            *value += other;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        debug_assert_eq!(self.len(), rhs.len());
        for (value, &other) in self.0.iter_mut().zip(rhs.0.iter()) {
            *value -= other;
        }
    }
}
