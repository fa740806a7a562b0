use fxhash::FxHashMap;

use super::location::LocationIdx;

/// Square lookup table between location indices, rows are sparse.
///
/// Reading a pair that was never set is an invariant violation: matrices are
/// complete before solving starts.
#[derive(Debug, Clone, Default)]
pub struct Matrix<T> {
    size: usize,
    rows: Vec<FxHashMap<usize, T>>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            rows: vec![FxHashMap::default(); size],
        }
    }

    /// Builds a complete matrix from dense rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let size = rows.len();
        let mut matrix = Matrix::new(size);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                matrix.set(i, j, value);
            }
        }
        matrix
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, from: LocationIdx, to: LocationIdx) -> T {
        match self.rows[from.get()].get(&to.get()) {
            Some(&value) => value,
            None => panic!("missing matrix entry from {from} to {to}"),
        }
    }

    pub fn set(&mut self, from: usize, to: usize, value: T) {
        self.rows[from].insert(to, value);
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut matrix = Matrix::<u32>::new(2);
        assert!(!matrix.is_complete());

        matrix.set(0, 1, 5);
        matrix.set(1, 0, 7);
        matrix.set(0, 0, 0);
        matrix.set(1, 1, 0);

        assert!(matrix.is_complete());
        assert_eq!(matrix.get(LocationIdx::new(0), LocationIdx::new(1)), 5);
        assert_eq!(matrix.get(LocationIdx::new(1), LocationIdx::new(0)), 7);
    }

    #[test]
    #[should_panic(expected = "missing matrix entry")]
    fn test_missing_entry_panics() {
        let matrix = Matrix::<u32>::new(2);
        matrix.get(LocationIdx::new(0), LocationIdx::new(1));
    }
}
