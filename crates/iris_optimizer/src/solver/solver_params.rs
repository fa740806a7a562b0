use jiff::SignedDuration;

use super::construction::heuristic_params::{
    HETEROGENEOUS_PARAMETERS, HOMOGENEOUS_PARAMETERS, HeuristicParameters,
};

pub const MAX_EXPLORATION_LEVEL: usize = 5;
pub const DEFAULT_EXPLORATION_LEVEL: usize = 5;

#[derive(Clone, Debug)]
pub struct SolverParams {
    /// Bounds how many heuristic rows run and how deep the local search
    /// perturbs each local optimum.
    pub exploration_level: usize,
    pub threads: Threads,
    /// Wall-clock budget shared by every worker. Construction always
    /// completes, only the local search stops early.
    pub timeout: Option<SignedDuration>,
    /// Replaces the built-in tables, every row runs.
    pub heuristic_parameters: Option<Vec<HeuristicParameters>>,
}

#[derive(Clone, Debug)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            exploration_level: DEFAULT_EXPLORATION_LEVEL,
            threads: Threads::Multi(1),
            timeout: None,
            heuristic_parameters: None,
        }
    }
}

impl SolverParams {
    pub fn exploration_level(&self) -> usize {
        self.exploration_level.min(MAX_EXPLORATION_LEVEL)
    }

    /// Number of table rows tried at the current exploration level.
    pub fn number_of_rows(&self) -> usize {
        let level = self.exploration_level();
        let mut rows = 4 * (level + 1);
        if level >= 4 {
            rows += 4;
        }
        if level == MAX_EXPLORATION_LEVEL {
            rows += 4;
        }
        rows
    }

    /// Rows to run, in order.
    pub fn heuristic_rows(&self, homogeneous: bool) -> Vec<HeuristicParameters> {
        if let Some(rows) = &self.heuristic_parameters {
            return rows.clone();
        }

        let table: &[HeuristicParameters] = if homogeneous {
            &HOMOGENEOUS_PARAMETERS
        } else {
            &HETEROGENEOUS_PARAMETERS
        };
        table[..self.number_of_rows().min(table.len())].to_vec()
    }
}
