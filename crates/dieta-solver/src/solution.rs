/// The result of solving an LP problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Value of each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Objective value at `values`
    pub objective_value: f64,
    /// Solver's own description of how it terminated
    pub message: String,
    /// Simplex pivots performed across both phases
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The iteration limit was reached before optimality was proven
    IterationLimit,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error
    Error,
}

impl SolutionStatus {
    /// Numeric status code reported alongside non-optimal outcomes.
    pub fn code(self) -> u8 {
        match self {
            SolutionStatus::Optimal => 0,
            SolutionStatus::IterationLimit => 1,
            SolutionStatus::Infeasible => 2,
            SolutionStatus::Unbounded => 3,
            SolutionStatus::Error => 4,
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::IterationLimit => "iteration limit",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            message: "Optimization terminated successfully.".to_string(),
            iterations,
        }
    }

    pub fn infeasible(iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::INFINITY,
            message: "The problem is infeasible.".to_string(),
            iterations,
        }
    }

    pub fn unbounded(iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NEG_INFINITY,
            message: "The problem is unbounded.".to_string(),
            iterations,
        }
    }

    pub fn iteration_limit(max_iterations: usize) -> Self {
        Self {
            status: SolutionStatus::IterationLimit,
            values: Vec::new(),
            objective_value: f64::NAN,
            message: format!("Iteration limit of {} reached.", max_iterations),
            iterations: max_iterations,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SolutionStatus::Error,
            values: Vec::new(),
            objective_value: f64::NAN,
            message: message.into(),
            iterations: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
