use crate::problem::LpModel;
use crate::solution::Solution;

/// Anything that can solve a standard-form [`LpModel`].
///
/// Implementations must return `values` of length `model.num_variables()`
/// with every entry non-negative whenever the status is optimal.
pub trait LpSolver {
    fn solve(&self, model: &LpModel) -> Solution;
}

/// Dense two-phase simplex solver
pub struct Simplex {
    /// Maximum pivots (both phases together) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl LpSolver for Simplex {
    fn solve(&self, model: &LpModel) -> Solution {
        Simplex::solve(self, model)
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Minimize `c'x` subject to `Ax <= b`, `x >= 0`
    pub fn solve(&self, model: &LpModel) -> Solution {
        if let Err(e) = model.validate() {
            tracing::warn!("rejecting malformed model: {}", e);
            return Solution::error(e.to_string());
        }

        let mut tableau = Tableau::build(model);
        let mut iterations = 0;

        tracing::debug!(
            rows = model.num_constraints(),
            variables = model.num_variables(),
            artificial = tableau.n_artificial,
            "starting simplex"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut iterations) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => return Solution::iteration_limit(self.max_iterations),
                SimplexResult::Infeasible | SimplexResult::Unbounded => {
                    tracing::debug!(iterations, "phase 1 left artificials in the basis");
                    return Solution::infeasible(iterations);
                }
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau, &mut iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Solution::unbounded(iterations),
            SimplexResult::Infeasible => return Solution::infeasible(iterations),
            SimplexResult::IterationLimit => return Solution::iteration_limit(self.max_iterations),
        }

        let values = tableau.values();
        let objective_value = model.cost(&values);
        tracing::debug!(iterations, objective_value, "simplex finished");

        Solution::optimal(values, objective_value, iterations)
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[obj_row].clone();

        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1, iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return SimplexResult::Infeasible,
            other => return other,
        }

        let rhs_col = n_cols - 1;
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        self.drive_out_artificials(tableau);

        // Restore original objective and price out the basis
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    /// Pivot zero-level artificials out of the basis so phase 2 cannot move them.
    /// Rows with no usable column are redundant and keep their artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.pivot(i, col);
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from, iterations)
    }

    fn iterate(&self, tableau: &mut Tableau, exclude_from: usize, iterations: &mut usize) -> SimplexResult {
        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            tracing::trace!(pivot_row, pivot_col, "pivot");
            tableau.pivot(pivot_row, pivot_col);
            *iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, exclude_from: usize) -> Option<usize> {
        let obj_row = tableau.obj_row();

        // Most positive reduced profit (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..exclude_from {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }
}

/// Dense tableau. Columns are laid out as
/// `[variables | one slack or surplus per row | artificials | rhs]`,
/// the last row holds reduced profits of the maximisation form.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_artificial: usize,
}

impl Tableau {
    fn build(model: &LpModel) -> Self {
        let n_vars = model.num_variables();
        let n_rows = model.num_constraints();

        // Rows with a negative rhs are flipped to `>=` and need an artificial
        let n_artificial = model.bounds.iter().filter(|&&b| b < 0.0).count();

        let total_cols = n_vars + n_rows + n_artificial + 1;
        let mut data = vec![vec![0.0; total_cols]; n_rows + 1];
        let mut basic_vars = vec![0; n_rows];

        let mut artificial_idx = n_vars + n_rows;

        for (i, (row, &rhs)) in model.matrix.iter().zip(&model.bounds).enumerate() {
            let slack_idx = n_vars + i;
            if rhs < 0.0 {
                for (j, &coef) in row.iter().enumerate() {
                    data[i][j] = -coef;
                }
                data[i][slack_idx] = -1.0; // surplus
                data[i][artificial_idx] = 1.0;
                basic_vars[i] = artificial_idx;
                artificial_idx += 1;
                data[i][total_cols - 1] = -rhs;
            } else {
                data[i][..n_vars].copy_from_slice(row);
                data[i][slack_idx] = 1.0;
                basic_vars[i] = slack_idx;
                data[i][total_cols - 1] = rhs;
            }
        }

        // Simplex maximizes, so store -c
        for (j, &coef) in model.objective.iter().enumerate() {
            data[n_rows][j] = -coef;
        }

        Self {
            data,
            basic_vars,
            n_vars,
            n_artificial,
        }
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.obj_row()
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.n_cols();

        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, r) in self.data.iter_mut().enumerate() {
            if i != row {
                let factor = r[col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        r[j] -= factor * pivot_row[j];
                    }
                }
            }
        }
    }

    fn values(&self) -> Vec<f64> {
        let rhs_col = self.n_cols() - 1;
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs_col].max(0.0);
            }
        }
        values
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
