use thiserror::Error;

/// A linear program in standard inequality form:
///
/// ```text
/// minimize    c'x
/// subject to  Ax <= b
///             x  >= 0
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpModel {
    /// Variable names, one per column of `matrix`
    pub variables: Vec<String>,
    /// Constraint names, one per row of `matrix`
    pub constraints: Vec<String>,
    /// Objective coefficients (c)
    pub objective: Vec<f64>,
    /// Inequality coefficients (A), row-major
    pub matrix: Vec<Vec<f64>>,
    /// Right-hand side (b)
    pub bounds: Vec<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("non-finite value in {what} at index {index}")]
    NonFinite { what: String, index: usize },
}

impl LpModel {
    pub fn new(variables: Vec<String>, objective: Vec<f64>) -> Self {
        Self {
            variables,
            constraints: Vec::new(),
            objective,
            matrix: Vec::new(),
            bounds: Vec::new(),
        }
    }

    /// Append the row `coefficients . x <= rhs`
    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.constraints.push(name.into());
        self.matrix.push(coefficients);
        self.bounds.push(rhs);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check that every vector agrees with the variable and constraint counts
    /// and that all data is finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.num_variables();
        let m = self.num_constraints();

        check_len("objective", n, self.objective.len())?;
        check_len("matrix", m, self.matrix.len())?;
        check_len("bounds", m, self.bounds.len())?;
        check_finite("objective", &self.objective)?;
        check_finite("bounds", &self.bounds)?;

        for (i, row) in self.matrix.iter().enumerate() {
            let what = format!("matrix row {} ({})", i, self.constraints[i]);
            check_len(&what, n, row.len())?;
            check_finite(&what, row)?;
        }

        Ok(())
    }

    /// Row activities `A x`, one entry per constraint.
    pub fn activity(&self, x: &[f64]) -> Vec<f64> {
        self.matrix
            .iter()
            .map(|row| row.iter().zip(x).map(|(a, v)| a * v).sum())
            .collect()
    }

    /// Objective value `c'x`.
    pub fn cost(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }
}

impl std::fmt::Display for LpModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "minimize  ")?;
        write_terms(f, &self.objective, &self.variables)?;
        writeln!(f)?;
        writeln!(f, "subject to")?;
        for ((name, row), rhs) in self.constraints.iter().zip(&self.matrix).zip(&self.bounds) {
            write!(f, "  {}: ", name)?;
            write_terms(f, row, &self.variables)?;
            writeln!(f, " <= {}", rhs)?;
        }
        writeln!(f, "  all variables >= 0")
    }
}

/// Writes `a x + b y - c z`, skipping zero coefficients
fn write_terms(f: &mut std::fmt::Formatter<'_>, coefficients: &[f64], names: &[String]) -> std::fmt::Result {
    let mut first = true;
    for (&coef, name) in coefficients.iter().zip(names) {
        if coef == 0.0 {
            continue;
        }
        match (first, coef < 0.0) {
            (true, false) => write!(f, "{} {}", coef, name)?,
            (true, true) => write!(f, "-{} {}", -coef, name)?,
            (false, false) => write!(f, " + {} {}", coef, name)?,
            (false, true) => write!(f, " - {} {}", -coef, name)?,
        }
        first = false;
    }
    if first {
        write!(f, "0")?;
    }
    Ok(())
}

fn check_len(what: &str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::DimensionMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn check_finite(what: &str, values: &[f64]) -> Result<(), ModelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ModelError::NonFinite {
            what: what.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> LpModel {
        let mut model = LpModel::new(vec!["x".to_string(), "y".to_string()], vec![1.0, 2.0]);
        model.add_constraint("first", vec![-1.0, 0.0], -3.0);
        model.add_constraint("second", vec![-2.0, -4.0], -8.0);
        model
    }

    #[test]
    fn test_activity_and_cost() {
        let model = two_by_two();
        assert!(model.validate().is_ok());
        assert_eq!(model.activity(&[1.0, 2.0]), vec![-1.0, -10.0]);
        assert_eq!(model.cost(&[1.0, 2.0]), 5.0);
    }

    #[test]
    fn test_display() {
        let text = two_by_two().to_string();
        assert_eq!(
            text,
            "minimize  1 x + 2 y\nsubject to\n  first: -1 x <= -3\n  second: -2 x - 4 y <= -8\n  all variables >= 0\n"
        );
    }

    #[test]
    fn test_validate_rejects_ragged_row() {
        let mut model = two_by_two();
        model.matrix[1].pop();
        let err = model.validate().unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                what: "matrix row 1 (second)".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut model = two_by_two();
        model.bounds[0] = f64::NAN;
        assert!(matches!(model.validate(), Err(ModelError::NonFinite { index: 0, .. })));
    }
}
