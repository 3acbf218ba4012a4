use std::fmt;

use dieta_solver::{LpModel, Solution, SolutionStatus};

use crate::model::{FoodItem, NutrientSpec};

/// Quantities at or below this are treated as not purchased
pub const PURCHASE_THRESHOLD: f64 = 1e-6;
/// Shortfall absorbed when judging a nutrient as satisfied
pub const SATISFACTION_TOLERANCE: f64 = 1e-6;

/// What a solve run produced
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum Report {
    Optimal(DietPlan),
    /// No combination of foods meets every minimum
    Infeasible,
    /// The solver stopped without an optimal or infeasible verdict
    NoOptimal {
        solver_status: SolutionStatus,
        code: u8,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DietPlan {
    pub total_cost: f64,
    pub purchases: Vec<Purchase>,
    pub audit: Vec<NutrientAudit>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Purchase {
    pub food: String,
    pub quantity: f64,
    pub purchase_unit: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NutrientAudit {
    pub nutrient: String,
    pub achieved: f64,
    pub minimum: f64,
    pub satisfied: bool,
}

/// Coarse classification of a report, used for the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Optimal,
    Infeasible,
    SolverFailure,
}

impl Report {
    pub fn outcome(&self) -> Outcome {
        match self {
            Report::Optimal(_) => Outcome::Optimal,
            Report::Infeasible => Outcome::Infeasible,
            Report::NoOptimal { .. } => Outcome::SolverFailure,
        }
    }
}

impl NutrientAudit {
    pub fn new(nutrient: impl Into<String>, achieved: f64, minimum: f64) -> Self {
        Self {
            nutrient: nutrient.into(),
            achieved,
            minimum,
            satisfied: is_satisfied(achieved, minimum),
        }
    }
}

pub fn is_purchased(quantity: f64) -> bool {
    quantity > PURCHASE_THRESHOLD
}

pub fn is_satisfied(achieved: f64, minimum: f64) -> bool {
    achieved >= minimum - SATISFACTION_TOLERANCE
}

/// Translate a raw solver result back into foods and nutrients.
///
/// Achieved totals are recomputed from `x` and the model itself, undoing the
/// sign flip: `achieved = -(A x)` and `minimum = -b`.
pub fn report(nutrients: &[NutrientSpec], foods: &[FoodItem], model: &LpModel, solution: &Solution) -> Report {
    match solution.status {
        SolutionStatus::Optimal => {}
        SolutionStatus::Infeasible => return Report::Infeasible,
        status => {
            return Report::NoOptimal {
                solver_status: status,
                code: status.code(),
                message: solution.message.clone(),
            };
        }
    }

    let x = &solution.values;
    if x.len() != foods.len() {
        tracing::error!(values = x.len(), foods = foods.len(), "solver broke the output contract");
        return Report::NoOptimal {
            solver_status: SolutionStatus::Error,
            code: SolutionStatus::Error.code(),
            message: format!("solver returned {} values for {} foods", x.len(), foods.len()),
        };
    }

    let purchases = foods
        .iter()
        .zip(x)
        .filter(|&(_, &quantity)| is_purchased(quantity))
        .map(|(food, &quantity)| Purchase {
            food: food.name.clone(),
            quantity,
            purchase_unit: food.purchase_unit.clone(),
        })
        .collect();

    let audit: Vec<NutrientAudit> = nutrients
        .iter()
        .zip(model.activity(x))
        .zip(&model.bounds)
        .map(|((nutrient, activity), bound)| NutrientAudit::new(nutrient.name.clone(), -activity, -bound))
        .collect();

    for failed in audit.iter().filter(|a| !a.satisfied) {
        tracing::warn!(
            nutrient = %failed.nutrient,
            achieved = failed.achieved,
            minimum = failed.minimum,
            "optimal solution misses a nutrient minimum"
        );
    }

    Report::Optimal(DietPlan {
        total_cost: solution.objective_value,
        purchases,
        audit,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Optimal(plan) => fmt::Display::fmt(plan, f),
            Report::Infeasible => writeln!(
                f,
                "THE PROBLEM IS INFEASIBLE. No feasible diet exists: no combination of foods meets every nutrient minimum."
            ),
            Report::NoOptimal {
                solver_status,
                code,
                message,
            } => {
                writeln!(f, "No optimal solution. Solver status: {} ({})", code, solver_status)?;
                writeln!(f, "{}", message)
            }
        }
    }
}

impl fmt::Display for DietPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- OPTIMAL SOLUTION FOUND ---")?;
        writeln!(f, "Minimum total cost: {:.4}", self.total_cost)?;
        writeln!(f)?;
        writeln!(f, "Food quantities to buy (purchase units):")?;

        if self.purchases.is_empty() {
            writeln!(f, "  (nothing to buy)")?;
        } else {
            let quantities: Vec<String> = self.purchases.iter().map(|p| format!("{:.6}", p.quantity)).collect();
            let name_width = self.purchases.iter().map(|p| p.food.chars().count()).max().unwrap_or(0).max(4);
            let qty_width = quantities.iter().map(String::len).max().unwrap_or(0).max(8);

            writeln!(f, "  {:<name_width$}  {:>qty_width$}  Purchase unit", "Food", "Quantity")?;
            for (p, qty) in self.purchases.iter().zip(&quantities) {
                writeln!(f, "  {:<name_width$}  {:>qty_width$}  {}", p.food, qty, p.purchase_unit)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Nutrient check (achieved vs minimum):")?;
        for a in &self.audit {
            let tag = if a.satisfied { "OK" } else { "FAILED" };
            writeln!(
                f,
                "- {:<15}: achieved={:.4}, minimum={:.1} ({})",
                a.nutrient, a.achieved, a.minimum, tag
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulate::formulate;

    fn scenario_a() -> (Vec<NutrientSpec>, Vec<FoodItem>) {
        (
            vec![NutrientSpec::new("Protein", 50.0)],
            vec![
                FoodItem::new("Rice", "kg", 2.0).with_nutrient("Protein", 25.0),
                FoodItem::new("Beans", "kg", 3.0).with_nutrient("Protein", 100.0),
            ],
        )
    }

    #[test]
    fn test_optimal_report() {
        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();
        let solution = Solution::optimal(vec![0.0, 0.5], 1.5, 1);

        let Report::Optimal(plan) = report(&nutrients, &foods, &model, &solution) else {
            panic!("expected an optimal report");
        };

        assert_eq!(plan.total_cost, 1.5);
        assert_eq!(
            plan.purchases,
            vec![Purchase {
                food: "Beans".to_string(),
                quantity: 0.5,
                purchase_unit: "kg".to_string(),
            }]
        );
        assert_eq!(plan.audit, vec![NutrientAudit::new("Protein", 50.0, 50.0)]);
        assert!(plan.audit[0].satisfied);

        let text = plan.to_string();
        println!("{}", text);
        assert!(text.contains("Minimum total cost: 1.5000"));
        assert!(text.contains("0.500000"));
        assert!(text.contains("- Protein        : achieved=50.0000, minimum=50.0 (OK)"));
        assert!(!text.contains("Rice"));
    }

    #[test]
    fn test_audit_matches_negated_activity() {
        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();
        let x = vec![0.3, 0.7];
        let solution = Solution::optimal(x.clone(), model.cost(&x), 2);

        let Report::Optimal(plan) = report(&nutrients, &foods, &model, &solution) else {
            panic!("expected an optimal report");
        };

        let original = 25.0 * 0.3 + 100.0 * 0.7;
        let flipped = model.activity(&x)[0];
        assert!((plan.audit[0].achieved - original).abs() < 1e-6);
        assert!((plan.audit[0].achieved + flipped).abs() < 1e-6);
        assert_eq!(plan.audit[0].minimum, 50.0);
    }

    #[test]
    fn test_purchase_threshold_is_strict() {
        assert!(!is_purchased(1e-6));
        assert!(is_purchased(1e-6 + 1e-12));
        assert!(!is_purchased(0.0));

        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();
        let solution = Solution::optimal(vec![1e-6, 1e-6 + 1e-12], 0.0, 0);

        let Report::Optimal(plan) = report(&nutrients, &foods, &model, &solution) else {
            panic!("expected an optimal report");
        };
        assert_eq!(plan.purchases.len(), 1);
        assert_eq!(plan.purchases[0].food, "Beans");
    }

    #[test]
    fn test_satisfaction_boundary() {
        // Same expression as the check, so the boundary compares equal
        let tol = SATISFACTION_TOLERANCE;
        assert!(is_satisfied(50.0 - tol, 50.0));
        assert!(!is_satisfied(50.0 - tol - 1e-9, 50.0));
        assert!(is_satisfied(0.0 - tol, 0.0));
        assert!(!is_satisfied(-tol - 1e-12, 0.0));

        let audit = NutrientAudit::new("Iron", 7.0, 8.0);
        assert!(!audit.satisfied);
        let plan = DietPlan {
            total_cost: 0.0,
            purchases: vec![],
            audit: vec![audit],
        };
        let text = plan.to_string();
        assert!(text.contains("(FAILED)"));
        assert!(text.contains("(nothing to buy)"));
    }

    #[test]
    fn test_infeasible_report_has_no_numbers() {
        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();

        let r = report(&nutrients, &foods, &model, &Solution::infeasible(3));
        assert_eq!(r, Report::Infeasible);
        assert_eq!(r.outcome(), Outcome::Infeasible);

        let text = r.to_string();
        assert!(text.contains("No feasible diet exists"));
        assert!(!text.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_other_failure_carries_solver_status() {
        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();

        let r = report(&nutrients, &foods, &model, &Solution::unbounded(4));
        assert_eq!(r.outcome(), Outcome::SolverFailure);

        let text = r.to_string();
        assert!(text.contains("No optimal solution. Solver status: 3 (unbounded)"));
        assert!(text.contains("The problem is unbounded."));
    }

    #[test]
    fn test_wrong_length_solution_is_not_reported_as_optimal() {
        let (nutrients, foods) = scenario_a();
        let model = formulate(&nutrients, &foods).unwrap();

        let r = report(&nutrients, &foods, &model, &Solution::optimal(vec![1.0], 2.0, 1));
        assert!(matches!(r, Report::NoOptimal { code: 4, .. }));
    }
}
