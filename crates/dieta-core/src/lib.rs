pub mod error;
pub mod formulate;
pub mod loader;
pub mod model;
pub mod report;

pub use error::{DietError, ErrorClass, FormulateError, LoadError};
pub use formulate::{content_matrix, formulate, to_standard_form};
pub use loader::{load_catalog, EncodingPolicy, LoaderConfig};
pub use model::{Catalog, FoodItem, NutrientSpec};
pub use report::{report, DietPlan, NutrientAudit, Outcome, Purchase, Report};

use dieta_solver::LpSolver;

/// Formulate, solve and report on a loaded catalog.
pub fn solve<S: LpSolver + ?Sized>(catalog: &Catalog, solver: &S) -> Result<Report, FormulateError> {
    let model = catalog.formulate()?;
    let solution = solver.solve(&model);
    if solution.is_optimal() {
        tracing::info!(
            objective = solution.objective_value,
            iterations = solution.iterations,
            "solver found an optimal diet"
        );
    } else {
        tracing::info!(
            status = %solution.status,
            iterations = solution.iterations,
            message = %solution.message,
            "solver finished without an optimum"
        );
    }
    Ok(report(catalog.nutrients(), catalog.foods(), &model, &solution))
}
