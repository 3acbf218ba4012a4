use std::collections::HashMap;

use dieta_solver::LpModel;

use crate::error::FormulateError;
use crate::model::{FoodItem, NutrientSpec};

/// Build the standard-form diet LP.
///
/// Variables are the foods and rows are the nutrients, both in input order.
/// Each requirement `content . x >= minimum` is stored as `-content . x <= -minimum`.
pub fn formulate(nutrients: &[NutrientSpec], foods: &[FoodItem]) -> Result<LpModel, FormulateError> {
    formulate_with_rows(nutrients, foods, &nutrient_rows(nutrients))
}

/// [`formulate`] with a prebuilt nutrient name -> row map.
pub(crate) fn formulate_with_rows(
    nutrients: &[NutrientSpec],
    foods: &[FoodItem],
    rows: &HashMap<String, usize>,
) -> Result<LpModel, FormulateError> {
    let content = fill_content(nutrients, foods, rows)?;
    let minimums: Vec<f64> = nutrients.iter().map(|n| n.minimum).collect();
    let (matrix, bounds) = to_standard_form(&content, &minimums);

    let variables = foods.iter().map(|f| f.name.clone()).collect();
    let costs = foods.iter().map(|f| f.unit_cost).collect();
    let mut model = LpModel::new(variables, costs);

    for ((nutrient, row), rhs) in nutrients.iter().zip(matrix).zip(bounds) {
        model.add_constraint(nutrient.name.clone(), row, rhs);
    }

    tracing::debug!(
        rows = model.num_constraints(),
        columns = model.num_variables(),
        "formulated diet model"
    );

    Ok(model)
}

/// `content[i][j]` is the amount of nutrient `i` in one unit of food `j`.
///
/// A nutrient a food does not list is an error, never zero.
pub fn content_matrix(nutrients: &[NutrientSpec], foods: &[FoodItem]) -> Result<Vec<Vec<f64>>, FormulateError> {
    fill_content(nutrients, foods, &nutrient_rows(nutrients))
}

fn nutrient_rows(nutrients: &[NutrientSpec]) -> HashMap<String, usize> {
    nutrients
        .iter()
        .enumerate()
        .map(|(i, n)| (n.name.clone(), i))
        .collect()
}

/// Walks each food's content once, placing amounts by row. Columns no
/// nutrient references are skipped. The first empty cell in row-major order
/// is reported.
fn fill_content(
    nutrients: &[NutrientSpec],
    foods: &[FoodItem],
    rows: &HashMap<String, usize>,
) -> Result<Vec<Vec<f64>>, FormulateError> {
    let mut cells = vec![vec![None; foods.len()]; nutrients.len()];
    for (j, food) in foods.iter().enumerate() {
        for (name, &amount) in &food.nutrients {
            if let Some(&i) = rows.get(name) {
                cells[i][j] = Some(amount);
            }
        }
    }

    cells
        .into_iter()
        .zip(nutrients)
        .map(|(row, nutrient)| {
            row.into_iter()
                .zip(foods)
                .map(|(cell, food)| {
                    cell.ok_or_else(|| FormulateError::MissingNutrient {
                        nutrient: nutrient.name.clone(),
                        food: food.name.clone(),
                    })
                })
                .collect()
        })
        .collect()
}

/// Turn `A x >= b` into `(-A) x <= (-b)`.
pub fn to_standard_form(content: &[Vec<f64>], minimums: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let matrix = content
        .iter()
        .map(|row| row.iter().map(|v| -v).collect())
        .collect();
    let bounds = minimums.iter().map(|b| -b).collect();
    (matrix, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<NutrientSpec>, Vec<FoodItem>) {
        let nutrients = vec![NutrientSpec::new("Protein", 50.0), NutrientSpec::new("Iron", 8.0)];
        let foods = vec![
            FoodItem::new("Rice", "kg", 2.0)
                .with_nutrient("Protein", 25.0)
                .with_nutrient("Iron", 1.5),
            FoodItem::new("Beans", "kg", 3.0)
                .with_nutrient("Protein", 100.0)
                .with_nutrient("Iron", 0.0),
            FoodItem::new("Spinach", "bunch", 1.25)
                .with_nutrient("Protein", 3.0)
                .with_nutrient("Iron", 2.7)
                .with_nutrient("Calcium", 99.0),
        ];
        (nutrients, foods)
    }

    #[test]
    fn test_formulate_negates_content_and_minimums() {
        let (nutrients, foods) = sample();
        let model = formulate(&nutrients, &foods).unwrap();

        assert_eq!(model.variables, vec!["Rice", "Beans", "Spinach"]);
        assert_eq!(model.constraints, vec!["Protein", "Iron"]);
        assert_eq!(model.objective, vec![2.0, 3.0, 1.25]);
        assert_eq!(model.bounds, vec![-50.0, -8.0]);

        for (i, nutrient) in nutrients.iter().enumerate() {
            for (j, food) in foods.iter().enumerate() {
                assert_eq!(model.matrix[i][j], -food.nutrients[&nutrient.name]);
            }
        }
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_formulate_is_deterministic() {
        let (nutrients, foods) = sample();
        let first = formulate(&nutrients, &foods).unwrap();
        let second = formulate(&nutrients, &foods).unwrap();

        assert_eq!(first, second);
        let bits = |m: &LpModel| -> Vec<u64> {
            m.matrix.iter().flatten().chain(&m.bounds).chain(&m.objective).map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_missing_nutrient_fails_fast() {
        let (mut nutrients, foods) = sample();
        nutrients.push(NutrientSpec::new("Calcium", 1000.0));

        let err = formulate(&nutrients, &foods).unwrap_err();
        assert_eq!(
            err,
            FormulateError::MissingNutrient {
                nutrient: "Calcium".to_string(),
                food: "Rice".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_nutrient_names_first_food_without_it() {
        let (mut nutrients, mut foods) = sample();
        nutrients.push(NutrientSpec::new("Calcium", 1000.0));
        foods[0].nutrients.insert("Calcium".to_string(), 10.0);

        let err = content_matrix(&nutrients, &foods).unwrap_err();
        assert_eq!(
            err,
            FormulateError::MissingNutrient {
                nutrient: "Calcium".to_string(),
                food: "Beans".to_string(),
            }
        );
    }

    #[test]
    fn test_standard_form_round_trip() {
        let content = vec![vec![25.0, 100.0], vec![1.5, 0.0]];
        let minimums = vec![50.0, 8.0];
        let (matrix, bounds) = to_standard_form(&content, &minimums);

        let x = [3.0, 0.25];
        for (i, row) in matrix.iter().enumerate() {
            let flipped: f64 = row.iter().zip(&x).map(|(a, v)| a * v).sum();
            let original: f64 = content[i].iter().zip(&x).map(|(a, v)| a * v).sum();
            assert!((original + flipped).abs() < 1e-12);
            assert_eq!(-bounds[i], minimums[i]);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let model = formulate(&[], &[]).unwrap();
        assert_eq!(model.num_variables(), 0);
        assert_eq!(model.num_constraints(), 0);
    }
}
