use std::collections::HashMap;

use dieta_solver::LpModel;

use crate::error::{FormulateError, LoadError};
use crate::formulate::formulate_with_rows;

/// A nutrient and its minimum daily requirement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NutrientSpec {
    pub name: String,
    pub minimum: f64,
}

/// A food that can be bought, with its content per purchase unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FoodItem {
    pub name: String,
    /// Display label of one purchase unit (e.g. "1 kg")
    pub purchase_unit: String,
    pub unit_cost: f64,
    /// Nutrient name -> amount supplied by one purchase unit
    pub nutrients: HashMap<String, f64>,
}

impl NutrientSpec {
    pub fn new(name: impl Into<String>, minimum: f64) -> Self {
        Self {
            name: name.into(),
            minimum,
        }
    }
}

impl FoodItem {
    pub fn new(name: impl Into<String>, purchase_unit: impl Into<String>, unit_cost: f64) -> Self {
        Self {
            name: name.into(),
            purchase_unit: purchase_unit.into(),
            unit_cost,
            nutrients: HashMap::new(),
        }
    }

    pub fn with_nutrient(mut self, name: impl Into<String>, amount: f64) -> Self {
        self.nutrients.insert(name.into(), amount);
        self
    }

    /// Amount of `nutrient` in one purchase unit, `None` if the food does not list it.
    pub fn content(&self, nutrient: &str) -> Option<f64> {
        self.nutrients.get(nutrient).copied()
    }
}

/// Validated nutrient and food tables.
///
/// Sequence order is significant: nutrient `i` is constraint row `i` and
/// food `j` is decision variable `j` everywhere downstream. Names are
/// unique within each table.
#[derive(Debug, Clone)]
pub struct Catalog {
    nutrients: Vec<NutrientSpec>,
    foods: Vec<FoodItem>,
    /// Nutrient name -> constraint row
    nutrient_rows: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(nutrients: Vec<NutrientSpec>, foods: Vec<FoodItem>) -> Result<Self, LoadError> {
        let nutrient_rows = index_names("nutrient", nutrients.iter().map(|n| n.name.as_str()))?;
        index_names("food", foods.iter().map(|f| f.name.as_str()))?;

        Ok(Self {
            nutrients,
            foods,
            nutrient_rows,
        })
    }

    pub fn nutrients(&self) -> &[NutrientSpec] {
        &self.nutrients
    }

    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    /// Build the diet LP using the row map built at load time.
    pub fn formulate(&self) -> Result<LpModel, FormulateError> {
        formulate_with_rows(&self.nutrients, &self.foods, &self.nutrient_rows)
    }
}

fn index_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, LoadError> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name.to_string(), i).is_some() {
            return Err(LoadError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(index)
}
