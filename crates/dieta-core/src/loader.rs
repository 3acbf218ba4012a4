use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use encoding_rs::WINDOWS_1252;
use thiserror::Error;

use crate::error::LoadError;
use crate::model::{Catalog, FoodItem, NutrientSpec};

/// Identifier column of the food table
pub const FOOD_NAME_COLUMN: &str = "ingrediente";
/// Purchase-unit label column of the food table
pub const FOOD_UNIT_COLUMN: &str = "quantidade";
/// Unit cost column of the food table
pub const FOOD_COST_COLUMN: &str = "preco";
/// Name column of the nutrient table, followed by accepted aliases
pub const NUTRIENT_NAME_COLUMNS: &[&str] = &["nutrients", "nutrientes"];
/// Minimum column of the nutrient table, followed by accepted aliases
pub const NUTRIENT_MINIMUM_COLUMNS: &[&str] = &["minimum", "minimo"];

/// How raw table bytes are turned into text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Latin-1. Windows-1252 is used since it is a superset for printable text.
    Latin1,
    /// Attempt UTF-8; if the input is not valid UTF-8, fall back to Latin-1.
    Utf8OrLatin1,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown encoding '{0}' (expected utf-8, latin-1 or utf-8-or-latin-1)")]
pub struct ParseEncodingError(String);

impl FromStr for EncodingPolicy {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(EncodingPolicy::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "windows-1252" | "cp1252" => Ok(EncodingPolicy::Latin1),
            "utf-8-or-latin-1" | "auto" => Ok(EncodingPolicy::Utf8OrLatin1),
            _ => Err(ParseEncodingError(s.to_string())),
        }
    }
}

impl std::fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EncodingPolicy::Utf8 => "utf-8",
            EncodingPolicy::Latin1 => "latin-1",
            EncodingPolicy::Utf8OrLatin1 => "utf-8-or-latin-1",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct LoaderConfig {
    pub delimiter: u8,
    /// Encoding of the nutrient table
    pub nutrient_encoding: EncodingPolicy,
    /// Encoding of the food table
    pub food_encoding: EncodingPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            nutrient_encoding: EncodingPolicy::Utf8,
            food_encoding: EncodingPolicy::Utf8OrLatin1,
        }
    }
}

impl LoaderConfig {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_nutrient_encoding(mut self, encoding: EncodingPolicy) -> Self {
        self.nutrient_encoding = encoding;
        self
    }

    pub fn with_food_encoding(mut self, encoding: EncodingPolicy) -> Self {
        self.food_encoding = encoding;
        self
    }
}

/// Load and validate both tables.
///
/// Both paths are checked for existence before either file is parsed.
pub fn load_catalog(
    nutrients_path: impl AsRef<Path>,
    foods_path: impl AsRef<Path>,
    config: &LoaderConfig,
) -> Result<Catalog, LoadError> {
    let nutrients_path = nutrients_path.as_ref();
    let foods_path = foods_path.as_ref();

    for path in [nutrients_path, foods_path] {
        if !path.exists() {
            return Err(LoadError::SourceNotFound(path.to_path_buf()));
        }
    }

    let text = read_text(nutrients_path, config.nutrient_encoding)?;
    let nutrients = parse_nutrients(&text, nutrients_path, config.delimiter)?;

    let text = read_text(foods_path, config.food_encoding)?;
    let foods = parse_foods(&text, foods_path, config.delimiter)?;

    tracing::info!(
        nutrients = nutrients.len(),
        foods = foods.len(),
        "loaded diet tables"
    );

    Catalog::new(nutrients, foods)
}

fn read_text(path: &Path, encoding: EncodingPolicy) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::SourceNotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    decode(&bytes, path, encoding).map(Cow::into_owned)
}

/// Decode table bytes according to `encoding`, dropping a UTF-8 byte order mark.
pub fn decode<'a>(bytes: &'a [u8], path: &Path, encoding: EncodingPolicy) -> Result<Cow<'a, str>, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match encoding {
        EncodingPolicy::Utf8 => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| LoadError::Encoding {
                path: path.to_path_buf(),
                encoding: encoding.to_string(),
            }),
        EncodingPolicy::Latin1 => Ok(WINDOWS_1252.decode_without_bom_handling(bytes).0),
        EncodingPolicy::Utf8OrLatin1 => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(e) => {
                tracing::warn!(
                    "'{}' is not valid UTF-8 ({}); decoding as Latin-1",
                    path.display(),
                    e
                );
                Ok(WINDOWS_1252.decode_without_bom_handling(bytes).0)
            }
        },
    }
}

/// Parse a nutrient table. `path` is only used in error messages.
pub fn parse_nutrients(text: &str, path: &Path, delimiter: u8) -> Result<Vec<NutrientSpec>, LoadError> {
    let table = Table::read(text, path, delimiter)?;
    let name_col = table.column(NUTRIENT_NAME_COLUMNS)?;
    let min_col = table.column(NUTRIENT_MINIMUM_COLUMNS)?;

    let mut nutrients = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let minimum = table.non_negative(row, min_col)?;
        nutrients.push(NutrientSpec::new(row.cells[name_col].clone(), minimum));
    }

    Ok(nutrients)
}

/// Parse a food table. Every column except the name and unit columns must be numeric.
pub fn parse_foods(text: &str, path: &Path, delimiter: u8) -> Result<Vec<FoodItem>, LoadError> {
    let table = Table::read(text, path, delimiter)?;
    let name_col = table.column(&[FOOD_NAME_COLUMN])?;
    let unit_col = table.column(&[FOOD_UNIT_COLUMN])?;
    let cost_col = table.column(&[FOOD_COST_COLUMN])?;

    let nutrient_cols: Vec<usize> = (0..table.headers.len())
        .filter(|&c| c != name_col && c != unit_col && c != cost_col)
        .collect();

    let mut foods = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let unit_cost = table.non_negative(row, cost_col)?;
        let mut food = FoodItem::new(row.cells[name_col].clone(), row.cells[unit_col].clone(), unit_cost);
        for &c in &nutrient_cols {
            let amount = table.number(row, c)?;
            food.nutrients.insert(table.headers[c].clone(), amount);
        }
        foods.push(food);
    }

    Ok(foods)
}

struct Row {
    line: u64,
    cells: Vec<String>,
}

/// A decoded table with trimmed headers and cells
struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    fn read(text: &str, path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let csv_error = |e: csv::Error| LoadError::Csv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(LoadError::DuplicateName {
                kind: "column",
                name: dup.clone(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(Row {
                line,
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Index of the first header matching one of `names`
    fn column(&self, names: &[&str]) -> Result<usize, LoadError> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h == name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: names[0].to_string(),
                found: self.headers.clone(),
            })
    }

    fn number(&self, row: &Row, col: usize) -> Result<f64, LoadError> {
        let cell = &row.cells[col];
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(LoadError::NotNumeric {
                path: self.path.clone(),
                column: self.headers[col].clone(),
                line: row.line,
                value: cell.clone(),
            }),
        }
    }

    fn non_negative(&self, row: &Row, col: usize) -> Result<f64, LoadError> {
        let value = self.number(row, col)?;
        if value < 0.0 {
            return Err(LoadError::Negative {
                path: self.path.clone(),
                column: self.headers[col].clone(),
                line: row.line,
                value,
            });
        }
        Ok(value)
    }
}
