use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source not found: '{}'", .0.display())]
    SourceNotFound(PathBuf),
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' could not be decoded as {encoding}", path.display())]
    Encoding { path: PathBuf, encoding: String },
    #[error("malformed table in '{}': {reason}", path.display())]
    Csv { path: PathBuf, reason: String },
    #[error("column '{column}' was not found in '{}'. Columns read: {found:?}", path.display())]
    MissingColumn {
        path: PathBuf,
        column: String,
        found: Vec<String>,
    },
    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("non-numeric value '{value}' in column '{column}' at line {line} of '{}'", path.display())]
    NotNumeric {
        path: PathBuf,
        column: String,
        line: u64,
        value: String,
    },
    #[error("negative value {value} in column '{column}' at line {line} of '{}'", path.display())]
    Negative {
        path: PathBuf,
        column: String,
        line: u64,
        value: f64,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulateError {
    #[error("nutrient '{nutrient}' is missing from food '{food}'")]
    MissingNutrient { nutrient: String, food: String },
}

#[derive(Error, Debug)]
pub enum DietError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Formulate(#[from] FormulateError),
}

/// Failure classes surfaced to the user, one exit status each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    SourceNotFound,
    Io,
    Encoding,
    Structural,
    Type,
}

impl LoadError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LoadError::SourceNotFound(_) => ErrorClass::SourceNotFound,
            LoadError::Io { .. } => ErrorClass::Io,
            LoadError::Encoding { .. } => ErrorClass::Encoding,
            LoadError::Csv { .. } | LoadError::MissingColumn { .. } | LoadError::DuplicateName { .. } => {
                ErrorClass::Structural
            }
            LoadError::NotNumeric { .. } | LoadError::Negative { .. } => ErrorClass::Type,
        }
    }
}

impl DietError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DietError::Load(e) => e.class(),
            DietError::Formulate(FormulateError::MissingNutrient { .. }) => ErrorClass::Structural,
        }
    }
}
