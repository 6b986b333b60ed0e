//! Top-level error type.

use thiserror::Error;

use valuecast_convert::JsonError;
use valuecast_core::{
    AssignError, CoercionError, ComparisonError, ConversionError, ErrorCategory, ValueError,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure reported by the coercion core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Json(#[from] JsonError),
}

impl Error {
    /// The broad failure class, or `None` for value construction errors.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Value(_) => None,
            Error::Coercion(e) => Some(e.category()),
            Error::Conversion(e) => Some(e.category()),
            Error::Comparison(e) => Some(e.category()),
            Error::Assign(e) => Some(e.category()),
            Error::Json(JsonError::Syntax(_) | JsonError::Mismatch { .. }) => {
                Some(ErrorCategory::ParseFailure)
            }
            Error::Json(_) => Some(ErrorCategory::UnsupportedConversion),
        }
    }
}
