//! Error types for the value model, the coercion layer and the engines built on it.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ValueError        - a payload does not fit its descriptor
//! CoercionError     - scalar parse / range / kind failures
//! ConversionError   - value conversion failures (wraps the two above)
//! ComparisonError   - operator/domain taxonomy failures
//! AssignError       - a failed conversion at an assignment site
//! ```
//!
//! Every error reports an [`ErrorCategory`] so callers can branch on the broad
//! failure class without matching individual variants.

use std::fmt;

use thiserror::Error;

use crate::Kind;

/// Broad failure classes shared by all error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed numeric or JSON text.
    ParseFailure,
    /// No rule converts the source kind to the target kind.
    UnsupportedConversion,
    /// Operator undefined for the selected comparison domain.
    TaxonomyError,
    /// An element of a composite failed to convert.
    StructuralMismatch,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ParseFailure => "parse failure",
            ErrorCategory::UnsupportedConversion => "unsupported conversion",
            ErrorCategory::TaxonomyError => "taxonomy error",
            ErrorCategory::StructuralMismatch => "structural mismatch",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Value Errors
// ============================================================================

/// A payload or child value that does not match its descriptor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("payload {payload} does not fit type {ty}")]
    ShapeMismatch { ty: String, payload: &'static str },

    #[error("value {value} out of range for {ty}")]
    OutOfRange { value: String, ty: String },

    #[error("type {ty} has {expected} field(s), got {got}")]
    FieldCount {
        ty: String,
        expected: usize,
        got: usize,
    },

    #[error("{container} expects element type {expected}, got {got}")]
    ElementType {
        container: String,
        expected: String,
        got: String,
    },

    #[error("map key of type {ty} is not hashable")]
    UnhashableKey { ty: String },

    #[error("cannot retype {from} as {to}: underlying types differ")]
    Retag { from: String, to: String },
}

// ============================================================================
// Coercion Errors
// ============================================================================

/// Failure of a scalar coercion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("unable to parse {text:?} as {target}")]
    Parse { text: String, target: Kind },

    #[error("value {value} overflows {target}")]
    Overflow { value: String, target: Kind },

    #[error("unable to coerce {from} to {target}")]
    Unsupported { from: String, target: Kind },
}

impl CoercionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoercionError::Parse { .. } | CoercionError::Overflow { .. } => {
                ErrorCategory::ParseFailure
            }
            CoercionError::Unsupported { .. } => ErrorCategory::UnsupportedConversion,
        }
    }
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// Failure of a value conversion.
///
/// Every variant names the source and target types of the conversion that failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// A scalar leaf failed to coerce.
    #[error("cannot convert {from} to {to}: {source}")]
    Scalar {
        from: String,
        to: String,
        #[source]
        source: CoercionError,
    },

    /// JSON text was malformed or did not fit the target shape.
    #[error("cannot convert {from} to {to}: {message}")]
    Json {
        from: String,
        to: String,
        message: String,
    },

    /// No conversion rule exists for this pair of kinds.
    #[error("unsupported conversion from {from} to {to}{}", detail_suffix(.detail))]
    Unsupported {
        from: String,
        to: String,
        detail: Option<String>,
    },

    /// A nested element failed; the whole composite conversion was abandoned.
    #[error("cannot convert {from} to {to}: element {path}: {source}")]
    Element {
        from: String,
        to: String,
        path: String,
        #[source]
        source: Box<ConversionError>,
    },

    /// The engine tried to build a value that does not fit its descriptor.
    #[error("cannot convert {from} to {to}: {source}")]
    Value {
        from: String,
        to: String,
        #[source]
        source: ValueError,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

impl ConversionError {
    pub fn unsupported(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        ConversionError::Unsupported {
            from: from.to_string(),
            to: to.to_string(),
            detail: None,
        }
    }

    pub fn unsupported_with(
        from: impl fmt::Display,
        to: impl fmt::Display,
        detail: impl Into<String>,
    ) -> Self {
        ConversionError::Unsupported {
            from: from.to_string(),
            to: to.to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConversionError::Scalar { source, .. } => source.category(),
            ConversionError::Json { .. } => ErrorCategory::ParseFailure,
            ConversionError::Unsupported { .. } | ConversionError::Value { .. } => {
                ErrorCategory::UnsupportedConversion
            }
            ConversionError::Element { .. } => ErrorCategory::StructuralMismatch,
        }
    }

    /// Source type name of the failed conversion.
    pub fn from_type(&self) -> &str {
        match self {
            ConversionError::Scalar { from, .. }
            | ConversionError::Json { from, .. }
            | ConversionError::Unsupported { from, .. }
            | ConversionError::Element { from, .. }
            | ConversionError::Value { from, .. } => from,
        }
    }

    /// Target type name of the failed conversion.
    pub fn to_type(&self) -> &str {
        match self {
            ConversionError::Scalar { to, .. }
            | ConversionError::Json { to, .. }
            | ConversionError::Unsupported { to, .. }
            | ConversionError::Element { to, .. }
            | ConversionError::Value { to, .. } => to,
        }
    }

    /// The innermost failure, following nested element errors.
    pub fn root_cause(&self) -> &ConversionError {
        let mut current = self;
        while let ConversionError::Element { source, .. } = current {
            current = source;
        }
        current
    }
}

// ============================================================================
// Comparison Errors
// ============================================================================

/// Failure of a relational or equality comparison.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonError {
    #[error("unknown comparison operator {0:?}")]
    UnknownOperator(String),

    #[error("unsupported comparison operator {op} for {domain}")]
    UnsupportedOperator { op: String, domain: &'static str },

    #[error("type {left} doesn't support {op} operator with {right}")]
    UndecidableDomain {
        left: String,
        right: String,
        op: String,
    },
}

impl ComparisonError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::TaxonomyError
    }
}

// ============================================================================
// Assignment Errors
// ============================================================================

/// A value could not be stored into a slot of a different declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot assign {value_type} to slot of type {slot_type}: {source}")]
pub struct AssignError {
    pub slot_type: String,
    pub value_type: String,
    #[source]
    pub source: ConversionError,
}

impl AssignError {
    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_categories() {
        let parse = CoercionError::Parse {
            text: "abc".into(),
            target: Kind::Int64,
        };
        assert_eq!(parse.category(), ErrorCategory::ParseFailure);
        assert_eq!(parse.to_string(), "unable to parse \"abc\" as int64");

        let unsupported = CoercionError::Unsupported {
            from: "struct {}".into(),
            target: Kind::Bool,
        };
        assert_eq!(unsupported.category(), ErrorCategory::UnsupportedConversion);
    }

    #[test]
    fn conversion_error_messages() {
        let err = ConversionError::unsupported("int64", "main.Person");
        assert_eq!(
            err.to_string(),
            "unsupported conversion from int64 to main.Person"
        );
        let err = ConversionError::unsupported_with("[]int64", "[]string", "slice mismatch");
        assert_eq!(
            err.to_string(),
            "unsupported conversion from []int64 to []string: slice mismatch"
        );
    }

    #[test]
    fn element_error_root_cause() {
        let leaf = ConversionError::Scalar {
            from: "string".into(),
            to: "int64".into(),
            source: CoercionError::Parse {
                text: "x".into(),
                target: Kind::Int64,
            },
        };
        let nested = ConversionError::Element {
            from: "map[string]string".into(),
            to: "map[string]int64".into(),
            path: "[\"a\"]".into(),
            source: Box::new(leaf.clone()),
        };
        assert_eq!(nested.category(), ErrorCategory::StructuralMismatch);
        assert_eq!(nested.root_cause(), &leaf);
        assert_eq!(nested.from_type(), "map[string]string");
        assert_eq!(nested.to_type(), "map[string]int64");
    }

    #[test]
    fn comparison_is_taxonomy() {
        let err = ComparisonError::UnsupportedOperator {
            op: "<".into(),
            domain: "bool",
        };
        assert_eq!(err.category(), ErrorCategory::TaxonomyError);
        assert_eq!(err.to_string(), "unsupported comparison operator < for bool");
    }
}
