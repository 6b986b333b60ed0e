//! Relational and equality comparison of dynamic values.
//!
//! Operands are compared in one of four domains, selected in order:
//!
//! 1. **Absent**: either operand is invalid or a nil interface
//! 2. **Text**: either operand (after unwrapping) is a string
//! 3. **Bool**: either operand (after unwrapping) is a bool; only `==` and `!=`
//! 4. **Numeric**: both operands normalized with [`coerce_to_number`]
//!
//! In the numeric domain the wider representation wins (float over signed over
//! unsigned). A signed/unsigned pair is compared as 128-bit signed integers so a
//! negative signed value is always less than any unsigned value.

use std::fmt;
use std::str::FromStr;

use valuecast_core::{ComparisonError, DynamicValue, Kind, Payload};

use crate::scalar::{Number, coerce_to_number, to_bool_lossy, to_string_lossy};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Gt,
        CompareOp::Ge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Check if this operator only tests equality.
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    /// Apply the operator to two ordered values.
    pub fn apply<T: PartialOrd + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

impl FromStr for CompareOp {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompareOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ComparisonError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The domain a pair of operands is compared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Absent,
    Text,
    Bool,
    Numeric,
}

impl Domain {
    /// Select the comparison domain for two operands.
    pub fn select(left: &DynamicValue, right: &DynamicValue) -> Domain {
        if is_absent(left) || is_absent(right) {
            return Domain::Absent;
        }
        let kinds = [left.unwrap_indirect().kind(), right.unwrap_indirect().kind()];
        if kinds.contains(&Kind::String) {
            Domain::Text
        } else if kinds.contains(&Kind::Bool) {
            Domain::Bool
        } else {
            Domain::Numeric
        }
    }
}

fn is_absent(value: &DynamicValue) -> bool {
    matches!(value.payload(), Payload::Invalid | Payload::Interface(None))
}

/// Compare two values with an operator given as text.
pub fn compare(left: &DynamicValue, right: &DynamicValue, op: &str) -> Result<bool, ComparisonError> {
    compare_op(left, right, op.parse()?)
}

/// Compare two values.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compare_op(
    left: &DynamicValue,
    right: &DynamicValue,
    op: CompareOp,
) -> Result<bool, ComparisonError> {
    match Domain::select(left, right) {
        Domain::Absent => {
            let both = is_absent(left) && is_absent(right);
            Ok(match op {
                CompareOp::Eq => both,
                CompareOp::Ne => !both,
                _ => false,
            })
        }
        Domain::Text => Ok(op.apply(
            to_string_lossy(left).as_bytes(),
            to_string_lossy(right).as_bytes(),
        )),
        Domain::Bool => {
            if !op.is_equality() {
                return Err(ComparisonError::UnsupportedOperator {
                    op: op.to_string(),
                    domain: "bool",
                });
            }
            Ok(op.apply(&to_bool_lossy(left), &to_bool_lossy(right)))
        }
        Domain::Numeric => compare_numbers(left, right, op),
    }
}

fn compare_numbers(
    left: &DynamicValue,
    right: &DynamicValue,
    op: CompareOp,
) -> Result<bool, ComparisonError> {
    use Number::*;

    let result = match (coerce_to_number(left), coerce_to_number(right)) {
        (Float(a), Float(b)) => op.apply(&a, &b),
        (Float(a), Signed(b)) => op.apply(&a, &(b as f64)),
        (Float(a), Unsigned(b)) => op.apply(&a, &(b as f64)),
        (Signed(a), Float(b)) => op.apply(&(a as f64), &b),
        (Unsigned(a), Float(b)) => op.apply(&(a as f64), &b),
        (Signed(a), Signed(b)) => op.apply(&a, &b),
        (Unsigned(a), Unsigned(b)) => op.apply(&a, &b),
        (Signed(a), Unsigned(b)) => op.apply(&i128::from(a), &i128::from(b)),
        (Unsigned(a), Signed(b)) => op.apply(&i128::from(a), &i128::from(b)),
        (Other(_), _) | (_, Other(_)) => {
            return Err(ComparisonError::UndecidableDomain {
                left: left.ty().to_string(),
                right: right.ty().to_string(),
                op: op.to_string(),
            });
        }
    };
    Ok(result)
}
