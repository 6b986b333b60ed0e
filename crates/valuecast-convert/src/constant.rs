//! Untyped compile-time constants.
//!
//! Constant folding works on four untyped kinds. Coercing between them uses the
//! same scalar rules as runtime values.

use std::fmt;

use valuecast_core::{CoercionError, DynamicValue, Kind, Payload};

use crate::scalar;

/// The kind of an untyped constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstKind {
    Bool,
    String,
    Int,
    Float,
}

impl ConstKind {
    /// The runtime kind a constant of this kind defaults to.
    pub fn default_kind(self) -> Kind {
        match self {
            ConstKind::Bool => Kind::Bool,
            ConstKind::String => Kind::String,
            ConstKind::Int => Kind::Int64,
            ConstKind::Float => Kind::Float64,
        }
    }
}

/// An untyped constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    String(String),
    Int(i64),
    Float(f64),
}

impl Constant {
    pub fn kind(&self) -> ConstKind {
        match self {
            Constant::Bool(_) => ConstKind::Bool,
            Constant::String(_) => ConstKind::String,
            Constant::Int(_) => ConstKind::Int,
            Constant::Float(_) => ConstKind::Float,
        }
    }

    /// The constant as a runtime value of its default type.
    pub fn to_value(&self) -> DynamicValue {
        match self {
            Constant::Bool(v) => DynamicValue::bool(*v),
            Constant::String(v) => DynamicValue::string(v.clone()),
            Constant::Int(v) => DynamicValue::int64(*v),
            Constant::Float(v) => DynamicValue::float64(*v),
        }
    }

    /// Read a constant from a scalar runtime value.
    pub fn from_value(value: &DynamicValue) -> Option<Constant> {
        match value.unwrap_indirect().payload() {
            Payload::Bool(v) => Some(Constant::Bool(*v)),
            Payload::String(v) => Some(Constant::String(v.clone())),
            Payload::Int(v) => Some(Constant::Int(*v)),
            Payload::Uint(v) => i64::try_from(*v).ok().map(Constant::Int),
            Payload::Float(v) => Some(Constant::Float(*v)),
            _ => None,
        }
    }

    /// Coerce to another constant kind.
    pub fn coerce(&self, kind: ConstKind) -> Result<Constant, CoercionError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        let payload = scalar::coerce_scalar(&self.to_value(), kind.default_kind())?;
        Ok(match payload {
            Payload::Bool(v) => Constant::Bool(v),
            Payload::String(v) => Constant::String(v),
            Payload::Int(v) => Constant::Int(v),
            Payload::Float(v) => Constant::Float(v),
            other => {
                return Err(CoercionError::Unsupported {
                    from: other.variant_name().to_string(),
                    target: kind.default_kind(),
                });
            }
        })
    }

    /// Normalize to a numeric constant.
    ///
    /// Bools become 0 or 1. Strings containing `.` parse as floats, other strings as
    /// integers.
    pub fn to_number(&self) -> Result<Constant, CoercionError> {
        match self {
            Constant::Bool(v) => Ok(Constant::Int(i64::from(*v))),
            Constant::String(s) if s.contains('.') => self.coerce(ConstKind::Float),
            Constant::String(_) => self.coerce(ConstKind::Int),
            Constant::Int(_) | Constant::Float(_) => Ok(self.clone()),
        }
    }

    /// Normalize to an integer constant, truncating floats.
    pub fn to_int(&self) -> Result<Constant, CoercionError> {
        match self.to_number()? {
            c @ Constant::Float(_) => c.coerce(ConstKind::Int),
            c => Ok(c),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::String(v) => write!(f, "{v:?}"),
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v}"),
        }
    }
}
