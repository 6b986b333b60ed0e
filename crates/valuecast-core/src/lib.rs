//! Type and value model for the valuecast runtime coercion core.
//!
//! This crate provides the data model every other layer consumes:
//!
//! - [`Kind`] / [`KindFlags`]: the closed set of runtime type kinds
//! - [`TypeHash`]: deterministic type identity
//! - [`TypeDescriptor`]: immutable, shareable type descriptions
//! - [`DynamicValue`] / [`Payload`]: runtime values tagged with their descriptor
//! - the error taxonomy shared by the conversion, comparison and assignment engines

mod descriptor;
mod error;
mod kind;
mod type_hash;
mod value;

pub use descriptor::{Field, Shape, TypeDescriptor};
pub use error::{
    AssignError, CoercionError, ComparisonError, ConversionError, ErrorCategory, ValueError,
};
pub use kind::{Kind, KindFlags};
pub use type_hash::{TypeHash, hash_constants};
pub use value::{DynamicValue, MapEntries, MapKey, Payload};
