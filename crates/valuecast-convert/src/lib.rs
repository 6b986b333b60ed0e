//! Conversion, comparison and assignment engine for valuecast.
//!
//! This crate implements the runtime coercion core of the interpreter:
//!
//! - [`scalar`]: numeric and string coercion between scalar kinds
//! - [`json`]: the JSON bridge used for string and map ↔ struct conversions
//! - [`Converter`]: the value conversion engine
//! - [`compare`]: relational and equality operators across value domains
//! - [`Slot`] / [`Converter::assign`]: assignment into typed storage
//! - [`Constant`]: coercion of untyped compile-time constants
//!
//! The free functions [`convert`], [`compare`] and [`assign`] use a shared
//! converter with the default [`ConvertConfig`].

use std::sync::OnceLock;

use valuecast_core::{AssignError, ConversionError, DynamicValue, TypeDescriptor};

mod assign;
pub mod compare;
mod config;
mod constant;
mod conversion;
pub mod json;
pub mod scalar;

pub use assign::{Slot, can_convert_to_bool, is_assignable, is_nil_like};
pub use compare::{CompareOp, Domain, compare, compare_op};
pub use config::{ConvertConfig, SliceMismatch};
pub use constant::{ConstKind, Constant};
pub use conversion::{Converter, FieldIndexCache, FieldMap};
pub use json::JsonError;
pub use scalar::{Number, coerce_scalar, coerce_to_number};

/// The shared converter used by the free functions.
pub fn default_converter() -> &'static Converter {
    static INSTANCE: OnceLock<Converter> = OnceLock::new();
    INSTANCE.get_or_init(Converter::new)
}

/// Convert `source` to `target` with the default configuration.
pub fn convert(
    source: DynamicValue,
    target: &TypeDescriptor,
) -> Result<DynamicValue, ConversionError> {
    default_converter().convert(source, target)
}

/// Assign `value` into `slot` with the default configuration.
pub fn assign(slot: &mut Slot, value: DynamicValue) -> Result<(), AssignError> {
    default_converter().assign(slot, value)
}

/// Whether values of type `from` can be converted to `to` with the default configuration.
pub fn can_convert(from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    default_converter().can_convert(from, to)
}
