//! Embedding entry point.
//!
//! A `Context` owns a configured [`Converter`] and exposes the three operations
//! the execution engine calls: conversion, comparison and assignment.
//!
//! # Example
//!
//! ```
//! use valuecast::prelude::*;
//!
//! let ctx = Context::new();
//! let v = ctx.convert(DynamicValue::int64(123), &TypeDescriptor::string()).unwrap();
//! assert_eq!(v.as_str(), Some("123"));
//!
//! assert_eq!(ctx.compare(&DynamicValue::uint64(5), &DynamicValue::int64(-1), "<"), Ok(false));
//! ```

use valuecast_convert::{CompareOp, ConvertConfig, Converter, Slot};
use valuecast_core::{
    AssignError, ComparisonError, ConversionError, DynamicValue, TypeDescriptor,
};

/// Coercion context for one interpreter instance.
///
/// A context can be shared between threads; calls on disjoint values run in
/// parallel.
#[derive(Debug, Default)]
pub struct Context {
    converter: Converter,
}

impl Context {
    /// Create a context with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom configuration.
    pub fn with_config(config: ConvertConfig) -> Self {
        tracing::debug!(?config, "creating coercion context");
        Self {
            converter: Converter::with_config(config),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        self.converter.config()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Convert a value to the target type.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] naming the source and target types when no rule
    /// applies or a nested element fails.
    pub fn convert(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
    ) -> Result<DynamicValue, ConversionError> {
        self.converter.convert(source, target)
    }

    /// Compare two values with an operator given as text (`==`, `!=`, `<`, `<=`, `>`, `>=`).
    ///
    /// # Errors
    ///
    /// Returns a [`ComparisonError`] for unknown operators, ordering operators on
    /// bools, and operands with no numeric form.
    pub fn compare(
        &self,
        left: &DynamicValue,
        right: &DynamicValue,
        op: &str,
    ) -> Result<bool, ComparisonError> {
        valuecast_convert::compare(left, right, op)
    }

    /// Compare two values with a parsed operator.
    pub fn compare_op(
        &self,
        left: &DynamicValue,
        right: &DynamicValue,
        op: CompareOp,
    ) -> Result<bool, ComparisonError> {
        valuecast_convert::compare_op(left, right, op)
    }

    /// Store a value into a typed slot, converting it if needed.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignError`] if the conversion fails; the slot keeps its
    /// previous value.
    pub fn assign(&self, slot: &mut Slot, value: DynamicValue) -> Result<(), AssignError> {
        self.converter.assign(slot, value)
    }

    /// Whether values of type `from` can be converted to `to`.
    pub fn can_convert(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        self.converter.can_convert(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuecast_convert::SliceMismatch;

    #[test]
    fn config_is_applied() {
        let ctx = Context::with_config(ConvertConfig::new().with_slice_mismatch(SliceMismatch::Reject));
        assert_eq!(ctx.config().slice_mismatch, SliceMismatch::Reject);
        let ty = TypeDescriptor::slice_of(TypeDescriptor::string());
        assert!(ctx.convert(DynamicValue::bool(true), &ty).is_err());
    }

    #[test]
    fn assign_through_context() {
        let ctx = Context::new();
        let mut slot = Slot::new(TypeDescriptor::float64());
        ctx.assign(&mut slot, DynamicValue::string("1.25")).unwrap();
        assert_eq!(slot.value().as_f64(), Some(1.25));
    }
}
