//! Runtime value coercion core for an embeddable interpreter.
//!
//! Values flowing between differently typed slots are converted by a single
//! engine with well-defined rules for scalars, strings, structs, maps, slices,
//! pointers and interfaces. Relational operators compare values across
//! normalized domains. Every failure is a typed, recoverable error.
//!
//! The crate is split into:
//!
//! - `valuecast-core`: type descriptors, dynamic values and the error taxonomy
//! - `valuecast-convert`: the coercion, conversion, comparison and assignment engine
//! - this crate: the [`Context`] facade and a prelude

mod context;
mod error;

pub use context::Context;
pub use error::{Error, Result};

pub use valuecast_convert::{
    CompareOp, ConstKind, Constant, ConvertConfig, Converter, SliceMismatch, Slot, assign,
    can_convert, can_convert_to_bool, compare, compare_op, convert, is_nil_like,
};
pub use valuecast_convert::{json, scalar};
pub use valuecast_core as types;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use valuecast_convert::{
        CompareOp, ConstKind, Constant, ConvertConfig, Converter, SliceMismatch, Slot,
    };
    pub use valuecast_core::{
        AssignError, CoercionError, ComparisonError, ConversionError, DynamicValue,
        ErrorCategory, Field, Kind, MapKey, Payload, TypeDescriptor,
    };
}
