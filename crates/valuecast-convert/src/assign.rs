//! Assignment into typed slots.
//!
//! A [`Slot`] is a storage location with a declared type: a variable, a struct
//! field, a map or slice element. Assigning a value of the declared type (or a
//! rename of it) stores it directly; anything else goes through the conversion
//! engine first. A failed conversion leaves the slot untouched and is returned to
//! the caller as an [`AssignError`].

use valuecast_core::{AssignError, ConversionError, DynamicValue, Kind, Payload, TypeDescriptor};

use crate::conversion::Converter;

/// A storage location with a declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    ty: TypeDescriptor,
    value: DynamicValue,
}

impl Slot {
    /// Create a slot holding the zero value of its type.
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            value: DynamicValue::zero(&ty),
            ty,
        }
    }

    /// The declared type.
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn value(&self) -> &DynamicValue {
        &self.value
    }

    pub fn into_value(self) -> DynamicValue {
        self.value
    }
}

/// Whether a value of type `from` can be stored in a slot of type `to` without conversion.
pub fn is_assignable(from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    from == to || (from.kind() == to.kind() && to.kind() != Kind::Struct && from.same_underlying(to))
}

/// Whether values of this type can be used as a condition.
pub fn can_convert_to_bool(ty: &TypeDescriptor) -> bool {
    let kind = ty.kind();
    kind == Kind::Bool || kind.is_numeric() || kind == Kind::String || kind == Kind::Interface
}

/// Whether a value counts as nil: a nil pointer or interface, an interface holding a
/// zero value, or the zero value of any other type.
pub fn is_nil_like(value: &DynamicValue) -> bool {
    match value.payload() {
        Payload::Interface(Some(content)) => content.is_zero(),
        _ if value.kind().is_nullable() => value.is_nil(),
        _ => value.is_zero(),
    }
}

impl Converter {
    /// Store `value` into `slot`, converting it to the slot's type if needed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn assign(&self, slot: &mut Slot, value: DynamicValue) -> Result<(), AssignError> {
        if value.ty() == &slot.ty {
            slot.value = value;
            return Ok(());
        }

        // renames are retagged by the converter without copying
        let value_type = value.ty().to_string();
        let result = self.convert(value, &slot.ty).and_then(|converted| {
            // permissive fallbacks may hand back a value of another type
            if converted.ty() == &slot.ty {
                Ok(converted)
            } else {
                Err(ConversionError::unsupported_with(
                    converted.ty(),
                    &slot.ty,
                    "value does not fit the slot type",
                ))
            }
        });

        match result {
            Ok(converted) => {
                slot.value = converted;
                Ok(())
            }
            Err(source) => {
                tracing::debug!(slot = %slot.ty, value = %value_type, error = %source, "assignment failed");
                Err(AssignError {
                    slot_type: slot.ty.to_string(),
                    value_type,
                    source,
                })
            }
        }
    }

    /// Whether values of type `from` can be converted to type `to`.
    ///
    /// Strings are always considered convertible since success depends on their text.
    /// Other types are probed with their zero value.
    pub fn can_convert(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        if is_assignable(from, to) || from.kind() == Kind::String {
            return true;
        }
        self.convert(DynamicValue::zero(from), to).is_ok()
    }
}
