//! Value conversion engine.
//!
//! [`Converter::convert`] turns a [`DynamicValue`] into a value of a requested
//! [`TypeDescriptor`], recursing into composites element by element.
//!
//! ## Dispatch Order
//!
//! 1. Invalid source: the zero value of the target
//! 2. Identity (same descriptor): the source itself
//! 3. Rename (same kind and underlying shape, not a struct): the source retagged
//! 4. By target kind:
//!    - scalars: numeric and string coercion on the unwrapped source
//!    - string: coercion, byte slices as text, composites as JSON
//!    - struct: JSON decode, field copy by name, or a JSON round trip from maps
//!    - map: JSON decode, JSON round trip from structs, alias or per-entry conversion
//!    - slice: bytes from strings, per-element conversion, pass-through otherwise
//!    - pointer: convert the pointee and allocate
//!    - interface: box the concrete value
//!
//! Composite conversions are all-or-nothing: the first failing element aborts the
//! whole conversion and no partially built value escapes.

use valuecast_core::{
    CoercionError, ConversionError, DynamicValue, Kind, Payload, Shape, TypeDescriptor,
    ValueError,
};

use crate::config::ConvertConfig;
use crate::json::{self, JsonError};
use crate::scalar;

mod composite;
mod field_index;

pub use field_index::{FieldIndexCache, FieldMap};

/// Converts values between runtime types.
///
/// A converter is cheap to share: the only mutable state is the field-index cache,
/// which is internally synchronized.
#[derive(Debug, Default)]
pub struct Converter {
    config: ConvertConfig,
    fields: FieldIndexCache,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConvertConfig) -> Self {
        Self {
            config,
            fields: FieldIndexCache::new(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// The struct field-index cache.
    pub fn field_cache(&self) -> &FieldIndexCache {
        &self.fields
    }

    /// Convert `source` to a value of type `target`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn convert(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
    ) -> Result<DynamicValue, ConversionError> {
        self.convert_at(source, target, 0)
    }

    pub(crate) fn convert_at(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        if depth > self.config.max_depth {
            return Err(ConversionError::unsupported_with(
                source.ty(),
                target,
                format!("nesting exceeds depth {}", self.config.max_depth),
            ));
        }

        if source.is_invalid() {
            return Ok(DynamicValue::zero(target));
        }

        if source.ty() == target {
            tracing::trace!(to = %target, "identity conversion");
            return Ok(source);
        }

        let kind = target.kind();
        if source.kind() == kind && kind != Kind::Struct && source.ty().same_underlying(target) {
            tracing::trace!(from = %source.ty(), to = %target, "retagging renamed type");
            let from = source.ty().clone();
            return source.retag(target.clone()).map_err(value_error(&from, target));
        }

        match target.shape() {
            Shape::Basic(Kind::Invalid) => {
                tracing::debug!(from = %source.ty(), "invalid target type, passing source through");
                Ok(source)
            }
            Shape::Basic(Kind::String) => self.to_text(source, target),
            Shape::Basic(k) => to_scalar(source, target, *k),
            Shape::Struct(_) => self.to_struct(source, target, depth),
            Shape::Map { .. } => self.to_map(source, target, depth),
            Shape::Slice(_) => self.to_slice(source, target, depth),
            Shape::Pointer(elem) => self.to_pointer(source, target, elem, depth),
            Shape::Interface => {
                let from = source.ty().clone();
                DynamicValue::boxed(target.clone(), Some(source))
                    .map_err(value_error(&from, target))
            }
        }
    }

    fn to_text(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
    ) -> Result<DynamicValue, ConversionError> {
        let concrete = source.unwrap_indirect();
        let text = match concrete.payload() {
            Payload::Slice(_) if is_byte_slice(concrete.ty()) => {
                scalar::stringify(concrete).map_err(scalar_error(source.ty(), target))?
            }
            Payload::Struct(_) | Payload::Map(_) | Payload::Slice(_) => {
                tracing::debug!(from = %concrete.ty(), "encoding composite as JSON text");
                json::encode(concrete).map_err(json_error(source.ty(), target))?
            }
            _ => scalar::stringify(concrete).map_err(scalar_error(source.ty(), target))?,
        };
        DynamicValue::new(target.clone(), Payload::String(text))
            .map_err(value_error(source.ty(), target))
    }

    fn to_pointer(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        elem: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        let source = source.into_concrete();
        if source.is_nil() {
            return Ok(DynamicValue::zero(target));
        }
        let pointee = if source.kind() == Kind::Pointer {
            match source.into_parts().1 {
                Payload::Pointer(Some(inner)) => *inner,
                _ => return Ok(DynamicValue::zero(target)),
            }
        } else {
            source
        };

        let from = pointee.ty().clone();
        let converted = self.convert_at(pointee, elem, depth + 1)?;
        DynamicValue::pointer(target.clone(), Some(converted)).map_err(value_error(&from, target))
    }

    /// Convert through JSON text: encode the source, decode into the target.
    fn via_json(
        &self,
        source: &DynamicValue,
        target: &TypeDescriptor,
    ) -> Result<DynamicValue, ConversionError> {
        tracing::debug!(from = %source.ty(), to = %target, "converting through JSON");
        let text = json::encode(source).map_err(json_error(source.ty(), target))?;
        json::decode(&text, target).map_err(json_error(source.ty(), target))
    }
}

fn to_scalar(
    source: DynamicValue,
    target: &TypeDescriptor,
    kind: Kind,
) -> Result<DynamicValue, ConversionError> {
    let payload =
        scalar::coerce_scalar(&source, kind).map_err(scalar_error(source.ty(), target))?;
    DynamicValue::new(target.clone(), payload).map_err(value_error(source.ty(), target))
}

pub(crate) fn is_byte_slice(ty: &TypeDescriptor) -> bool {
    ty.kind() == Kind::Slice && ty.elem().is_some_and(|e| e.kind() == Kind::Uint8)
}

// =============================================================================
// Error helpers
// =============================================================================

fn scalar_error<'a>(
    from: &'a TypeDescriptor,
    to: &'a TypeDescriptor,
) -> impl FnOnce(CoercionError) -> ConversionError + 'a {
    move |source| ConversionError::Scalar {
        from: from.to_string(),
        to: to.to_string(),
        source,
    }
}

fn value_error<'a>(
    from: &'a TypeDescriptor,
    to: &'a TypeDescriptor,
) -> impl FnOnce(ValueError) -> ConversionError + 'a {
    move |source| ConversionError::Value {
        from: from.to_string(),
        to: to.to_string(),
        source,
    }
}

fn json_error<'a>(
    from: &'a TypeDescriptor,
    to: &'a TypeDescriptor,
) -> impl FnOnce(JsonError) -> ConversionError + 'a {
    move |err| match err {
        JsonError::Value(source) => ConversionError::Value {
            from: from.to_string(),
            to: to.to_string(),
            source,
        },
        JsonError::UnsupportedType(ty) => {
            ConversionError::unsupported_with(from, to, format!("{ty} has no JSON form"))
        }
        other => ConversionError::Json {
            from: from.to_string(),
            to: to.to_string(),
            message: other.to_string(),
        },
    }
}

fn element_error(
    from: &TypeDescriptor,
    to: &TypeDescriptor,
    path: String,
    source: ConversionError,
) -> ConversionError {
    ConversionError::Element {
        from: from.to_string(),
        to: to.to_string(),
        path,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuecast_core::{ErrorCategory, Field};

    fn celsius() -> TypeDescriptor {
        TypeDescriptor::float64().named("main.Celsius")
    }

    #[test]
    fn identity_returns_source() {
        let conv = Converter::new();
        let v = DynamicValue::string("x");
        assert_eq!(conv.convert(v.clone(), &TypeDescriptor::string()).unwrap(), v);
    }

    #[test]
    fn invalid_source_yields_zero() {
        let conv = Converter::new();
        let v = conv.convert(DynamicValue::invalid(), &TypeDescriptor::int32()).unwrap();
        assert_eq!(v.ty(), &TypeDescriptor::int32());
        assert_eq!(v.as_i64(), Some(0));
    }

    #[test]
    fn rename_retags() {
        let conv = Converter::new();
        let v = conv.convert(DynamicValue::float64(21.5), &celsius()).unwrap();
        assert_eq!(v.ty(), &celsius());
        assert_eq!(v.as_f64(), Some(21.5));

        let kelvin = TypeDescriptor::float64().named("main.Kelvin");
        let back = conv.convert(v, &kelvin).unwrap();
        assert_eq!(back.ty(), &kelvin);
    }

    #[test]
    fn scalar_targets() {
        let conv = Converter::new();
        let v = conv.convert(DynamicValue::string("0x10"), &TypeDescriptor::uint16()).unwrap();
        assert_eq!(v.as_u64(), Some(16));

        let v = conv.convert(DynamicValue::int64(300), &TypeDescriptor::float32()).unwrap();
        assert_eq!(v.as_f64(), Some(300.0));

        let v = conv.convert(DynamicValue::string("12"), &celsius()).unwrap();
        assert_eq!(v.ty(), &celsius());
        assert_eq!(v.as_f64(), Some(12.0));
    }

    #[test]
    fn scalar_failure_names_types() {
        let conv = Converter::new();
        let err = conv
            .convert(DynamicValue::string("abc"), &TypeDescriptor::int64())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ParseFailure);
        assert_eq!(err.from_type(), "string");
        assert_eq!(err.to_type(), "int64");
        assert!(matches!(
            err,
            ConversionError::Scalar {
                source: CoercionError::Parse { .. },
                ..
            }
        ));
    }

    #[test]
    fn numbers_to_string() {
        let conv = Converter::new();
        let v = conv.convert(DynamicValue::int64(123), &TypeDescriptor::string()).unwrap();
        assert_eq!(v.as_str(), Some("123"));
        let v = conv.convert(DynamicValue::float64(2.5), &TypeDescriptor::string()).unwrap();
        assert_eq!(v.as_str(), Some("2.5"));
    }

    #[test]
    fn struct_to_string_is_json() {
        let conv = Converter::new();
        let ty = TypeDescriptor::struct_of(vec![Field::new("A", TypeDescriptor::int64())]);
        let v = DynamicValue::structure(ty, vec![DynamicValue::int64(1)]).unwrap();
        let s = conv.convert(v, &TypeDescriptor::string()).unwrap();
        assert_eq!(s.as_str(), Some(r#"{"A":1}"#));
    }

    #[test]
    fn pointer_target_allocates() {
        let conv = Converter::new();
        let ty = TypeDescriptor::pointer_to(TypeDescriptor::int64());
        let v = conv.convert(DynamicValue::string("5"), &ty).unwrap();
        assert_eq!(v.ty(), &ty);
        assert_eq!(v.deref(), Some(&DynamicValue::int64(5)));

        let src = DynamicValue::pointer(
            TypeDescriptor::pointer_to(TypeDescriptor::string()),
            Some(DynamicValue::string("9")),
        )
        .unwrap();
        let v = conv.convert(src, &ty).unwrap();
        assert_eq!(v.deref(), Some(&DynamicValue::int64(9)));
    }

    #[test]
    fn nil_pointer_to_pointer() {
        let conv = Converter::new();
        let nil = DynamicValue::zero(&TypeDescriptor::pointer_to(TypeDescriptor::string()));
        let ty = TypeDescriptor::pointer_to(TypeDescriptor::int64());
        let v = conv.convert(nil, &ty).unwrap();
        assert!(v.is_nil());
        assert_eq!(v.ty(), &ty);
    }

    #[test]
    fn nil_interface_to_pointer() {
        let conv = Converter::new();
        let ty = TypeDescriptor::pointer_to(TypeDescriptor::int64());
        let v = conv
            .convert(DynamicValue::zero(&TypeDescriptor::interface()), &ty)
            .unwrap();
        assert!(v.is_nil());
        assert_eq!(v.ty(), &ty);

        let boxed_nil = DynamicValue::any(DynamicValue::zero(&ty));
        assert!(conv.convert(boxed_nil, &ty).unwrap().is_nil());
    }

    #[test]
    fn pointer_failure_propagates() {
        let conv = Converter::new();
        let ty = TypeDescriptor::pointer_to(TypeDescriptor::int64());
        let err = conv.convert(DynamicValue::string("x"), &ty).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ParseFailure);
    }

    #[test]
    fn interface_target_boxes() {
        let conv = Converter::new();
        let any = TypeDescriptor::interface();
        let v = conv.convert(DynamicValue::int64(3), &any).unwrap();
        assert_eq!(v.ty(), &any);
        assert_eq!(v.deref(), Some(&DynamicValue::int64(3)));

        let stringer = TypeDescriptor::interface().named("fmt.Stringer");
        let v = conv.convert(v, &stringer).unwrap();
        assert_eq!(v.ty(), &stringer);
        assert_eq!(v.deref(), Some(&DynamicValue::int64(3)));
    }

    #[test]
    fn depth_guard() {
        let conv = Converter::with_config(ConvertConfig::new().with_max_depth(1));
        let inner = TypeDescriptor::pointer_to(TypeDescriptor::int64());
        let ty = TypeDescriptor::pointer_to(inner);
        let err = conv.convert(DynamicValue::int64(1), &ty).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedConversion);
    }
}
