//! Struct, map and slice targets.

use valuecast_core::{ConversionError, DynamicValue, Kind, Payload, TypeDescriptor};

use super::{Converter, element_error, json_error, value_error};
use crate::config::SliceMismatch;
use crate::json;

impl Converter {
    pub(super) fn to_struct(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        // one level of pointer is followed, interfaces are always unwrapped
        let source = source.into_concrete();
        let source = match source.kind() {
            Kind::Pointer => match source.into_parts().1 {
                Payload::Pointer(Some(inner)) => inner.into_concrete(),
                _ => return Ok(DynamicValue::zero(target)),
            },
            _ => source,
        };

        match source.kind() {
            Kind::String => {
                let text = source.as_str().unwrap_or_default();
                tracing::debug!(to = %target, "decoding JSON text into struct");
                json::decode(text, target).map_err(json_error(source.ty(), target))
            }
            Kind::Struct => self.copy_struct(source, target, depth),
            Kind::Map => self.via_json(&source, target),
            Kind::Invalid | Kind::Interface => Ok(DynamicValue::zero(target)),
            _ => Err(ConversionError::unsupported(source.ty(), target)),
        }
    }

    /// Copy fields matched by name, converting each one. Unmatched target fields stay zero.
    fn copy_struct(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        let index = self.fields.resolve(source.ty(), target);
        let (from, payload) = source.into_parts();
        let Payload::Struct(values) = payload else {
            return Err(ConversionError::unsupported(&from, target));
        };

        let mut values: Vec<Option<DynamicValue>> = values.into_iter().map(Some).collect();
        let mut fields = Vec::with_capacity(target.fields().len());
        for (field, slot) in target.fields().iter().zip(index.iter()) {
            let matched = slot.and_then(|i| values.get_mut(i)).and_then(Option::take);
            let value = match matched {
                Some(v) => self
                    .convert_at(v, field.ty(), depth + 1)
                    .and_then(|v| fit(v, field.ty()))
                    .map_err(|e| element_error(&from, target, format!(".{}", field.name()), e))?,
                None => DynamicValue::zero(field.ty()),
            };
            fields.push(value);
        }

        DynamicValue::structure(target.clone(), fields).map_err(value_error(&from, target))
    }

    pub(super) fn to_map(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        // indirection stops only at nil pointers and nil interfaces
        let source = source.into_indirect();
        match source.kind() {
            Kind::Invalid | Kind::Pointer | Kind::Interface => Ok(DynamicValue::zero(target)),
            Kind::String => {
                let text = source.as_str().unwrap_or_default();
                if text.is_empty() {
                    return Ok(DynamicValue::zero(target));
                }
                tracing::debug!(to = %target, "decoding JSON text into map");
                json::decode(text, target).map_err(json_error(source.ty(), target))
            }
            Kind::Struct => self.via_json(&source, target),
            Kind::Map if same_entry_types(source.ty(), target) => {
                tracing::trace!(from = %source.ty(), to = %target, "map entry types match, reusing entries");
                let from = source.ty().clone();
                source.retag(target.clone()).map_err(value_error(&from, target))
            }
            Kind::Map => self.convert_entries(source, target, depth),
            _ => Err(ConversionError::unsupported(source.ty(), target)),
        }
    }

    fn convert_entries(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        let (from, payload) = source.into_parts();
        let (Payload::Map(entries), Some(src_key), Some(key_ty), Some(elem_ty)) =
            (payload, from.key(), target.key(), target.elem())
        else {
            return Err(ConversionError::unsupported(&from, target));
        };

        let mut converted = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let path = format!("[{key}]");
            let key = DynamicValue::new(src_key.clone(), key.to_payload())
                .map_err(value_error(&from, target))?;
            let key = self
                .convert_at(key, key_ty, depth + 1)
                .and_then(|k| fit(k, key_ty))
                .map_err(|e| element_error(&from, target, path.clone(), e))?;
            let value = self
                .convert_at(value, elem_ty, depth + 1)
                .and_then(|v| fit(v, elem_ty))
                .map_err(|e| element_error(&from, target, path, e))?;
            converted.push((key, value));
        }

        DynamicValue::map(target.clone(), converted).map_err(value_error(&from, target))
    }

    pub(super) fn to_slice(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        let source = source.into_indirect();
        match source.kind() {
            Kind::Slice => self.convert_elements(source, target, depth),
            Kind::String => {
                let from = source.ty().clone();
                let bytes = byte_slice(source.as_str().unwrap_or_default())
                    .map_err(value_error(&from, target))?;
                self.convert_at(bytes, target, depth + 1)
            }
            _ if source.is_nil() => Ok(DynamicValue::zero(target)),
            _ => match self.config.slice_mismatch {
                SliceMismatch::PassThrough => {
                    tracing::debug!(from = %source.ty(), to = %target, "source is not a slice, passing through");
                    Ok(source)
                }
                SliceMismatch::Reject => Err(ConversionError::unsupported_with(
                    source.ty(),
                    target,
                    "source is not a slice",
                )),
            },
        }
    }

    fn convert_elements(
        &self,
        source: DynamicValue,
        target: &TypeDescriptor,
        depth: usize,
    ) -> Result<DynamicValue, ConversionError> {
        let (from, payload) = source.into_parts();
        let (Payload::Slice(elems), Some(elem_ty)) = (payload, target.elem()) else {
            return Err(ConversionError::unsupported(&from, target));
        };

        let converted = elems
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                self.convert_at(e, elem_ty, depth + 1)
                    .and_then(|v| fit(v, elem_ty))
                    .map_err(|err| element_error(&from, target, format!("[{i}]"), err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        DynamicValue::slice(target.clone(), converted).map_err(value_error(&from, target))
    }
}

/// Reject a converted child whose type differs from its declared type, as a
/// pass-through slice fallback produces.
fn fit(value: DynamicValue, ty: &TypeDescriptor) -> Result<DynamicValue, ConversionError> {
    if value.ty() == ty {
        Ok(value)
    } else {
        Err(ConversionError::unsupported_with(
            value.ty(),
            ty,
            "value does not fit the element type",
        ))
    }
}

fn same_entry_types(source: &TypeDescriptor, target: &TypeDescriptor) -> bool {
    source.key() == target.key() && source.elem() == target.elem()
}

/// The bytes of a string as a `[]uint8` value.
fn byte_slice(text: &str) -> Result<DynamicValue, valuecast_core::ValueError> {
    let byte = TypeDescriptor::uint8();
    let elems = text
        .bytes()
        .map(|b| DynamicValue::new(byte.clone(), Payload::Uint(u64::from(b))))
        .collect::<Result<Vec<_>, _>>()?;
    DynamicValue::slice(TypeDescriptor::slice_of(byte), elems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use valuecast_core::{ErrorCategory, Field, MapKey};

    fn person() -> TypeDescriptor {
        TypeDescriptor::struct_of(vec![
            Field::new("Name", TypeDescriptor::string()).with_tag("name"),
            Field::new("Age", TypeDescriptor::int64()),
        ])
        .named("main.Person")
    }

    fn user() -> TypeDescriptor {
        TypeDescriptor::struct_of(vec![
            Field::new("ID", TypeDescriptor::string()),
            Field::new("Name", TypeDescriptor::string()),
            Field::new("Age", TypeDescriptor::string()),
        ])
        .named("main.User")
    }

    fn str_map(elem: TypeDescriptor) -> TypeDescriptor {
        TypeDescriptor::map_of(TypeDescriptor::string(), elem)
    }

    #[test]
    fn string_to_struct() {
        let conv = Converter::new();
        let p = conv
            .convert(DynamicValue::string(r#"{"name":"alex"}"#), &person())
            .unwrap();
        assert_eq!(p.ty(), &person());
        assert_eq!(p.field("Name"), Some(&DynamicValue::string("alex")));
        assert_eq!(p.field("Age"), Some(&DynamicValue::int64(0)));
    }

    #[test]
    fn malformed_json_fails() {
        let conv = Converter::new();
        let err = conv
            .convert(DynamicValue::string("{not json"), &person())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ParseFailure);
    }

    #[test]
    fn struct_copy_by_name() {
        let conv = Converter::new();
        let u = DynamicValue::structure(
            user(),
            vec![
                DynamicValue::string("u-1"),
                DynamicValue::string("alex"),
                DynamicValue::string("30"),
            ],
        )
        .unwrap();
        let p = conv.convert(u, &person()).unwrap();
        assert_eq!(p.field("Name"), Some(&DynamicValue::string("alex")));
        assert_eq!(p.field("Age"), Some(&DynamicValue::int64(30)));
        assert_eq!(conv.field_cache().len(), 1);
    }

    #[test]
    fn struct_copy_failure_names_field() {
        let conv = Converter::new();
        let u = DynamicValue::structure(
            user(),
            vec![
                DynamicValue::string(""),
                DynamicValue::string("alex"),
                DynamicValue::string("old"),
            ],
        )
        .unwrap();
        let err = conv.convert(u, &person()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralMismatch);
        assert!(matches!(&err, ConversionError::Element { path, .. } if path == ".Age"));
        assert_eq!(err.root_cause().category(), ErrorCategory::ParseFailure);
    }

    #[test]
    fn same_named_sources_do_not_share_field_maps() {
        let conv = Converter::new();
        let contact = TypeDescriptor::struct_of(vec![
            Field::new("Name", TypeDescriptor::string()),
            Field::new("Email", TypeDescriptor::string()),
        ])
        .named("main.Contact");

        let first = DynamicValue::structure(
            user(),
            vec![
                DynamicValue::string("u-1"),
                DynamicValue::string("alex"),
                DynamicValue::string("30"),
            ],
        )
        .unwrap();
        let out = conv.convert(first, &contact).unwrap();
        assert_eq!(out.field("Name"), Some(&DynamicValue::string("alex")));

        // another type declared under the same name, with a different layout
        let other_user = TypeDescriptor::struct_of(vec![
            Field::new("Name", TypeDescriptor::string()),
            Field::new("Email", TypeDescriptor::string()),
        ])
        .named("main.User");
        let second = DynamicValue::structure(
            other_user,
            vec![DynamicValue::string("sam"), DynamicValue::string("s@x.io")],
        )
        .unwrap();
        let out = conv.convert(second, &contact).unwrap();
        assert_eq!(out.field("Name"), Some(&DynamicValue::string("sam")));
        assert_eq!(out.field("Email"), Some(&DynamicValue::string("s@x.io")));
    }

    #[test]
    fn pass_through_child_fails_with_path() {
        let conv = Converter::new();
        let src_ty = TypeDescriptor::struct_of(vec![Field::new("Tags", TypeDescriptor::int64())]);
        let dst_ty = TypeDescriptor::struct_of(vec![Field::new(
            "Tags",
            TypeDescriptor::slice_of(TypeDescriptor::int64()),
        )]);
        let src = DynamicValue::structure(src_ty, vec![DynamicValue::int64(4)]).unwrap();
        let err = conv.convert(src, &dst_ty).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralMismatch);
        assert!(matches!(&err, ConversionError::Element { path, .. } if path == ".Tags"));
        assert_eq!(err.root_cause().category(), ErrorCategory::UnsupportedConversion);

        let nested = DynamicValue::slice(
            TypeDescriptor::slice_of(TypeDescriptor::int64()),
            vec![DynamicValue::int64(1), DynamicValue::int64(2)],
        )
        .unwrap();
        let grid = TypeDescriptor::slice_of(TypeDescriptor::slice_of(TypeDescriptor::int64()));
        let err = conv.convert(nested, &grid).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralMismatch);
        assert!(matches!(&err, ConversionError::Element { path, .. } if path == "[0]"));
    }

    #[test]
    fn struct_from_pointer_and_interface() {
        let conv = Converter::new();
        let anon = person().underlying();
        let u = DynamicValue::zero(&anon);
        let ptr = DynamicValue::pointer(TypeDescriptor::pointer_to(anon), Some(u)).unwrap();
        let boxed = DynamicValue::any(ptr);
        let p = conv.convert(boxed, &person()).unwrap();
        assert!(p.is_zero());
    }

    #[test]
    fn struct_from_unsupported_kind() {
        let conv = Converter::new();
        let err = conv.convert(DynamicValue::int64(1), &person()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedConversion);
    }

    #[test]
    fn map_to_struct_through_json() {
        let conv = Converter::new();
        let m = DynamicValue::map(
            str_map(TypeDescriptor::interface()),
            [
                (DynamicValue::string("name"), DynamicValue::any(DynamicValue::string("kim"))),
                (DynamicValue::string("Age"), DynamicValue::any(DynamicValue::int64(7))),
            ],
        )
        .unwrap();
        let p = conv.convert(m, &person()).unwrap();
        assert_eq!(p.field("Name"), Some(&DynamicValue::string("kim")));
        assert_eq!(p.field("Age"), Some(&DynamicValue::int64(7)));
    }

    #[test]
    fn struct_to_map_through_json() {
        let conv = Converter::new();
        let p = DynamicValue::structure(
            person(),
            vec![DynamicValue::string("alex"), DynamicValue::int64(30)],
        )
        .unwrap();
        let m = conv.convert(p, &str_map(TypeDescriptor::string())).unwrap_err();
        // Age is a JSON number, which a string element cannot hold
        assert_eq!(m.category(), ErrorCategory::ParseFailure);

        let p = DynamicValue::structure(
            person(),
            vec![DynamicValue::string("alex"), DynamicValue::int64(30)],
        )
        .unwrap();
        let m = conv.convert(p, &str_map(TypeDescriptor::interface())).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(
            m.get(&MapKey::string("Age")).and_then(|v| v.deref()),
            Some(&DynamicValue::float64(30.0))
        );
    }

    #[test]
    fn empty_string_is_empty_map() {
        let conv = Converter::new();
        let ty = str_map(TypeDescriptor::int64());
        let m = conv.convert(DynamicValue::string(""), &ty).unwrap();
        assert_eq!(m.ty(), &ty);
        assert!(m.is_empty());

        let m = conv.convert(DynamicValue::string(r#"{"a":1}"#), &ty).unwrap();
        assert_eq!(m.get(&MapKey::string("a")), Some(&DynamicValue::int64(1)));
    }

    #[test]
    fn matching_map_is_reused() {
        let conv = Converter::new();
        let named = str_map(TypeDescriptor::int64()).named("main.Scores");
        let m = DynamicValue::map(
            str_map(TypeDescriptor::int64()),
            [(DynamicValue::string("a"), DynamicValue::int64(1))],
        )
        .unwrap();
        let boxed = DynamicValue::any(m.clone());
        let out = conv.convert(boxed, &named).unwrap();
        assert_eq!(out.ty(), &named);
        assert_eq!(out.entries(), m.entries());
    }

    #[test]
    fn map_entries_convert() {
        let conv = Converter::new();
        let src = DynamicValue::map(
            str_map(TypeDescriptor::string()),
            [
                (DynamicValue::string("a"), DynamicValue::string("1")),
                (DynamicValue::string("b"), DynamicValue::string("2")),
            ],
        )
        .unwrap();
        let ty = TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::int32());
        let out = conv.convert(src, &ty).unwrap();
        assert_eq!(out.ty(), &ty);
        assert_eq!(
            out.get(&MapKey::string("b")),
            Some(&DynamicValue::new(TypeDescriptor::int32(), Payload::Int(2)).unwrap())
        );
    }

    #[test]
    fn map_conversion_is_all_or_nothing() {
        let conv = Converter::new();
        let src = DynamicValue::map(
            str_map(TypeDescriptor::string()),
            [
                (DynamicValue::string("a"), DynamicValue::string("1")),
                (DynamicValue::string("b"), DynamicValue::string("two")),
                (DynamicValue::string("c"), DynamicValue::string("3")),
            ],
        )
        .unwrap();
        let err = conv
            .convert(src, &str_map(TypeDescriptor::int64()))
            .unwrap_err();
        assert!(matches!(&err, ConversionError::Element { path, .. } if path == "[\"b\"]"));
    }

    #[test]
    fn map_from_scalar_fails() {
        let conv = Converter::new();
        let err = conv
            .convert(DynamicValue::int64(1), &str_map(TypeDescriptor::int64()))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedConversion);
    }

    #[test]
    fn slice_elements_convert() {
        let conv = Converter::new();
        let src = DynamicValue::slice(
            TypeDescriptor::slice_of(TypeDescriptor::int64()),
            vec![DynamicValue::int64(1), DynamicValue::int64(20)],
        )
        .unwrap();
        let ty = TypeDescriptor::slice_of(TypeDescriptor::string());
        let out = conv.convert(src, &ty).unwrap();
        assert_eq!(out.index(1), Some(&DynamicValue::string("20")));
    }

    #[test]
    fn slice_failure_reports_index() {
        let conv = Converter::new();
        let src = DynamicValue::slice(
            TypeDescriptor::slice_of(TypeDescriptor::string()),
            vec![DynamicValue::string("1"), DynamicValue::string("x")],
        )
        .unwrap();
        let err = conv
            .convert(src, &TypeDescriptor::slice_of(TypeDescriptor::int64()))
            .unwrap_err();
        assert!(matches!(&err, ConversionError::Element { path, .. } if path == "[1]"));
    }

    #[test]
    fn string_to_byte_slice() {
        let conv = Converter::new();
        let ty = TypeDescriptor::slice_of(TypeDescriptor::uint8());
        let out = conv.convert(DynamicValue::string("hi"), &ty).unwrap();
        assert_eq!(out.ty(), &ty);
        assert_eq!(out.len(), 2);
        assert_eq!(out.index(0).and_then(|b| b.as_u64()), Some(u64::from(b'h')));

        let ints = TypeDescriptor::slice_of(TypeDescriptor::int64());
        let out = conv.convert(DynamicValue::string("A"), &ints).unwrap();
        assert_eq!(out.index(0), Some(&DynamicValue::int64(65)));
    }

    #[test]
    fn slice_mismatch_policies() {
        let ty = TypeDescriptor::slice_of(TypeDescriptor::int64());

        let lenient = Converter::new();
        let out = lenient.convert(DynamicValue::int64(4), &ty).unwrap();
        assert_eq!(out, DynamicValue::int64(4));

        let strict =
            Converter::with_config(ConvertConfig::new().with_slice_mismatch(SliceMismatch::Reject));
        let err = strict.convert(DynamicValue::int64(4), &ty).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedConversion);
    }
}
