//! JSON bridge between [`DynamicValue`] and text.
//!
//! Used by the conversion engine for string ↔ composite conversions and for the
//! map ↔ struct round trip. The encoding follows the interpreter's JSON package:
//!
//! - struct fields use their tag (or name) as key; a tag of `-` skips the field
//! - map keys are written in sorted order; only string and integer keys are allowed
//! - `[]uint8` is written as an array of numbers
//! - nil pointers and nil interfaces are `null`
//!
//! Decoding matches object keys to struct fields exactly first, then ASCII
//! case-insensitively. Unknown keys are ignored and `null` leaves the zero value.
//! Into the empty interface, objects decode as `map[string]interface {}`, arrays as
//! `[]interface {}` and numbers as `float64`.

use serde_json::{Map, Number, Value};
use thiserror::Error;
use valuecast_core::{
    DynamicValue, Field, Kind, MapEntries, MapKey, Payload, Shape, TypeDescriptor, ValueError,
};

/// JSON encoding or decoding failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Syntax(String),

    #[error("json: unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("json: unsupported type: {0}")]
    UnsupportedType(String),

    #[error("json: cannot unmarshal {found} into value of type {ty}")]
    Mismatch { found: String, ty: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

// ═══════════════════════════════════════════════════════════════
//  DynamicValue → JSON
// ═══════════════════════════════════════════════════════════════

/// Encode a value as compact JSON text.
pub fn encode(value: &DynamicValue) -> Result<String, JsonError> {
    Ok(to_json(value)?.to_string())
}

/// Build the JSON tree for a value.
pub fn to_json(value: &DynamicValue) -> Result<Value, JsonError> {
    match value.payload() {
        Payload::Invalid | Payload::Pointer(None) | Payload::Interface(None) => Ok(Value::Null),
        Payload::Bool(b) => Ok(Value::Bool(*b)),
        Payload::Int(i) => Ok(Value::Number(Number::from(*i))),
        Payload::Uint(u) => Ok(Value::Number(Number::from(*u))),
        Payload::Float(f) => float_to_json(*f, value.kind()),
        Payload::String(s) => Ok(Value::String(s.clone())),
        Payload::Slice(elems) => elems
            .iter()
            .map(to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Payload::Map(entries) => map_to_json(value.ty(), entries),
        Payload::Struct(values) => {
            let mut object = Map::new();
            for (field, v) in value.ty().fields().iter().zip(values) {
                if let Some(key) = field.json_key() {
                    object.insert(key.to_string(), to_json(v)?);
                }
            }
            Ok(Value::Object(object))
        }
        Payload::Pointer(Some(inner)) | Payload::Interface(Some(inner)) => to_json(inner),
    }
}

fn float_to_json(f: f64, kind: Kind) -> Result<Value, JsonError> {
    if !f.is_finite() {
        return Err(JsonError::UnsupportedValue(f.to_string()));
    }
    // float32 values are written with their shortest 32-bit representation
    let f = if kind == Kind::Float32 {
        (f as f32).to_string().parse::<f64>().unwrap_or(f)
    } else {
        f
    };
    // integral floats are written without a fraction so integer targets can read them
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Ok(Value::Number(Number::from(f as i64)));
    }
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| JsonError::UnsupportedValue(f.to_string()))
}

fn map_to_json(ty: &TypeDescriptor, entries: &MapEntries) -> Result<Value, JsonError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, v) in entries {
        let key = match key {
            MapKey::String(s) => s.clone(),
            MapKey::Int(i) => i.to_string(),
            MapKey::Uint(u) => u.to_string(),
            MapKey::Bool(_) | MapKey::Float(_) => {
                return Err(JsonError::UnsupportedType(ty.to_string()));
            }
        };
        pairs.push((key, to_json(v)?));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Value::Object(pairs.into_iter().collect()))
}

// ═══════════════════════════════════════════════════════════════
//  JSON → DynamicValue
// ═══════════════════════════════════════════════════════════════

/// Decode JSON text into a value of the target type.
pub fn decode(text: &str, target: &TypeDescriptor) -> Result<DynamicValue, JsonError> {
    let json: Value =
        serde_json::from_str(text).map_err(|e| JsonError::Syntax(e.to_string()))?;
    from_json(&json, target)
}

/// Build a value of the target type from a JSON tree.
pub fn from_json(json: &Value, target: &TypeDescriptor) -> Result<DynamicValue, JsonError> {
    if json.is_null() {
        return Ok(DynamicValue::zero(target));
    }

    let mismatch = || JsonError::Mismatch {
        found: describe(json),
        ty: target.to_string(),
    };

    match target.shape() {
        Shape::Basic(Kind::Bool) => match json {
            Value::Bool(b) => Ok(DynamicValue::new(target.clone(), Payload::Bool(*b))?),
            _ => Err(mismatch()),
        },
        Shape::Basic(Kind::String) => match json {
            Value::String(s) => Ok(DynamicValue::new(target.clone(), Payload::String(s.clone()))?),
            _ => Err(mismatch()),
        },
        Shape::Basic(kind) if kind.is_signed() => {
            let i = json.as_i64().ok_or_else(mismatch)?;
            DynamicValue::new(target.clone(), Payload::Int(i)).map_err(|_| mismatch())
        }
        Shape::Basic(kind) if kind.is_unsigned() => {
            let u = json.as_u64().ok_or_else(mismatch)?;
            DynamicValue::new(target.clone(), Payload::Uint(u)).map_err(|_| mismatch())
        }
        Shape::Basic(kind) if kind.is_float() => match json {
            Value::Number(n) => {
                let f = n.as_f64().ok_or_else(mismatch)?;
                Ok(DynamicValue::new(target.clone(), Payload::Float(f))?)
            }
            _ => Err(mismatch()),
        },
        Shape::Basic(_) => Err(JsonError::UnsupportedType(target.to_string())),
        Shape::Struct(fields) => match json {
            Value::Object(object) => object_to_struct(object, fields, target),
            _ => Err(mismatch()),
        },
        Shape::Map { key, elem } => match json {
            Value::Object(object) => {
                let mut entries = Vec::with_capacity(object.len());
                for (k, v) in object {
                    let k = decode_map_key(k, key).ok_or_else(|| JsonError::Mismatch {
                        found: format!("object key {k:?}"),
                        ty: key.to_string(),
                    })?;
                    entries.push((k, from_json(v, elem)?));
                }
                Ok(DynamicValue::map(target.clone(), entries)?)
            }
            _ => Err(mismatch()),
        },
        Shape::Slice(elem) => match json {
            Value::Array(items) => {
                let elems = items
                    .iter()
                    .map(|item| from_json(item, elem))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DynamicValue::slice(target.clone(), elems)?)
            }
            _ => Err(mismatch()),
        },
        Shape::Pointer(elem) => {
            let pointee = from_json(json, elem)?;
            Ok(DynamicValue::pointer(target.clone(), Some(pointee))?)
        }
        Shape::Interface => Ok(DynamicValue::boxed(target.clone(), Some(generic(json)))?),
    }
}

fn object_to_struct(
    object: &Map<String, Value>,
    fields: &[Field],
    target: &TypeDescriptor,
) -> Result<DynamicValue, JsonError> {
    let mut values: Vec<DynamicValue> = fields.iter().map(|f| DynamicValue::zero(f.ty())).collect();

    for (key, v) in object {
        let Some(index) = match_field(fields, key) else {
            continue;
        };
        values[index] = from_json(v, fields[index].ty())?;
    }

    Ok(DynamicValue::structure(target.clone(), values)?)
}

fn match_field(fields: &[Field], key: &str) -> Option<usize> {
    fields
        .iter()
        .position(|f| f.json_key() == Some(key))
        .or_else(|| {
            fields
                .iter()
                .position(|f| f.json_key().is_some_and(|k| k.eq_ignore_ascii_case(key)))
        })
}

fn decode_map_key(text: &str, key: &TypeDescriptor) -> Option<DynamicValue> {
    let payload = match key.kind() {
        Kind::String => Payload::String(text.to_string()),
        k if k.is_signed() => Payload::Int(text.parse().ok()?),
        k if k.is_unsigned() => Payload::Uint(text.parse().ok()?),
        _ => return None,
    };
    DynamicValue::new(key.clone(), payload).ok()
}

/// Decode a JSON tree the way the empty interface receives it.
fn generic(json: &Value) -> DynamicValue {
    match json {
        Value::Null => DynamicValue::invalid(),
        Value::Bool(b) => DynamicValue::bool(*b),
        Value::Number(n) => DynamicValue::float64(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => DynamicValue::string(s.clone()),
        Value::Array(items) => {
            let elems = items.iter().map(|i| DynamicValue::any(generic(i))).collect();
            DynamicValue::slice(any_slice(), elems).unwrap_or_else(|_| DynamicValue::invalid())
        }
        Value::Object(object) => {
            let entries = object
                .iter()
                .map(|(k, v)| (DynamicValue::string(k.clone()), DynamicValue::any(generic(v))));
            DynamicValue::map(any_map(), entries).unwrap_or_else(|_| DynamicValue::invalid())
        }
    }
}

fn any_slice() -> TypeDescriptor {
    TypeDescriptor::slice_of(TypeDescriptor::interface())
}

fn any_map() -> TypeDescriptor {
    TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::interface())
}

fn describe(json: &Value) -> String {
    match json {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
