//! Runtime values tagged with their type descriptor.
//!
//! A [`DynamicValue`] pairs a [`TypeDescriptor`] with a [`Payload`]. The checked
//! constructors guarantee the payload always matches the descriptor's kind, that
//! narrow integers fit their width, and that composite children carry the
//! element types their container declares.

use std::fmt;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::{Kind, Shape, TypeDescriptor, ValueError};

/// Entries of a map value, keyed by the hashable form of the key.
pub type MapEntries = FxHashMap<MapKey, DynamicValue>;

/// Hashable wrapper for map keys.
///
/// Only scalar kinds can be map keys. The key's full type is the map's key descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// Floating point key (uses OrderedFloat for hashing)
    Float(OrderedFloat<f64>),
    String(String),
}

impl MapKey {
    /// Try to create a key from a scalar payload.
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Bool(v) => Some(MapKey::Bool(*v)),
            Payload::Int(v) => Some(MapKey::Int(*v)),
            Payload::Uint(v) => Some(MapKey::Uint(*v)),
            Payload::Float(v) => Some(MapKey::Float(OrderedFloat(*v))),
            Payload::String(v) => Some(MapKey::String(v.clone())),
            _ => None,
        }
    }

    /// Convert the key back to a payload.
    pub fn to_payload(&self) -> Payload {
        match self {
            MapKey::Bool(v) => Payload::Bool(*v),
            MapKey::Int(v) => Payload::Int(*v),
            MapKey::Uint(v) => Payload::Uint(*v),
            MapKey::Float(v) => Payload::Float(v.0),
            MapKey::String(v) => Payload::String(v.clone()),
        }
    }

    #[inline]
    pub fn string(v: impl Into<String>) -> Self {
        MapKey::String(v.into())
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(v) => write!(f, "{v}"),
            MapKey::Int(v) => write!(f, "{v}"),
            MapKey::Uint(v) => write!(f, "{v}"),
            MapKey::Float(v) => write!(f, "{}", v.0),
            MapKey::String(v) => write!(f, "{v:?}"),
        }
    }
}

/// The data carried by a runtime value.
///
/// Signed integers of every width are stored as `i64`, unsigned as `u64`, and both
/// float widths as `f64`; the descriptor records the declared width.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Invalid,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Field values in declaration order.
    Struct(Vec<DynamicValue>),
    Map(MapEntries),
    Slice(Vec<DynamicValue>),
    /// `None` is the nil pointer.
    Pointer(Option<Box<DynamicValue>>),
    /// The concrete value held by an interface; `None` is the nil interface.
    Interface(Option<Box<DynamicValue>>),
}

impl Payload {
    /// Short name of the payload variant, for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Payload::Invalid => "invalid",
            Payload::Bool(_) => "bool",
            Payload::Int(_) => "int",
            Payload::Uint(_) => "uint",
            Payload::Float(_) => "float",
            Payload::String(_) => "string",
            Payload::Struct(_) => "struct",
            Payload::Map(_) => "map",
            Payload::Slice(_) => "slice",
            Payload::Pointer(_) => "pointer",
            Payload::Interface(_) => "interface",
        }
    }

    /// The zero payload for a descriptor.
    pub fn zero(ty: &TypeDescriptor) -> Payload {
        match ty.shape() {
            Shape::Basic(kind) => match kind {
                Kind::Bool => Payload::Bool(false),
                k if k.is_signed() => Payload::Int(0),
                k if k.is_unsigned() => Payload::Uint(0),
                k if k.is_float() => Payload::Float(0.0),
                Kind::String => Payload::String(String::new()),
                _ => Payload::Invalid,
            },
            Shape::Struct(fields) => Payload::Struct(
                fields
                    .iter()
                    .map(|f| DynamicValue::zero(f.ty()))
                    .collect(),
            ),
            Shape::Map { .. } => Payload::Map(MapEntries::default()),
            Shape::Slice(_) => Payload::Slice(Vec::new()),
            Shape::Pointer(_) => Payload::Pointer(None),
            Shape::Interface => Payload::Interface(None),
        }
    }
}

/// A runtime value tagged with its type descriptor.
#[derive(Clone, PartialEq)]
pub struct DynamicValue {
    ty: TypeDescriptor,
    payload: Payload,
}

impl DynamicValue {
    /// Create a value, checking that the payload fits the descriptor.
    pub fn new(ty: TypeDescriptor, payload: Payload) -> Result<Self, ValueError> {
        let payload = check_payload(&ty, payload)?;
        Ok(Self { ty, payload })
    }

    /// The absent value.
    pub fn invalid() -> Self {
        Self {
            ty: TypeDescriptor::invalid(),
            payload: Payload::Invalid,
        }
    }

    /// The zero value of a type.
    pub fn zero(ty: &TypeDescriptor) -> Self {
        Self {
            payload: Payload::zero(ty),
            ty: ty.clone(),
        }
    }

    pub fn bool(v: bool) -> Self {
        Self {
            ty: TypeDescriptor::bool(),
            payload: Payload::Bool(v),
        }
    }

    pub fn int64(v: i64) -> Self {
        Self {
            ty: TypeDescriptor::int64(),
            payload: Payload::Int(v),
        }
    }

    pub fn uint64(v: u64) -> Self {
        Self {
            ty: TypeDescriptor::uint64(),
            payload: Payload::Uint(v),
        }
    }

    pub fn float64(v: f64) -> Self {
        Self {
            ty: TypeDescriptor::float64(),
            payload: Payload::Float(v),
        }
    }

    pub fn float32(v: f32) -> Self {
        Self {
            ty: TypeDescriptor::float32(),
            payload: Payload::Float(v as f64),
        }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self {
            ty: TypeDescriptor::string(),
            payload: Payload::String(v.into()),
        }
    }

    /// Build a struct value from field values in declaration order.
    pub fn structure(ty: TypeDescriptor, fields: Vec<DynamicValue>) -> Result<Self, ValueError> {
        Self::new(ty, Payload::Struct(fields))
    }

    /// Build a slice value.
    pub fn slice(ty: TypeDescriptor, elems: Vec<DynamicValue>) -> Result<Self, ValueError> {
        Self::new(ty, Payload::Slice(elems))
    }

    /// Build a map value from key/value pairs. Later duplicates replace earlier ones.
    pub fn map(
        ty: TypeDescriptor,
        entries: impl IntoIterator<Item = (DynamicValue, DynamicValue)>,
    ) -> Result<Self, ValueError> {
        let mut map = MapEntries::default();
        for (key, value) in entries {
            let key = key.into_map_key()?;
            map.insert(key, value);
        }
        Self::new(ty, Payload::Map(map))
    }

    /// Build a pointer value; `None` is the nil pointer.
    pub fn pointer(ty: TypeDescriptor, pointee: Option<DynamicValue>) -> Result<Self, ValueError> {
        Self::new(ty, Payload::Pointer(pointee.map(Box::new)))
    }

    /// Box a concrete value into an interface type; `None` is the nil interface.
    ///
    /// Interface values never nest: boxing an interface value stores its content.
    pub fn boxed(ty: TypeDescriptor, content: Option<DynamicValue>) -> Result<Self, ValueError> {
        Self::new(ty, Payload::Interface(content.map(Box::new)))
    }

    /// Box a concrete value into the empty interface.
    pub fn any(content: DynamicValue) -> Self {
        let content = content.into_interface_content();
        Self {
            ty: TypeDescriptor::interface(),
            payload: Payload::Interface(content.map(Box::new)),
        }
    }

    #[inline]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn into_parts(self) -> (TypeDescriptor, Payload) {
        (self.ty, self.payload)
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        matches!(self.payload, Payload::Invalid)
    }

    /// Whether this is a nil pointer or a nil interface.
    pub fn is_nil(&self) -> bool {
        matches!(self.payload, Payload::Pointer(None) | Payload::Interface(None))
    }

    /// Reinterpret this value as a type with the same underlying shape.
    pub fn retag(self, ty: TypeDescriptor) -> Result<Self, ValueError> {
        if !self.ty.same_underlying(&ty) {
            return Err(ValueError::Retag {
                from: self.ty.to_string(),
                to: ty.to_string(),
            });
        }
        Ok(Self {
            ty,
            payload: self.payload,
        })
    }

    /// Strip pointer and interface indirection.
    ///
    /// Stops at a nil pointer or nil interface and returns it.
    pub fn unwrap_indirect(&self) -> &DynamicValue {
        let mut current = self;
        loop {
            match &current.payload {
                Payload::Pointer(Some(inner)) | Payload::Interface(Some(inner)) => current = inner,
                _ => return current,
            }
        }
    }

    /// Owned form of [`unwrap_indirect`](Self::unwrap_indirect).
    pub fn into_indirect(self) -> DynamicValue {
        let mut current = self;
        loop {
            match current.payload {
                Payload::Pointer(Some(inner)) | Payload::Interface(Some(inner)) => {
                    current = *inner
                }
                payload => {
                    return DynamicValue {
                        ty: current.ty,
                        payload,
                    };
                }
            }
        }
    }

    /// Strip interface indirection only, keeping pointers.
    pub fn into_concrete(self) -> DynamicValue {
        let mut current = self;
        loop {
            match current.payload {
                Payload::Interface(Some(inner)) => current = *inner,
                payload => {
                    return DynamicValue {
                        ty: current.ty,
                        payload,
                    };
                }
            }
        }
    }

    /// The value to store when boxing into an interface.
    fn into_interface_content(self) -> Option<DynamicValue> {
        match self.payload {
            Payload::Interface(inner) => inner.map(|b| *b),
            Payload::Invalid => None,
            payload => Some(DynamicValue {
                ty: self.ty,
                payload,
            }),
        }
    }

    /// Convert a scalar value into a map key.
    pub fn into_map_key(self) -> Result<MapKey, ValueError> {
        let concrete = self.into_concrete();
        MapKey::from_payload(&concrete.payload).ok_or_else(|| ValueError::UnhashableKey {
            ty: concrete.ty.to_string(),
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload {
            Payload::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.payload {
            Payload::Uint(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::String(v) => Some(v),
            _ => None,
        }
    }

    /// Field of a struct value by name.
    pub fn field(&self, name: &str) -> Option<&DynamicValue> {
        match &self.payload {
            Payload::Struct(fields) => fields.get(self.ty.field_index(name)?),
            _ => None,
        }
    }

    /// Element of a slice value.
    pub fn index(&self, i: usize) -> Option<&DynamicValue> {
        match &self.payload {
            Payload::Slice(elems) => elems.get(i),
            _ => None,
        }
    }

    /// Entry of a map value.
    pub fn get(&self, key: &MapKey) -> Option<&DynamicValue> {
        match &self.payload {
            Payload::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Map entries, if this is a map.
    pub fn entries(&self) -> Option<&MapEntries> {
        match &self.payload {
            Payload::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Slice elements, if this is a slice.
    pub fn elements(&self) -> Option<&[DynamicValue]> {
        match &self.payload {
            Payload::Slice(elems) => Some(elems),
            _ => None,
        }
    }

    /// Pointee of a non-nil pointer, or content of a non-nil interface.
    pub fn deref(&self) -> Option<&DynamicValue> {
        match &self.payload {
            Payload::Pointer(Some(inner)) | Payload::Interface(Some(inner)) => Some(inner),
            _ => None,
        }
    }

    /// Number of elements of a slice, map, string or struct.
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Slice(elems) => elems.len(),
            Payload::Map(entries) => entries.len(),
            Payload::String(s) => s.len(),
            Payload::Struct(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the zero value of its type.
    pub fn is_zero(&self) -> bool {
        match &self.payload {
            Payload::Invalid => true,
            Payload::Bool(v) => !v,
            Payload::Int(v) => *v == 0,
            Payload::Uint(v) => *v == 0,
            Payload::Float(v) => *v == 0.0,
            Payload::String(v) => v.is_empty(),
            Payload::Struct(fields) => fields.iter().all(DynamicValue::is_zero),
            Payload::Map(entries) => entries.is_empty(),
            Payload::Slice(elems) => elems.is_empty(),
            Payload::Pointer(p) | Payload::Interface(p) => p.is_none(),
        }
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty)?;
        match &self.payload {
            Payload::Invalid => write!(f, "<invalid>")?,
            Payload::Bool(v) => write!(f, "{v}")?,
            Payload::Int(v) => write!(f, "{v}")?,
            Payload::Uint(v) => write!(f, "{v}")?,
            Payload::Float(v) => write!(f, "{v}")?,
            Payload::String(v) => write!(f, "{v:?}")?,
            Payload::Struct(fields) => f
                .debug_map()
                .entries(self.ty.fields().iter().map(|d| d.name()).zip(fields))
                .finish()?,
            Payload::Map(entries) => {
                let mut sorted: Vec<_> = entries.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                f.debug_map().entries(sorted).finish()?
            }
            Payload::Slice(elems) => f.debug_list().entries(elems).finish()?,
            Payload::Pointer(None) | Payload::Interface(None) => write!(f, "nil")?,
            Payload::Pointer(Some(inner)) => write!(f, "&{inner:?}")?,
            Payload::Interface(Some(inner)) => write!(f, "{inner:?}")?,
        }
        write!(f, ")")
    }
}

// =============================================================================
// Shape checking
// =============================================================================

fn check_payload(ty: &TypeDescriptor, payload: Payload) -> Result<Payload, ValueError> {
    let mismatch = |payload: &Payload| ValueError::ShapeMismatch {
        ty: ty.to_string(),
        payload: payload.variant_name(),
    };

    match (ty.shape(), payload) {
        (Shape::Basic(Kind::Invalid), Payload::Invalid) => Ok(Payload::Invalid),
        (Shape::Basic(Kind::Bool), p @ Payload::Bool(_)) => Ok(p),
        (Shape::Basic(Kind::String), p @ Payload::String(_)) => Ok(p),
        (Shape::Basic(kind), Payload::Int(v)) if kind.is_signed() => {
            let (min, max) = kind.signed_range().unwrap_or((i64::MIN, i64::MAX));
            if v < min || v > max {
                return Err(ValueError::OutOfRange {
                    value: v.to_string(),
                    ty: ty.to_string(),
                });
            }
            Ok(Payload::Int(v))
        }
        (Shape::Basic(kind), Payload::Uint(v)) if kind.is_unsigned() => {
            if v > kind.unsigned_max().unwrap_or(u64::MAX) {
                return Err(ValueError::OutOfRange {
                    value: v.to_string(),
                    ty: ty.to_string(),
                });
            }
            Ok(Payload::Uint(v))
        }
        (Shape::Basic(Kind::Float32), Payload::Float(v)) => Ok(Payload::Float(v as f32 as f64)),
        (Shape::Basic(Kind::Float64), p @ Payload::Float(_)) => Ok(p),
        (Shape::Struct(decls), Payload::Struct(fields)) => {
            if decls.len() != fields.len() {
                return Err(ValueError::FieldCount {
                    ty: ty.to_string(),
                    expected: decls.len(),
                    got: fields.len(),
                });
            }
            for (decl, field) in decls.iter().zip(&fields) {
                check_element(ty, decl.ty(), field)?;
            }
            Ok(Payload::Struct(fields))
        }
        (Shape::Map { key, elem }, Payload::Map(entries)) => {
            if !key.kind().is_scalar() {
                return Err(ValueError::UnhashableKey {
                    ty: key.to_string(),
                });
            }
            for (k, v) in &entries {
                check_element(ty, key, &DynamicValue::new(key.clone(), k.to_payload())?)?;
                check_element(ty, elem, v)?;
            }
            Ok(Payload::Map(entries))
        }
        (Shape::Slice(elem), Payload::Slice(elems)) => {
            for e in &elems {
                check_element(ty, elem, e)?;
            }
            Ok(Payload::Slice(elems))
        }
        (Shape::Pointer(elem), Payload::Pointer(pointee)) => {
            if let Some(p) = &pointee {
                check_element(ty, elem, p)?;
            }
            Ok(Payload::Pointer(pointee))
        }
        (Shape::Interface, Payload::Interface(content)) => {
            let content = content.and_then(|b| b.into_interface_content());
            Ok(Payload::Interface(content.map(Box::new)))
        }
        (_, payload) => Err(mismatch(&payload)),
    }
}

fn check_element(
    container: &TypeDescriptor,
    expected: &TypeDescriptor,
    got: &DynamicValue,
) -> Result<(), ValueError> {
    if got.ty() == expected {
        Ok(())
    } else {
        Err(ValueError::ElementType {
            container: container.to_string(),
            expected: expected.to_string(),
            got: got.ty().to_string(),
        })
    }
}
