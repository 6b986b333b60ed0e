//! TypeDescriptor - immutable description of a runtime type.
//!
//! A descriptor combines a [`Shape`] (kind plus composite structure) with an optional
//! package-qualified name. Descriptors are reference counted and cheap to clone; they
//! are built once by the type checker and shared read-only by every value of the type.
//!
//! # Example
//!
//! ```
//! use valuecast_core::{Field, Kind, TypeDescriptor};
//!
//! let person = TypeDescriptor::struct_of(vec![
//!     Field::new("Name", TypeDescriptor::string()).with_tag("name"),
//!     Field::new("Age", TypeDescriptor::int64()),
//! ])
//! .named("main.Person");
//!
//! assert_eq!(person.kind(), Kind::Struct);
//! assert_eq!(person.to_string(), "main.Person");
//! assert_eq!(person.underlying().to_string(), "struct { Name string; Age int64 }");
//! ```

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::{Kind, TypeHash};

/// A struct field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    tag: Option<String>,
    ty: TypeDescriptor,
}

impl Field {
    /// Create a field with no JSON tag.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            tag: None,
            ty,
        }
    }

    /// Set the JSON key for this field. A tag of `-` excludes it from JSON.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// The key this field uses in JSON text, or `None` if it is excluded.
    pub fn json_key(&self) -> Option<&str> {
        match self.tag.as_deref() {
            Some("-") => None,
            Some(tag) if !tag.is_empty() => Some(tag),
            _ => Some(&self.name),
        }
    }
}

/// The structure of a type, independent of its name.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A scalar kind or [`Kind::Invalid`].
    Basic(Kind),
    /// Ordered field declarations.
    Struct(Vec<Field>),
    Map {
        key: TypeDescriptor,
        elem: TypeDescriptor,
    },
    Slice(TypeDescriptor),
    Pointer(TypeDescriptor),
    /// The empty interface; it can hold a value of any concrete type.
    Interface,
}

impl Shape {
    /// Get the kind described by this shape.
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Basic(kind) => *kind,
            Shape::Struct(_) => Kind::Struct,
            Shape::Map { .. } => Kind::Map,
            Shape::Slice(_) => Kind::Slice,
            Shape::Pointer(_) => Kind::Pointer,
            Shape::Interface => Kind::Interface,
        }
    }

    fn structural_hash(&self) -> TypeHash {
        match self {
            Shape::Basic(kind) => TypeHash::from_name(kind.name()),
            Shape::Struct(fields) => {
                let parts: Vec<TypeHash> = fields
                    .iter()
                    .flat_map(|f| [TypeHash::from_field(&f.name), f.ty.hash()])
                    .collect();
                TypeHash::from_composite(TypeHash::STRUCT, &parts)
            }
            Shape::Map { key, elem } => {
                TypeHash::from_composite(TypeHash::MAP, &[key.hash(), elem.hash()])
            }
            Shape::Slice(elem) => TypeHash::from_composite(TypeHash::SLICE, &[elem.hash()]),
            Shape::Pointer(elem) => TypeHash::from_composite(TypeHash::POINTER, &[elem.hash()]),
            Shape::Interface => TypeHash::from_name("interface {}"),
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Basic(kind) => write!(f, "{kind}"),
            Shape::Struct(fields) if fields.is_empty() => write!(f, "struct {{}}"),
            Shape::Struct(fields) => {
                write!(f, "struct {{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            Shape::Map { key, elem } => write!(f, "map[{key}]{elem}"),
            Shape::Slice(elem) => write!(f, "[]{elem}"),
            Shape::Pointer(elem) => write!(f, "*{elem}"),
            Shape::Interface => write!(f, "interface {{}}"),
        }
    }
}

#[derive(Debug)]
struct TypeInfo {
    name: Option<String>,
    hash: TypeHash,
    shape_hash: TypeHash,
    shape: Shape,
}

/// Immutable, shareable description of a runtime type.
///
/// Two descriptors are equal when they have the same name (or are both unnamed)
/// and the same shape. Clones share storage.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<TypeInfo>);

impl TypeDescriptor {
    /// Create an unnamed descriptor from a shape.
    pub fn from_shape(shape: Shape) -> Self {
        let hash = shape.structural_hash();
        Self(Arc::new(TypeInfo {
            name: None,
            hash,
            shape_hash: hash,
            shape,
        }))
    }

    /// Create the descriptor of a scalar kind.
    ///
    /// Composite kinds map to their empty form (`struct {}`, `interface {}`);
    /// use the dedicated constructors for maps, slices and pointers.
    pub fn basic(kind: Kind) -> Self {
        match kind {
            Kind::Struct => Self::struct_of(Vec::new()),
            Kind::Interface => Self::interface(),
            Kind::Map => Self::map_of(Self::string(), Self::interface()),
            Kind::Slice => Self::slice_of(Self::interface()),
            Kind::Pointer => Self::pointer_to(Self::interface()),
            _ => Self::from_shape(Shape::Basic(kind)),
        }
    }

    /// The descriptor of the absent value.
    pub fn invalid() -> Self {
        Self::from_shape(Shape::Basic(Kind::Invalid))
    }

    pub fn bool() -> Self {
        Self::basic(Kind::Bool)
    }

    pub fn int8() -> Self {
        Self::basic(Kind::Int8)
    }

    pub fn int16() -> Self {
        Self::basic(Kind::Int16)
    }

    pub fn int32() -> Self {
        Self::basic(Kind::Int32)
    }

    pub fn int64() -> Self {
        Self::basic(Kind::Int64)
    }

    pub fn uint8() -> Self {
        Self::basic(Kind::Uint8)
    }

    pub fn uint16() -> Self {
        Self::basic(Kind::Uint16)
    }

    pub fn uint32() -> Self {
        Self::basic(Kind::Uint32)
    }

    pub fn uint64() -> Self {
        Self::basic(Kind::Uint64)
    }

    pub fn float32() -> Self {
        Self::basic(Kind::Float32)
    }

    pub fn float64() -> Self {
        Self::basic(Kind::Float64)
    }

    pub fn string() -> Self {
        Self::basic(Kind::String)
    }

    pub fn interface() -> Self {
        Self::from_shape(Shape::Interface)
    }

    pub fn struct_of(fields: Vec<Field>) -> Self {
        Self::from_shape(Shape::Struct(fields))
    }

    pub fn map_of(key: TypeDescriptor, elem: TypeDescriptor) -> Self {
        Self::from_shape(Shape::Map { key, elem })
    }

    pub fn slice_of(elem: TypeDescriptor) -> Self {
        Self::from_shape(Shape::Slice(elem))
    }

    pub fn pointer_to(elem: TypeDescriptor) -> Self {
        Self::from_shape(Shape::Pointer(elem))
    }

    /// Define a named type over this descriptor's underlying shape.
    ///
    /// `TypeDescriptor::int64().named("main.Celsius")` models `type Celsius int64`.
    pub fn named(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        Self(Arc::new(TypeInfo {
            hash: TypeHash::from_name(&name),
            name: Some(name),
            shape_hash: self.0.shape_hash,
            shape: self.0.shape.clone(),
        }))
    }

    /// The unnamed descriptor with the same shape.
    pub fn underlying(&self) -> Self {
        if self.0.name.is_none() {
            return self.clone();
        }
        Self::from_shape(self.0.shape.clone())
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.0.shape.kind()
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    /// The package-qualified name, if this is a named type.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Identity hash: the name hash for named types, a structural hash otherwise.
    #[inline]
    pub fn hash(&self) -> TypeHash {
        self.0.hash
    }

    /// Structural hash of the underlying shape, ignoring the name.
    #[inline]
    pub fn shape_hash(&self) -> TypeHash {
        self.0.shape_hash
    }

    /// Whether both descriptors share storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether both descriptors have the same underlying shape, ignoring top-level names.
    pub fn same_underlying(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.shape == other.0.shape
    }

    /// Struct fields, or an empty slice for non-struct types.
    pub fn fields(&self) -> &[Field] {
        match &self.0.shape {
            Shape::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    /// Key descriptor of a map type.
    pub fn key(&self) -> Option<&TypeDescriptor> {
        match &self.0.shape {
            Shape::Map { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Element descriptor of a map, slice or pointer type.
    pub fn elem(&self) -> Option<&TypeDescriptor> {
        match &self.0.shape {
            Shape::Map { elem, .. } | Shape::Slice(elem) | Shape::Pointer(elem) => Some(elem),
            _ => None,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.name == other.0.name && self.0.shape == other.0.shape)
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.0.shape),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}
