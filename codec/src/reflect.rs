//! Static type descriptions consumed by the walker and the resolver chain.
//!
//! A type takes part in serialization by implementing [Reflect], which
//! returns a [TypeInfo]: its identity, its name and a [Kind] describing how
//! its values can be taken apart and put back together. Values travel through
//! the engine as `&dyn Any` (encoding) and [AnyValue] (decoding).

use crate::{AggregateInfo, CustomSerializable, Error};
use std::{
    any::{type_name, Any, TypeId},
    fmt,
    sync::Arc,
};

/// An owned, type-erased value produced while decoding.
pub type AnyValue = Box<dyn Any>;

/// Lazily produces the [TypeInfo] of a child type (allows recursive types).
pub type TypeInfoFn = fn() -> TypeInfo;

/// Downcasts a decoded value into `T`.
pub fn take<T: Any>(value: AnyValue) -> Result<T, Error> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| Error::TypeMismatch(type_name::<T>()))
}

/// Downcasts a borrowed value into `&T`.
pub fn view<T: Any>(value: &dyn Any) -> Result<&T, Error> {
    value
        .downcast_ref::<T>()
        .ok_or(Error::TypeMismatch(type_name::<T>()))
}

/// A type that can describe its own structure.
pub trait Reflect: Any + Sized {
    fn type_info() -> TypeInfo;
}

/// A fieldless enum written by member name.
pub trait WireEnum: Sized {
    /// The member's symbolic name.
    fn name(&self) -> &'static str;

    /// The member with the given name, if any.
    fn from_name(name: &str) -> Option<Self>;
}

/// The identity and structure of a type.
#[derive(Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
}

impl TypeInfo {
    /// Describes `T` with an explicit [Kind].
    pub fn new<T: Any>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
        }
    }

    /// A type with no structure of its own, encoded only by a resolver.
    pub fn leaf<T: Any>() -> Self {
        Self::new::<T>(Kind::Leaf)
    }

    /// A fieldless enum encoded by member name.
    pub fn enumeration<T: WireEnum + Any>() -> Self {
        Self::new::<T>(Kind::Enum(EnumInfo::of::<T>()))
    }

    /// A type that writes and reads itself.
    pub fn custom<T: CustomSerializable + Any>() -> Self {
        Self::new::<T>(Kind::Custom(CustomInfo::of::<T>()))
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns true if this describes `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

/// How values of a type are taken apart and rebuilt.
#[derive(Clone)]
pub enum Kind {
    /// No structure visible to the engine (primitives, strings, UUIDs, ...).
    Leaf,
    Enum(EnumInfo),
    Sequence(SequenceInfo),
    Map(MapInfo),
    /// `Option<T>`: unwrapped into `T` plus the nullable marker. A nested
    /// `Option` keeps its own layer and presence flag.
    Nullable(NullableInfo),
    /// `Box<T>`: unwrapped into `T`.
    Pointer(PointerInfo),
    Aggregate(Arc<AggregateInfo>),
    Custom(CustomInfo),
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Enum(_) => "enum",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
            Self::Nullable(_) => "nullable",
            Self::Pointer(_) => "pointer",
            Self::Aggregate(_) => "aggregate",
            Self::Custom(_) => "custom",
        }
    }
}

/// Conversions between an enum and its member names.
#[derive(Clone, Copy)]
pub struct EnumInfo {
    pub name_of: fn(&dyn Any) -> Result<&'static str, Error>,
    pub from_name: fn(&str) -> Option<AnyValue>,
}

impl EnumInfo {
    pub fn of<T: WireEnum + Any>() -> Self {
        Self {
            name_of: |value| view::<T>(value).map(T::name),
            from_name: |name| T::from_name(name).map(|value| Box::new(value) as AnyValue),
        }
    }
}

/// A homogeneous sequence of elements.
#[derive(Clone, Copy)]
pub struct SequenceInfo {
    /// The declared element type. Sequences without one need a
    /// [crate::Marker::Streamable] marker at their site.
    pub element: Option<TypeInfoFn>,

    /// Borrows every element, in iteration order.
    pub elements: fn(&dyn Any) -> Result<Vec<&dyn Any>, Error>,

    /// Rebuilds the sequence from decoded elements.
    pub collect: fn(Vec<AnyValue>) -> Result<AnyValue, Error>,
}

/// Key/value pairs.
#[derive(Clone, Copy)]
pub struct MapInfo {
    pub key: TypeInfoFn,
    pub value: TypeInfoFn,
    pub entries: fn(&dyn Any) -> Result<Vec<(&dyn Any, &dyn Any)>, Error>,
    pub collect: fn(Vec<(AnyValue, AnyValue)>) -> Result<AnyValue, Error>,
}

/// A value that may be absent.
#[derive(Clone, Copy)]
pub struct NullableInfo {
    pub inner: TypeInfoFn,

    /// Borrows the inner value, if present.
    pub project: fn(&dyn Any) -> Result<Option<&dyn Any>, Error>,

    /// Wraps a decoded inner value (or its absence).
    pub wrap: fn(Option<AnyValue>) -> Result<AnyValue, Error>,
}

/// An owning pointer to a single value.
#[derive(Clone, Copy)]
pub struct PointerInfo {
    pub inner: TypeInfoFn,
    pub deref: fn(&dyn Any) -> Result<&dyn Any, Error>,
    pub wrap: fn(AnyValue) -> Result<AnyValue, Error>,
}

/// Entry points of a [CustomSerializable] type.
#[derive(Clone, Copy)]
pub struct CustomInfo {
    pub serialize: fn(&dyn Any, &mut crate::Buffer) -> Result<(), Error>,
    pub deserialize: fn(&mut crate::Buffer) -> Result<AnyValue, Error>,
}

impl CustomInfo {
    pub fn of<T: CustomSerializable + Any>() -> Self {
        Self {
            serialize: |value, buf| view::<T>(value)?.serialize(buf),
            deserialize: |buf| T::deserialize(buf).map(|value| Box::new(value) as AnyValue),
        }
    }
}
