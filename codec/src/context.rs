//! Serialization sites.

use crate::{
    reflect::{NullableInfo, PointerInfo},
    AnyValue, Error, Kind, Reflect, TypeInfo, TypeInfoFn,
};
use std::any::{Any, TypeId};

/// Metadata attached to a field, constructor parameter or root value.
#[derive(Clone, Copy, Debug)]
pub enum Marker {
    /// The value may be absent. Added automatically for `Option<T>` sites.
    Nullable,

    /// Elements of the sequence at this site have the given type.
    Streamable(TypeInfoFn),

    /// A free-form tag for user resolvers and transforms.
    Tag(&'static str),
}

impl Marker {
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable)
    }
}

/// Stable identity of a serialization site, used to memoize codecs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Site {
    /// A top-level value of the given type.
    Root(TypeId),
    /// Field `index` of an aggregate.
    Field(TypeId, usize),
    /// Parameter of constructor `.1` of an aggregate, at position `.2`.
    Param(TypeId, usize, usize),
    /// Elements of a sequence, keyed by the element type.
    Element(TypeId),
    /// Keys of a map, keyed by the key type.
    Key(TypeId),
    /// Values of a map, keyed by the value type.
    Value(TypeId),
    /// The inner `Option` of a nested option, keyed by its type.
    Inner(TypeId),
}

/// A wrapper stripped off the declared type, outermost first.
#[derive(Clone, Copy)]
enum Layer {
    Nullable(NullableInfo),
    Pointer(PointerInfo),
}

/// Describes one serialization site: its declared and unwrapped type, its
/// markers and, when encoding, the value found there.
///
/// `Option<T>` and `Box<T>` layers are stripped from the declared type, so
/// resolvers see `T`. A stripped `Option` adds [Marker::Nullable].
///
/// Only one `Option` is stripped per site. For `Option<Option<T>>` the site
/// unwraps to `Option<T>`, which gets a presence flag of its own.
#[derive(Clone)]
pub struct ElementContext<'v> {
    declared: TypeInfo,
    unwrapped: TypeInfo,
    layers: Vec<Layer>,
    markers: Vec<Marker>,
    value: Option<&'v dyn Any>,
    site: Option<Site>,
}

impl<'v> ElementContext<'v> {
    /// Creates a context for a site of the `declared` type.
    pub fn new(declared: TypeInfo, markers: &[Marker]) -> Self {
        let mut markers = markers.to_vec();
        let mut layers = Vec::new();
        let mut unwrapped = declared.clone();
        let mut nullable = false;
        loop {
            let (layer, inner) = match unwrapped.kind() {
                Kind::Nullable(_) if nullable => break,
                Kind::Nullable(info) => {
                    nullable = true;
                    (Layer::Nullable(*info), info.inner)
                }
                Kind::Pointer(info) => (Layer::Pointer(*info), info.inner),
                _ => break,
            };
            layers.push(layer);
            unwrapped = inner();
        }
        if nullable && !markers.iter().any(Marker::is_nullable) {
            markers.push(Marker::Nullable);
        }
        Self {
            declared,
            unwrapped,
            layers,
            markers,
            value: None,
            site: None,
        }
    }

    /// Creates a context for a site of type `T`.
    pub fn of<T: Reflect>() -> Self {
        Self::new(T::type_info(), &[])
    }

    /// Creates a context for encoding `value`.
    pub fn for_value<T: Reflect>(value: &'v T) -> Self {
        Self::of::<T>().with_value(value)
    }

    /// Attaches the runtime value found at this site (of the declared type).
    pub fn with_value(mut self, value: &'v dyn Any) -> Self {
        self.value = Some(value);
        self
    }

    /// Replaces the runtime value, reusing the context for the next element.
    pub(crate) fn set_value(&mut self, value: &'v dyn Any) {
        self.value = Some(value);
    }

    /// Attaches the site identity used to memoize the resolved codec.
    pub fn at(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    /// The type as declared at the site, including `Option`/`Box` layers.
    pub fn declared_type(&self) -> &TypeInfo {
        &self.declared
    }

    /// The type with `Option`/`Box` layers removed.
    pub fn type_info(&self) -> &TypeInfo {
        &self.unwrapped
    }

    pub fn kind(&self) -> &Kind {
        self.unwrapped.kind()
    }

    pub fn type_id(&self) -> TypeId {
        self.unwrapped.id()
    }

    pub fn type_name(&self) -> &'static str {
        self.unwrapped.name()
    }

    /// Returns true if the unwrapped type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.unwrapped.is::<T>()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn is_nullable(&self) -> bool {
        self.markers.iter().any(Marker::is_nullable)
    }

    /// Returns true if the site carries [Marker::Tag] with `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.markers
            .iter()
            .any(|m| matches!(m, Marker::Tag(t) if *t == tag))
    }

    /// The element type named by a [Marker::Streamable] marker, if any.
    pub fn streamable_element(&self) -> Option<TypeInfoFn> {
        self.markers.iter().find_map(|m| match m {
            Marker::Streamable(element) => Some(*element),
            _ => None,
        })
    }

    /// The value at this site (of the declared type), if encoding.
    pub fn value(&self) -> Option<&'v dyn Any> {
        self.value
    }

    /// The value at this site with layers removed; `None` if absent.
    pub fn unwrapped_value(&self) -> Result<Option<&'v dyn Any>, Error> {
        match self.value {
            Some(value) => self.project(value),
            None => Ok(None),
        }
    }

    pub fn site(&self) -> Option<Site> {
        self.site
    }

    /// Strips the layers off a value of the declared type.
    pub(crate) fn project<'a>(&self, value: &'a dyn Any) -> Result<Option<&'a dyn Any>, Error> {
        let mut current = value;
        for layer in &self.layers {
            current = match layer {
                Layer::Nullable(info) => match (info.project)(current)? {
                    Some(inner) => inner,
                    None => return Ok(None),
                },
                Layer::Pointer(info) => (info.deref)(current)?,
            };
        }
        Ok(Some(current))
    }

    /// Rebuilds a value of the declared type from a decoded unwrapped value.
    pub(crate) fn rewrap(&self, value: Option<AnyValue>) -> Result<AnyValue, Error> {
        let mut current = value;
        for layer in self.layers.iter().rev() {
            current = match layer {
                Layer::Nullable(info) => Some((info.wrap)(current)?),
                Layer::Pointer(info) => current.map(info.wrap).transpose()?,
            };
        }
        current.ok_or(Error::UnexpectedNull(self.declared.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::take;

    #[test]
    fn test_option_is_unwrapped() {
        let ctx = ElementContext::of::<Option<String>>();
        assert!(ctx.is::<String>());
        assert!(ctx.declared_type().is::<Option<String>>());
        assert!(ctx.is_nullable());
        assert!(matches!(ctx.kind(), Kind::Leaf));
    }

    #[test]
    fn test_nested_layers() {
        let value = Some(Box::new(5i32));
        let ctx = ElementContext::for_value(&value);
        assert!(ctx.is::<i32>());
        assert!(ctx.is_nullable());
        let inner = ctx.unwrapped_value().unwrap().unwrap();
        assert_eq!(inner.downcast_ref::<i32>(), Some(&5));

        let rebuilt = ctx.rewrap(Some(Box::new(6i32))).unwrap();
        assert_eq!(take::<Option<Box<i32>>>(rebuilt).unwrap(), Some(Box::new(6)));
        let rebuilt = ctx.rewrap(None).unwrap();
        assert_eq!(take::<Option<Box<i32>>>(rebuilt).unwrap(), None);
    }

    #[test]
    fn test_absent_value_projects_to_none() {
        let value: Option<i64> = None;
        let ctx = ElementContext::for_value(&value);
        assert!(ctx.unwrapped_value().unwrap().is_none());
    }

    #[test]
    fn test_one_option_stripped_per_site() {
        let ctx = ElementContext::of::<Option<Box<Option<i8>>>>();
        assert!(ctx.is::<Option<i8>>());
        assert!(ctx.is_nullable());
        assert!(matches!(ctx.kind(), Kind::Nullable(_)));

        let value = Some(Box::new(None::<i8>));
        let inner = ctx.project(&value).unwrap().unwrap();
        assert_eq!(inner.downcast_ref::<Option<i8>>(), Some(&None));
        assert!(ctx.project(&None::<Box<Option<i8>>>).unwrap().is_none());
    }

    #[test]
    fn test_null_without_nullable_layer() {
        let ctx = ElementContext::of::<Box<i32>>();
        assert!(!ctx.is_nullable());
        assert!(matches!(ctx.rewrap(None), Err(Error::UnexpectedNull(_))));
    }

    #[test]
    fn test_markers() {
        let ctx = ElementContext::new(
            <Vec<i32>>::type_info(),
            &[Marker::Tag("compact"), Marker::Streamable(i32::type_info)],
        );
        assert!(ctx.has_tag("compact"));
        assert!(!ctx.has_tag("other"));
        assert!(!ctx.is_nullable());
        assert!(ctx.streamable_element().is_some_and(|f| f().is::<i32>()));
    }
}
