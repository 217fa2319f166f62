//! Type codecs: paired encoders and decoders for one type.
//!
//! A [TypeCodec] works on type-erased values. `None` stands for an absent
//! value at a nullable site: plain codecs reject it with
//! [Error::UnexpectedNull] and only transforms (such as the nullable
//! transform) give it meaning.

use crate::{
    reflect::{view, EnumInfo, MapInfo, SequenceInfo},
    AnyValue, Buffer, ElementContext, Error, Site, TypeInfo, TypeInfoFn, Walker,
};
use std::{
    any::{type_name, Any},
    sync::Arc,
};

/// Encodes and decodes values of one type.
pub trait TypeCodec: Send + Sync {
    /// Writes `value` (or its absence) to the walker's buffer.
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error>;

    /// Reads a value (or its absence) from the walker's buffer.
    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error>;
}

type EncodeFn<T> = dyn Fn(&mut Buffer, &T) -> Result<(), Error> + Send + Sync;
type DecodeFn<T> = dyn Fn(&mut Buffer) -> Result<T, Error> + Send + Sync;

/// A [TypeCodec] for `T` built from two closures over the [Buffer].
///
/// # Example
///
/// ```
/// use packetwire_codec::{TypeCodec, TypedCodec};
/// use std::sync::Arc;
///
/// let codec: Arc<dyn TypeCodec> = TypedCodec::new(
///     |buf, v: &u32| buf.write_i32(*v as i32),
///     |buf| Ok(buf.read_i32()? as u32),
/// )
/// .shared();
/// ```
pub struct TypedCodec<T> {
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T: Any> TypedCodec<T> {
    /// Pairs an encoder and a decoder for `T`.
    pub fn new(
        encode: impl Fn(&mut Buffer, &T) -> Result<(), Error> + Send + Sync + 'static,
        decode: impl Fn(&mut Buffer) -> Result<T, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }

    /// Erases the codec for use as a resolver result.
    pub fn shared(self) -> Arc<dyn TypeCodec> {
        Arc::new(self)
    }
}

impl<T: Any> TypeCodec for TypedCodec<T> {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(type_name::<T>()))?;
        (self.encode)(walker.buffer(), view::<T>(value)?)
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        let value: AnyValue = Box::new((self.decode)(walker.buffer())?);
        Ok(Some(value))
    }
}

/// Writes enums by member name.
pub(crate) struct EnumCodec {
    name: &'static str,
    info: EnumInfo,
}

impl EnumCodec {
    pub(crate) fn new(ty: &TypeInfo, info: EnumInfo) -> Self {
        Self {
            name: ty.name(),
            info,
        }
    }
}

impl TypeCodec for EnumCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.name))?;
        let name = (self.info.name_of)(value)?;
        walker.buffer().write_string(name)
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        let name = walker.buffer().read_string()?;
        match (self.info.from_name)(&name) {
            Some(value) => Ok(Some(value)),
            None => Err(Error::InvalidEnumValue(self.name, name)),
        }
    }
}

/// Writes a sequence as an `i64` count followed by each element, each
/// element encoded through the walker.
pub(crate) struct StreamCodec {
    ty: TypeInfo,
    info: SequenceInfo,
    element: TypeInfoFn,
}

impl StreamCodec {
    pub(crate) fn new(ty: &TypeInfo, info: SequenceInfo, element: TypeInfoFn) -> Self {
        Self {
            ty: ty.clone(),
            info,
            element,
        }
    }

    fn element_context<'v>(&self) -> ElementContext<'v> {
        let element = (self.element)();
        let site = Site::Element(element.id());
        ElementContext::new(element, &[]).at(site)
    }
}

impl TypeCodec for StreamCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.ty.name()))?;
        let elements = (self.info.elements)(value)?;
        walker.buffer().write_long_len(elements.len())?;
        let mut ctx = self.element_context();
        for element in elements {
            ctx.set_value(element);
            walker.encode(&ctx)?;
        }
        Ok(())
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        let limit = walker.buffer().config().collection_len;
        let len = walker.buffer().read_long_len(limit)?;
        let ctx = self.element_context();
        let mut elements = Vec::with_capacity(len.min(walker.buffer().len()));
        for _ in 0..len {
            elements.push(walker.decode(&ctx)?);
        }
        (self.info.collect)(elements).map(Some)
    }
}

/// Writes a map as an `i32` count followed by interleaved keys and values.
pub(crate) struct MapCodec {
    ty: TypeInfo,
    info: MapInfo,
}

impl MapCodec {
    pub(crate) fn new(ty: &TypeInfo, info: MapInfo) -> Self {
        Self {
            ty: ty.clone(),
            info,
        }
    }

    fn contexts<'v>(&self) -> (ElementContext<'v>, ElementContext<'v>) {
        let key = (self.info.key)();
        let value = (self.info.value)();
        let key_site = Site::Key(key.id());
        let value_site = Site::Value(value.id());
        (
            ElementContext::new(key, &[]).at(key_site),
            ElementContext::new(value, &[]).at(value_site),
        )
    }
}

impl TypeCodec for MapCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.ty.name()))?;
        let entries = (self.info.entries)(value)?;
        walker.buffer().write_len(entries.len())?;
        let (mut key_ctx, mut value_ctx) = self.contexts();
        for (key, value) in entries {
            key_ctx.set_value(key);
            walker.encode(&key_ctx)?;
            value_ctx.set_value(value);
            walker.encode(&value_ctx)?;
        }
        Ok(())
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        let limit = walker.buffer().config().collection_len;
        let len = walker.buffer().read_len(limit)?;
        let (key_ctx, value_ctx) = self.contexts();
        let mut entries = Vec::with_capacity(len.min(walker.buffer().len()));
        for _ in 0..len {
            let key = walker.decode(&key_ctx)?;
            let value = walker.decode(&value_ctx)?;
            entries.push((key, value));
        }
        (self.info.collect)(entries).map(Some)
    }
}

/// Writes the inner `Option` of a nested option through its own site, which
/// adds a second presence flag.
pub(crate) struct InnerOptionCodec {
    ty: TypeInfo,
}

impl InnerOptionCodec {
    pub(crate) fn new(ty: &TypeInfo) -> Self {
        Self { ty: ty.clone() }
    }

    fn context<'v>(&self) -> ElementContext<'v> {
        ElementContext::new(self.ty.clone(), &[]).at(Site::Inner(self.ty.id()))
    }
}

impl TypeCodec for InnerOptionCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.ty.name()))?;
        walker.encode(&self.context().with_value(value))
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        walker.decode(&self.context()).map(Some)
    }
}
