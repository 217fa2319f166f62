//! Prioritized codec resolver chain.
//!
//! Resolvers are consulted in descending priority; among equal priorities the
//! one registered first wins. The first resolver whose predicate matches an
//! [ElementContext] produces the codec for that site.

use crate::{
    codec::{EnumCodec, MapCodec, StreamCodec},
    Buffer, ElementContext, Error, Kind, TypeCodec, TypedCodec,
};
use bytes::Bytes;
use std::{any::Any, cmp::Reverse, sync::Arc};
use uuid::Uuid;

/// Priorities of the built-in resolvers.
pub mod priority {
    /// Exact-type resolvers for primitives and `String`.
    pub const PRIMITIVE: i32 = 400;
    /// Exact-type resolvers for UUIDs and byte arrays.
    pub const LEAF: i32 = 300;
    pub const ENUM: i32 = 200;
    pub const MAP: i32 = 150;
    pub const STREAMABLE: i32 = 100;
}

/// Decides whether a resolver or transform applies to a site.
pub type Predicate = Box<dyn Fn(&ElementContext<'_>) -> bool + Send + Sync>;

/// Produces the codec for a matched site.
pub type Factory =
    Box<dyn Fn(&ElementContext<'_>) -> Result<Arc<dyn TypeCodec>, Error> + Send + Sync>;

/// A single entry of the chain.
pub struct Resolver {
    priority: i32,
    predicate: Predicate,
    factory: Factory,
}

impl Resolver {
    /// A resolver calling `factory` for sites matching `predicate`.
    pub fn new<P, F>(priority: i32, predicate: P, factory: F) -> Self
    where
        P: Fn(&ElementContext<'_>) -> bool + Send + Sync + 'static,
        F: Fn(&ElementContext<'_>) -> Result<Arc<dyn TypeCodec>, Error> + Send + Sync + 'static,
    {
        Self {
            priority,
            predicate: Box::new(predicate),
            factory: Box::new(factory),
        }
    }

    /// A resolver matching exactly `T` and always producing `codec`.
    pub fn exact<T: Any>(priority: i32, codec: Arc<dyn TypeCodec>) -> Self {
        Self::new(priority, |ctx| ctx.is::<T>(), move |_| Ok(codec.clone()))
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn matches(&self, ctx: &ElementContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

/// Resolvers frozen in priority order.
pub struct ResolverChain {
    entries: Vec<Resolver>,
}

impl ResolverChain {
    pub(crate) fn new(mut entries: Vec<Resolver>) -> Self {
        // Stable, so equal priorities keep declaration order.
        entries.sort_by_key(|entry| Reverse(entry.priority));
        Self { entries }
    }

    /// The codec of the first matching resolver, or `None` if none match.
    pub fn resolve(&self, ctx: &ElementContext<'_>) -> Result<Option<Arc<dyn TypeCodec>>, Error> {
        match self.entries.iter().find(|entry| entry.matches(ctx)) {
            Some(entry) => (entry.factory)(ctx).map(Some),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn priorities(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(Resolver::priority)
    }
}

macro_rules! primitive {
    ($type:ty, $write:ident, $read:ident) => {
        Resolver::exact::<$type>(
            priority::PRIMITIVE,
            TypedCodec::new(|buf: &mut Buffer, v: &$type| buf.$write(*v), Buffer::$read).shared(),
        )
    };
}

/// The resolvers every [crate::Serializer] starts with.
pub(crate) fn builtin() -> Vec<Resolver> {
    vec![
        primitive!(i8, write_i8, read_i8),
        primitive!(u8, write_u8, read_u8),
        primitive!(i16, write_i16, read_i16),
        primitive!(i32, write_i32, read_i32),
        primitive!(i64, write_i64, read_i64),
        primitive!(f32, write_f32, read_f32),
        primitive!(f64, write_f64, read_f64),
        primitive!(bool, write_bool, read_bool),
        primitive!(char, write_char, read_char),
        Resolver::exact::<String>(
            priority::PRIMITIVE,
            TypedCodec::new(|buf, v: &String| buf.write_string(v), Buffer::read_string).shared(),
        ),
        Resolver::exact::<Uuid>(
            priority::LEAF,
            TypedCodec::new(Buffer::write_uuid, Buffer::read_uuid).shared(),
        ),
        Resolver::exact::<Bytes>(
            priority::LEAF,
            TypedCodec::new(|buf, v: &Bytes| buf.write_bytes(v), Buffer::read_bytes).shared(),
        ),
        Resolver::exact::<Vec<u8>>(
            priority::LEAF,
            TypedCodec::new(
                |buf, v: &Vec<u8>| buf.write_bytes(v),
                |buf| Ok(buf.read_bytes()?.to_vec()),
            )
            .shared(),
        ),
        Resolver::new(
            priority::ENUM,
            |ctx| matches!(ctx.kind(), Kind::Enum(_)),
            |ctx| match ctx.kind() {
                Kind::Enum(info) => Ok(Arc::new(EnumCodec::new(ctx.type_info(), *info)) as _),
                _ => Err(Error::NoCodecFound(ctx.type_name())),
            },
        ),
        Resolver::new(
            priority::MAP,
            |ctx| matches!(ctx.kind(), Kind::Map(_)),
            |ctx| match ctx.kind() {
                Kind::Map(info) => Ok(Arc::new(MapCodec::new(ctx.type_info(), *info)) as _),
                _ => Err(Error::NoCodecFound(ctx.type_name())),
            },
        ),
        Resolver::new(
            priority::STREAMABLE,
            |ctx| matches!(ctx.kind(), Kind::Sequence(_)),
            |ctx| match ctx.kind() {
                Kind::Sequence(info) => {
                    let element = ctx
                        .streamable_element()
                        .or(info.element)
                        .ok_or(Error::MissingElementType(ctx.type_name()))?;
                    Ok(Arc::new(StreamCodec::new(ctx.type_info(), *info, element)) as _)
                }
                _ => Err(Error::NoCodecFound(ctx.type_name())),
            },
        ),
    ]
}
