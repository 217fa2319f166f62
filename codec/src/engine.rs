//! The serializer: frozen resolver and transform tables plus a codec cache.

use crate::{
    codec::InnerOptionCodec,
    custom::CustomCodec,
    resolver::{self, Resolver, ResolverChain},
    transform::{Transform, TransformPipeline},
    walker::AggregateCodec,
    AnyValue, Buffer, Config, ElementContext, Error, Kind, Reflect, Site, TypeCodec, TypeInfo,
    Walker,
};
use bytes::Bytes;
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};
use tracing::{debug, trace};

static GLOBAL: LazyLock<Serializer> = LazyLock::new(|| Serializer::builder().build());

/// Encodes `value` with the default [Serializer].
pub fn encode<T: Reflect>(value: &T) -> Result<Bytes, Error> {
    Serializer::global().encode(value)
}

/// Decodes a `T` with the default [Serializer].
pub fn decode<T: Reflect>(bytes: impl Into<Bytes>) -> Result<T, Error> {
    Serializer::global().decode(bytes)
}

/// Memoized codecs keyed by the site they were resolved for.
#[derive(Default)]
struct CodecCache {
    codecs: RwLock<HashMap<Site, Arc<dyn TypeCodec>>>,
}

impl CodecCache {
    fn get(&self, site: &Site) -> Option<Arc<dyn TypeCodec>> {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs.get(site).cloned()
    }

    /// Inserts `codec` unless another caller got there first, returning the
    /// cached codec either way.
    fn insert(&self, site: Site, codec: Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> {
        let mut codecs = self.codecs.write().unwrap_or_else(PoisonError::into_inner);
        codecs.entry(site).or_insert(codec).clone()
    }

    fn len(&self) -> usize {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn clear(&self) {
        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Collects resolvers and transforms before freezing them into a [Serializer].
pub struct Builder {
    resolvers: Vec<Resolver>,
    transforms: Vec<Transform>,
    config: Config,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder holding the built-in resolvers and the nullable transform.
    pub fn new() -> Self {
        Self {
            resolvers: resolver::builtin(),
            transforms: vec![Transform::nullable()],
            config: Config::default(),
        }
    }

    /// Sets the limits and caching behavior of the built serializer.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Adds a resolver. Higher priorities are consulted first; among equal
    /// priorities, earlier registrations (and the built-ins) win.
    pub fn register_resolver<P, F>(mut self, priority: i32, predicate: P, factory: F) -> Self
    where
        P: Fn(&ElementContext<'_>) -> bool + Send + Sync + 'static,
        F: Fn(&ElementContext<'_>) -> Result<Arc<dyn TypeCodec>, Error> + Send + Sync + 'static,
    {
        self.resolvers
            .push(Resolver::new(priority, predicate, factory));
        self
    }

    /// Adds a transform, applied after every transform registered before it.
    pub fn register_transform<P, W>(mut self, predicate: P, wrap: W) -> Self
    where
        P: Fn(&ElementContext<'_>) -> bool + Send + Sync + 'static,
        W: Fn(Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> + Send + Sync + 'static,
    {
        self.transforms.push(Transform::new(predicate, wrap));
        self
    }

    /// Freezes the resolver and transform tables into a [Serializer].
    pub fn build(self) -> Serializer {
        let resolvers = ResolverChain::new(self.resolvers);
        let transforms = TransformPipeline::new(self.transforms);
        debug!(
            resolvers = resolvers.len(),
            transforms = transforms.len(),
            cache = self.config.cache_codecs,
            "built serializer"
        );
        Serializer {
            resolvers,
            transforms,
            cache: CodecCache::default(),
            config: self.config,
        }
    }
}

/// Encodes and decodes values by resolving a codec for every site.
///
/// A `Serializer` is immutable once built and may be shared across threads;
/// only its codec cache changes, and only by insertion.
pub struct Serializer {
    resolvers: ResolverChain,
    transforms: TransformPipeline,
    cache: CodecCache,
    config: Config,
}

impl Serializer {
    /// A [Builder] starting from the built-in resolvers and the nullable
    /// transform.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// The process-wide serializer with only the built-in resolvers.
    pub fn global() -> &'static Serializer {
        &GLOBAL
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A write-mode buffer.
    pub fn writer(&self) -> Buffer {
        Buffer::writer().with_config(self.config)
    }

    /// A read-mode buffer over `bytes`, limited by this serializer's config.
    pub fn reader(&self, bytes: impl Into<Bytes>) -> Buffer {
        Buffer::reader(bytes).with_config(self.config)
    }

    /// Resolves `ctx` through the resolver chain and the transform pipeline.
    ///
    /// Returns `None` if no resolver matches.
    pub fn resolve(&self, ctx: &ElementContext<'_>) -> Result<Option<Arc<dyn TypeCodec>>, Error> {
        Ok(self
            .resolvers
            .resolve(ctx)?
            .map(|codec| self.transforms.apply(ctx, codec)))
    }

    /// The codec for a site, from the cache or freshly resolved.
    pub(crate) fn codec_for(&self, ctx: &ElementContext<'_>) -> Result<Arc<dyn TypeCodec>, Error> {
        let site = ctx.site().filter(|_| self.config.cache_codecs);
        if let Some(codec) = site.as_ref().and_then(|site| self.cache.get(site)) {
            return Ok(codec);
        }
        let codec = self.resolve_codec(ctx)?;
        trace!(ty = ctx.type_name(), ?site, "resolved codec");
        Ok(match site {
            Some(site) => self.cache.insert(site, codec),
            None => codec,
        })
    }

    fn resolve_codec(&self, ctx: &ElementContext<'_>) -> Result<Arc<dyn TypeCodec>, Error> {
        let base: Arc<dyn TypeCodec> = match ctx.kind() {
            Kind::Custom(info) => Arc::new(CustomCodec::new(ctx.type_info(), *info)),
            kind => match self.resolvers.resolve(ctx)? {
                Some(codec) => codec,
                None => match kind {
                    Kind::Aggregate(aggregate) => {
                        Arc::new(AggregateCodec::new(ctx.type_info(), aggregate.clone()))
                    }
                    Kind::Nullable(_) => Arc::new(InnerOptionCodec::new(ctx.type_info())),
                    _ => return Err(Error::NoCodecFound(ctx.type_name())),
                },
            },
        };
        Ok(self.transforms.apply(ctx, base))
    }

    /// Number of memoized codecs.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drops every memoized codec.
    pub fn reset_cache(&self) {
        self.cache.clear();
        debug!("reset codec cache");
    }

    /// Encodes the value attached to `ctx`.
    pub fn encode_context(&self, ctx: &ElementContext<'_>) -> Result<Bytes, Error> {
        let mut buf = self.writer();
        Walker::new(self, &mut buf).encode(ctx)?;
        buf.finish()
    }

    /// Encodes `value` into a fresh buffer.
    pub fn encode<T: Reflect>(&self, value: &T) -> Result<Bytes, Error> {
        let mut buf = self.writer();
        self.encode_into(&mut buf, value)?;
        buf.finish()
    }

    /// Appends `value` to a write-mode buffer.
    pub fn encode_into<T: Reflect>(&self, buf: &mut Buffer, value: &T) -> Result<(), Error> {
        let ctx = ElementContext::for_value(value).at(Site::Root(TypeId::of::<T>()));
        Walker::new(self, buf).encode(&ctx)
    }

    /// Decodes a value of the described type from a read-mode buffer.
    pub fn decode_type(&self, buf: &mut Buffer, ty: TypeInfo) -> Result<AnyValue, Error> {
        let site = Site::Root(ty.id());
        let ctx = ElementContext::new(ty, &[]).at(site);
        Walker::new(self, buf).decode(&ctx)
    }

    /// Decodes a `T` from `bytes`, which must be consumed entirely.
    pub fn decode<T: Reflect>(&self, bytes: impl Into<Bytes>) -> Result<T, Error> {
        let mut buf = self.reader(bytes);
        let value = self.decode_from(&mut buf)?;
        buf.ensure_consumed()?;
        Ok(value)
    }

    /// Reads a `T` from a read-mode buffer, leaving any remaining bytes.
    pub fn decode_from<T: Reflect>(&self, buf: &mut Buffer) -> Result<T, Error> {
        crate::take(self.decode_type(buf, T::type_info())?)
    }
}
