//! Transform pipeline: wrappers applied to resolved codecs.
//!
//! Transforms match on the [ElementContext] only, never on the codec they
//! wrap, so any transform composes with any resolver.

use crate::{resolver::Predicate, AnyValue, ElementContext, Error, TypeCodec, Walker};
use std::{any::Any, sync::Arc};

type Wrap = Box<dyn Fn(Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> + Send + Sync>;

/// A single transform entry.
pub struct Transform {
    predicate: Predicate,
    wrap: Wrap,
}

impl Transform {
    /// A transform wrapping every codec resolved for a site matching `predicate`.
    pub fn new<P, W>(predicate: P, wrap: W) -> Self
    where
        P: Fn(&ElementContext<'_>) -> bool + Send + Sync + 'static,
        W: Fn(Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            wrap: Box::new(wrap),
        }
    }

    /// The built-in transform for sites carrying the nullable marker.
    pub fn nullable() -> Self {
        Self::new(|ctx| ctx.is_nullable(), NullableCodec::wrap)
    }

    pub fn matches(&self, ctx: &ElementContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

/// Transforms in declaration order.
pub struct TransformPipeline {
    entries: Vec<Transform>,
}

impl TransformPipeline {
    pub(crate) fn new(entries: Vec<Transform>) -> Self {
        Self { entries }
    }

    /// Wraps `codec` with every matching transform; later transforms wrap
    /// the result of earlier ones.
    pub fn apply(&self, ctx: &ElementContext<'_>, codec: Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(ctx))
            .fold(codec, |codec, entry| (entry.wrap)(codec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Prefixes the wrapped codec with a presence flag.
pub struct NullableCodec {
    inner: Arc<dyn TypeCodec>,
}

impl NullableCodec {
    /// Wraps `inner` with a presence flag.
    pub fn wrap(inner: Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> {
        Arc::new(Self { inner })
    }
}

impl TypeCodec for NullableCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        walker.buffer().write_bool(value.is_some())?;
        match value {
            Some(value) => self.inner.encode(walker, Some(value)),
            None => Ok(()),
        }
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        if walker.buffer().read_bool()? {
            self.inner.decode(walker)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{take, Buffer, Serializer, TypedCodec};

    fn string_codec() -> Arc<dyn TypeCodec> {
        TypedCodec::new(
            |buf, v: &String| buf.write_string(v),
            Buffer::read_string,
        )
        .shared()
    }

    fn round_trip(codec: &Arc<dyn TypeCodec>, value: Option<&str>) -> Option<String> {
        let serializer = Serializer::builder().build();
        let owned = value.map(str::to_string);
        let mut buf = Buffer::writer();
        codec
            .encode(
                &mut Walker::new(&serializer, &mut buf),
                owned.as_ref().map(|v| v as &dyn Any),
            )
            .unwrap();
        let mut buf = Buffer::reader(buf.finish().unwrap());
        let decoded = codec
            .decode(&mut Walker::new(&serializer, &mut buf))
            .unwrap();
        buf.ensure_consumed().unwrap();
        decoded.map(|v| take::<String>(v).unwrap())
    }

    #[test]
    fn test_nullable_wrap() {
        let codec = NullableCodec::wrap(string_codec());
        assert_eq!(round_trip(&codec, Some("x")), Some("x".to_string()));
        assert_eq!(round_trip(&codec, None), None);
    }

    #[test]
    fn test_nullable_wrap_is_idempotent() {
        let once = NullableCodec::wrap(string_codec());
        let twice = NullableCodec::wrap(NullableCodec::wrap(string_codec()));
        for value in [Some("present"), Some(""), None] {
            assert_eq!(round_trip(&once, value), round_trip(&twice, value));
        }
    }

    #[test]
    fn test_unwrapped_codec_rejects_null() {
        let serializer = Serializer::builder().build();
        let mut buf = Buffer::writer();
        let mut walker = Walker::new(&serializer, &mut buf);
        let result = string_codec().encode(&mut walker, None);
        assert!(matches!(result, Err(Error::UnexpectedNull(_))));
    }

    #[test]
    fn test_pipeline_order() {
        // Each transform appends its tag after the wrapped codec's output.
        struct Tagged(Arc<dyn TypeCodec>, u8);
        impl TypeCodec for Tagged {
            fn encode(
                &self,
                walker: &mut Walker<'_>,
                value: Option<&dyn Any>,
            ) -> Result<(), Error> {
                self.0.encode(walker, value)?;
                walker.buffer().write_u8(self.1)
            }
            fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
                let value = self.0.decode(walker)?;
                walker.buffer().read_u8()?;
                Ok(value)
            }
        }

        let pipeline = TransformPipeline::new(vec![
            Transform::new(|_| true, |c| Arc::new(Tagged(c, 1)) as Arc<dyn TypeCodec>),
            Transform::new(|_| false, |c| Arc::new(Tagged(c, 2)) as Arc<dyn TypeCodec>),
            Transform::new(|_| true, |c| Arc::new(Tagged(c, 3)) as Arc<dyn TypeCodec>),
        ]);
        let ctx = ElementContext::of::<String>();
        let codec = pipeline.apply(&ctx, string_codec());

        let serializer = Serializer::builder().build();
        let value = "a".to_string();
        let mut buf = Buffer::writer();
        codec
            .encode(&mut Walker::new(&serializer, &mut buf), Some(&value))
            .unwrap();
        assert_eq!(
            buf.finish().unwrap(),
            &[0x00, 0x00, 0x00, 0x01, b'a', 1, 3][..]
        );
    }
}
