//! Recursive object walker.
//!
//! A [Walker] drives a single encode or decode call. For every site it asks
//! the [Serializer] for a codec (custom codec, resolver chain, or a
//! structural codec for aggregates) and hands itself to that codec, so that
//! codecs for containers and aggregates can recurse into their children.
//!
//! The walker owns the stack of aggregate types currently being walked. A type
//! appearing twice on that stack means the type graph is recursive, which is
//! rejected with [Error::CircularReference].

use crate::{
    aggregate::{AggregateInfo, Strategy},
    AnyValue, Buffer, ElementContext, Error, Serializer, Site, TypeCodec, TypeInfo,
};
use std::{
    any::{Any, TypeId},
    sync::Arc,
};
use tracing::trace;

/// State of one encode or decode call.
pub struct Walker<'a> {
    serializer: &'a Serializer,
    buf: &'a mut Buffer,
    visited: Vec<(TypeId, &'static str)>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(serializer: &'a Serializer, buf: &'a mut Buffer) -> Self {
        Self {
            serializer,
            buf,
            visited: Vec::new(),
        }
    }

    /// The buffer being written or read.
    pub fn buffer(&mut self) -> &mut Buffer {
        &mut *self.buf
    }

    /// The serializer resolving codecs for this call.
    pub fn serializer(&self) -> &'a Serializer {
        self.serializer
    }

    /// Names of the aggregate types currently being walked, outermost first.
    pub fn path(&self) -> Vec<&'static str> {
        self.visited.iter().map(|(_, name)| *name).collect()
    }

    /// Encodes the value attached to `ctx`.
    pub fn encode(&mut self, ctx: &ElementContext<'_>) -> Result<(), Error> {
        let value = ctx
            .value()
            .ok_or(Error::UnexpectedNull(ctx.declared_type().name()))?;
        self.encode_value(ctx, value)
    }

    fn encode_value(&mut self, ctx: &ElementContext<'_>, value: &dyn Any) -> Result<(), Error> {
        let codec = self.serializer.codec_for(ctx)?;
        let value = ctx.project(value)?;
        codec.encode(self, value)
    }

    /// Decodes a value of the type declared by `ctx`.
    pub fn decode(&mut self, ctx: &ElementContext<'_>) -> Result<AnyValue, Error> {
        let codec = self.serializer.codec_for(ctx)?;
        let value = codec.decode(self)?;
        ctx.rewrap(value)
    }

    fn enter(&mut self, ty: &TypeInfo) -> Result<(), Error> {
        if self.visited.iter().any(|(id, _)| *id == ty.id()) {
            return Err(Error::CircularReference(ty.name()));
        }
        trace!(ty = ty.name(), depth = self.visited.len(), "descending");
        self.visited.push((ty.id(), ty.name()));
        Ok(())
    }

    fn leave(&mut self) {
        self.visited.pop();
    }

    fn encode_fields(
        &mut self,
        ty: &TypeInfo,
        aggregate: &AggregateInfo,
        value: &dyn Any,
    ) -> Result<(), Error> {
        self.enter(ty)?;
        let result = self.write_fields(ty, aggregate, value);
        self.leave();
        result
    }

    fn write_fields(
        &mut self,
        ty: &TypeInfo,
        aggregate: &AggregateInfo,
        value: &dyn Any,
    ) -> Result<(), Error> {
        for (index, field) in aggregate.fields().iter().enumerate() {
            field
                .get(value)
                .and_then(|child| {
                    let ctx = ElementContext::new(field.type_info(), field.markers())
                        .with_value(child)
                        .at(Site::Field(ty.id(), index));
                    self.encode(&ctx)
                })
                .map_err(|err| err.in_field(ty.name(), field.name()))?;
        }
        Ok(())
    }

    fn construct(&mut self, ty: &TypeInfo, aggregate: &AggregateInfo) -> Result<AnyValue, Error> {
        self.enter(ty)?;
        let result = self.read_aggregate(ty, aggregate);
        self.leave();
        result
    }

    fn read_aggregate(
        &mut self,
        ty: &TypeInfo,
        aggregate: &AggregateInfo,
    ) -> Result<AnyValue, Error> {
        match aggregate.strategy() {
            Some(Strategy::Construct(index, constructor)) => {
                let mut args = Vec::with_capacity(constructor.params().len());
                for (position, param) in constructor.params().iter().enumerate() {
                    let ctx = ElementContext::new(param.type_info(), param.markers())
                        .at(Site::Param(ty.id(), index, position));
                    let arg = self
                        .decode(&ctx)
                        .map_err(|err| err.in_field(ty.name(), param.name()))?;
                    args.push(arg);
                }
                constructor.invoke(args)
            }
            Some(Strategy::Assign(instantiate)) => {
                let mut value = instantiate();
                for (index, field) in aggregate.fields().iter().enumerate() {
                    let ctx = ElementContext::new(field.type_info(), field.markers())
                        .at(Site::Field(ty.id(), index));
                    self.decode(&ctx)
                        .and_then(|decoded| field.set(value.as_mut(), decoded))
                        .map_err(|err| err.in_field(ty.name(), field.name()))?;
                }
                Ok(value)
            }
            None => Err(Error::NoConstructorAvailable(ty.name())),
        }
    }
}

/// Structural codec used for aggregates no resolver claims.
pub(crate) struct AggregateCodec {
    ty: TypeInfo,
    aggregate: Arc<AggregateInfo>,
}

impl AggregateCodec {
    pub(crate) fn new(ty: &TypeInfo, aggregate: Arc<AggregateInfo>) -> Self {
        Self {
            ty: ty.clone(),
            aggregate,
        }
    }
}

impl TypeCodec for AggregateCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.ty.name()))?;
        walker.encode_fields(&self.ty, &self.aggregate, value)
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        walker.construct(&self.ty, &self.aggregate).map(Some)
    }
}
