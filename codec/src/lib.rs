//! Serialize structured data by resolving a codec for every site.
//!
//! # Overview
//!
//! A binary serialization engine that:
//! - Writes primitives, strings, byte arrays, UUIDs, enums and collections to a
//!   compact big-endian format through a [Buffer]
//! - Walks aggregate types recursively, field by field, in declaration order
//! - Picks the codec for every site from a prioritized, user-extensible chain of
//!   [Resolver]s and wraps it with a pipeline of [Transform]s
//! - Rebuilds aggregates on decode through a matching constructor or
//!   field-by-field assignment
//!
//! Types take part by implementing [Reflect], usually with `#[derive(Reflect)]`.
//!
//! # Example
//!
//! ```
//! use packetwire_codec::{decode, encode, Reflect};
//!
//! #[derive(Debug, PartialEq, Reflect)]
//! enum Shape {
//!     Circle,
//!     Square,
//! }
//!
//! #[derive(Debug, PartialEq, Reflect)]
//! struct Drawing {
//!     name: String,
//!     shapes: Vec<Shape>,
//!     scale: Option<f64>,
//! }
//!
//! let drawing = Drawing {
//!     name: "sketch".into(),
//!     shapes: vec![Shape::Square, Shape::Circle],
//!     scale: None,
//! };
//! let bytes = encode(&drawing).unwrap();
//! assert_eq!(decode::<Drawing>(bytes).unwrap(), drawing);
//! ```
//!
//! # Extending
//!
//! A [Serializer] built with [Serializer::builder] accepts additional resolvers
//! and transforms. Built-in resolvers use the priorities in [priority]; a user
//! resolver registered above one of them takes precedence for the types it
//! matches.
//!
//! ```
//! use packetwire_codec::{priority, Serializer, TypedCodec};
//!
//! // Write every `i32` as an `i64`.
//! let serializer = Serializer::builder()
//!     .register_resolver(
//!         priority::PRIMITIVE + 1,
//!         |ctx| ctx.is::<i32>(),
//!         |_| {
//!             Ok(TypedCodec::new(
//!                 |buf, v: &i32| buf.write_i64(i64::from(*v)),
//!                 |buf| Ok(buf.read_i64()? as i32),
//!             )
//!             .shared())
//!         },
//!     )
//!     .build();
//! assert_eq!(serializer.encode(&1i32).unwrap().len(), 8);
//! ```

// Lets the derive refer to `::packetwire_codec` from inside this crate.
extern crate self as packetwire_codec;

pub mod aggregate;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod context;
pub mod custom;
pub mod engine;
pub mod error;
pub mod reflect;
pub mod resolver;
pub mod transform;
pub mod types;
pub mod walker;

pub use aggregate::{AggregateBuilder, AggregateInfo, Args, Constructor, FieldInfo, Param, Strategy};
pub use buffer::{Buffer, BufferMode};
pub use codec::{TypeCodec, TypedCodec};
pub use config::{Config, RangeCfg};
pub use context::{ElementContext, Marker, Site};
pub use custom::CustomSerializable;
pub use engine::{decode, encode, Builder, Serializer};
pub use error::Error;
pub use packetwire_macros::Reflect;
pub use reflect::{
    take, view, AnyValue, CustomInfo, EnumInfo, Kind, MapInfo, NullableInfo, PointerInfo, Reflect,
    SequenceInfo, TypeInfo, TypeInfoFn, WireEnum,
};
pub use resolver::{priority, Factory, Predicate, Resolver, ResolverChain};
pub use transform::{NullableCodec, Transform, TransformPipeline};
pub use walker::Walker;
