//! [crate::Reflect] implementations for common types.
//!
//! Leaf types (primitives, `String`, [bytes::Bytes], [uuid::Uuid]) carry no
//! structure and are encoded by the built-in resolvers. Collections describe
//! how to iterate and rebuild themselves, and `Option`/`Box` describe how to
//! unwrap themselves so that resolvers only ever see the inner type.

pub mod bytes;
pub mod collections;
pub mod map;
pub mod primitives;
pub mod uuid;
pub mod wrappers;
