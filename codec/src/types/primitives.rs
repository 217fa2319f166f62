//! Primitives and `String`.
//!
//! All numbers are written big-endian at their natural width. `char` is a
//! single UTF-16 code unit, so characters outside the Basic Multilingual Plane
//! cannot be written. Strings are UTF-8 behind a signed 32-bit byte count.

use crate::{Reflect, TypeInfo};

macro_rules! impl_leaf {
    ($($type:ty),+) => {
        $(
            impl Reflect for $type {
                fn type_info() -> TypeInfo {
                    TypeInfo::leaf::<Self>()
                }
            }
        )+
    };
}

impl_leaf!(i8, u8, i16, i32, i64, f32, f64, bool, char, String);
