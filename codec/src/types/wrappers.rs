//! `Option` and `Box`.
//!
//! Neither has a codec of its own. An [crate::ElementContext] strips both
//! layers off the declared type, and a stripped `Option` marks the site as
//! nullable, so the nullable transform writes the presence flag.
//!
//! Each `Option` layer writes its own presence flag, so `None`, `Some(None)`
//! and `Some(Some(x))` of an `Option<Option<T>>` stay distinct.

use crate::{
    reflect::{take, view},
    AnyValue, Error, Kind, NullableInfo, PointerInfo, Reflect, TypeInfo,
};
use std::any::Any;

fn project<T: Reflect>(value: &dyn Any) -> Result<Option<&dyn Any>, Error> {
    let inner = view::<Option<T>>(value)?
        .as_ref()
        .map(|inner| inner as &dyn Any);
    Ok(inner)
}

fn wrap<T: Reflect>(value: Option<AnyValue>) -> Result<AnyValue, Error> {
    let value: Option<T> = value.map(take::<T>).transpose()?;
    let value: AnyValue = Box::new(value);
    Ok(value)
}

fn deref<T: Reflect>(value: &dyn Any) -> Result<&dyn Any, Error> {
    let inner: &dyn Any = &**view::<Box<T>>(value)?;
    Ok(inner)
}

fn rebox<T: Reflect>(value: AnyValue) -> Result<AnyValue, Error> {
    let value: AnyValue = Box::new(Box::new(take::<T>(value)?));
    Ok(value)
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Nullable(NullableInfo {
            inner: T::type_info,
            project: project::<T>,
            wrap: wrap::<T>,
        }))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Pointer(PointerInfo {
            inner: T::type_info,
            deref: deref::<T>,
            wrap: rebox::<T>,
        }))
    }
}
