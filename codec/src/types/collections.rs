//! Sequences and sets.
//!
//! Every collection here is streamable: it is written as a signed 64-bit
//! element count followed by each element, in iteration order, encoded
//! through the walker like any other site.

use crate::{
    reflect::{take, view},
    AnyValue, Error, Kind, Reflect, SequenceInfo, TypeInfo,
};
use std::{
    any::Any,
    collections::{BTreeSet, HashSet, VecDeque},
    hash::Hash,
};

/// A collection that can lend out and be rebuilt from its elements.
trait Elements: Sized + Any {
    type Item: Reflect;

    fn refs(&self) -> Vec<&dyn Any>;

    fn from_items(items: Vec<Self::Item>) -> Result<Self, Error>;
}

fn elements<C: Elements>(value: &dyn Any) -> Result<Vec<&dyn Any>, Error> {
    Ok(view::<C>(value)?.refs())
}

fn collect<C: Elements>(items: Vec<AnyValue>) -> Result<AnyValue, Error> {
    let items = items
        .into_iter()
        .map(take::<C::Item>)
        .collect::<Result<Vec<_>, _>>()?;
    let collection: AnyValue = Box::new(C::from_items(items)?);
    Ok(collection)
}

fn sequence<C: Elements>() -> TypeInfo {
    TypeInfo::new::<C>(Kind::Sequence(SequenceInfo {
        element: Some(<C::Item as Reflect>::type_info),
        elements: elements::<C>,
        collect: collect::<C>,
    }))
}

fn lend<'a, T: Any>(items: impl Iterator<Item = &'a T>) -> Vec<&'a dyn Any> {
    items.map(|item| item as &dyn Any).collect()
}

impl<T: Reflect> Elements for Vec<T> {
    type Item = T;

    fn refs(&self) -> Vec<&dyn Any> {
        lend(self.iter())
    }

    fn from_items(items: Vec<T>) -> Result<Self, Error> {
        Ok(items)
    }
}

impl<T: Reflect> Elements for VecDeque<T> {
    type Item = T;

    fn refs(&self) -> Vec<&dyn Any> {
        lend(self.iter())
    }

    fn from_items(items: Vec<T>) -> Result<Self, Error> {
        Ok(items.into())
    }
}

impl<T: Reflect + Eq + Hash> Elements for HashSet<T> {
    type Item = T;

    fn refs(&self) -> Vec<&dyn Any> {
        lend(self.iter())
    }

    fn from_items(items: Vec<T>) -> Result<Self, Error> {
        Ok(items.into_iter().collect())
    }
}

impl<T: Reflect + Ord> Elements for BTreeSet<T> {
    type Item = T;

    fn refs(&self) -> Vec<&dyn Any> {
        lend(self.iter())
    }

    fn from_items(items: Vec<T>) -> Result<Self, Error> {
        Ok(items.into_iter().collect())
    }
}

impl<T: Reflect, const N: usize> Elements for [T; N] {
    type Item = T;

    fn refs(&self) -> Vec<&dyn Any> {
        lend(self.iter())
    }

    fn from_items(items: Vec<T>) -> Result<Self, Error> {
        Self::try_from(items).map_err(|items: Vec<T>| Error::LengthMismatch {
            expected: N,
            actual: items.len(),
        })
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self>()
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self>()
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self>()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self>()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_info() -> TypeInfo {
        sequence::<Self>()
    }
}
