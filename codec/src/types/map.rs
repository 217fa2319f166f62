//! Maps, written as a signed 32-bit entry count followed by interleaved keys
//! and values.

use crate::{
    reflect::{take, view},
    AnyValue, Error, Kind, MapInfo, Reflect, TypeInfo,
};
use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

trait Entries: Sized + Any {
    type Key: Reflect;
    type Value: Reflect;

    fn pairs(&self) -> Vec<(&dyn Any, &dyn Any)>;

    fn from_pairs(pairs: Vec<(Self::Key, Self::Value)>) -> Self;
}

fn entries<M: Entries>(value: &dyn Any) -> Result<Vec<(&dyn Any, &dyn Any)>, Error> {
    Ok(view::<M>(value)?.pairs())
}

fn collect<M: Entries>(pairs: Vec<(AnyValue, AnyValue)>) -> Result<AnyValue, Error> {
    let pairs = pairs
        .into_iter()
        .map(|(key, value)| Ok((take::<M::Key>(key)?, take::<M::Value>(value)?)))
        .collect::<Result<Vec<_>, Error>>()?;
    let map: AnyValue = Box::new(M::from_pairs(pairs));
    Ok(map)
}

fn mapping<M: Entries>() -> TypeInfo {
    TypeInfo::new::<M>(Kind::Map(MapInfo {
        key: <M::Key as Reflect>::type_info,
        value: <M::Value as Reflect>::type_info,
        entries: entries::<M>,
        collect: collect::<M>,
    }))
}

fn lend<'a, K: Any, V: Any>(
    pairs: impl Iterator<Item = (&'a K, &'a V)>,
) -> Vec<(&'a dyn Any, &'a dyn Any)> {
    pairs
        .map(|(key, value)| (key as &dyn Any, value as &dyn Any))
        .collect()
}

impl<K: Reflect + Eq + Hash, V: Reflect> Entries for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn pairs(&self) -> Vec<(&dyn Any, &dyn Any)> {
        lend(self.iter())
    }

    fn from_pairs(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Reflect + Ord, V: Reflect> Entries for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn pairs(&self) -> Vec<(&dyn Any, &dyn Any)> {
        lend(self.iter())
    }

    fn from_pairs(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn type_info() -> TypeInfo {
        mapping::<Self>()
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        mapping::<Self>()
    }
}
