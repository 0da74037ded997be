//! `serde` support: maps serialize as a flat key/value map in iteration
//! order and deserialize by replaying `put` in document order.

use crate::hash_table::AccessHook;
use crate::map::BoundedMap;
use crate::options::MapOptions;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use serde::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl<K, V, S, H> Serialize for BoundedMap<K, V, S, H>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
    S: BuildHasher,
    H: AccessHook,
{
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Deserializes into a map built from the given options, so a bounded map
/// can be restored with its capacity and overflow strategy. Entries are
/// `put` in document order; a capacity error becomes a deserialization
/// error.
pub struct MapSeed<K, V, S, H> {
    options: MapOptions,
    hasher: S,
    _pd: PhantomData<(K, V, H)>,
}

impl<K, V, S, H> MapSeed<K, V, S, H> {
    pub fn new(options: MapOptions) -> Self
    where
        S: Default,
    {
        Self::with_hasher(options, S::default())
    }

    pub fn with_hasher(options: MapOptions, hasher: S) -> Self {
        Self {
            options,
            hasher,
            _pd: PhantomData,
        }
    }
}

struct MapVisitor<K, V, S, H> {
    map: BoundedMap<K, V, S, H>,
}

impl<'de, K, V, S, H> Visitor<'de> for MapVisitor<K, V, S, H>
where
    K: Eq + Hash + Deserialize<'de>,
    V: Deserialize<'de>,
    S: BuildHasher,
    H: AccessHook,
{
    type Value = BoundedMap<K, V, S, H>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut access: A) -> Result<Self::Value, A::Error> {
        while let Some((k, v)) = access.next_entry()? {
            self.map
                .put(k, v)
                .map_err(<A::Error as de::Error>::custom)?;
        }
        Ok(self.map)
    }
}

impl<'de, K, V, S, H> DeserializeSeed<'de> for MapSeed<K, V, S, H>
where
    K: Eq + Hash + Deserialize<'de>,
    V: Deserialize<'de>,
    S: BuildHasher,
    H: AccessHook,
{
    type Value = BoundedMap<K, V, S, H>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let map = BoundedMap::with_options_and_hasher(self.options, self.hasher)
            .map_err(<D::Error as de::Error>::custom)?;
        deserializer.deserialize_map(MapVisitor { map })
    }
}

/// Deserializes into an unbounded map with default options.
impl<'de, K, V, S, H> Deserialize<'de> for BoundedMap<K, V, S, H>
where
    K: Eq + Hash + Deserialize<'de>,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
    H: AccessHook,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        MapSeed::<K, V, S, H>::new(MapOptions::default()).deserialize(deserializer)
    }
}
