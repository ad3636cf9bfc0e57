use super::HashTable;
use crate::config::capacity_from_size_hint;
use crate::key::KeyStrategy;
use crate::value::ValueKind;

use serde::de::{Deserialize, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserializer;

use std::fmt;
use std::marker::PhantomData;

pub struct HashTableVisitor<S: KeyStrategy, C: ValueKind> {
    marker: PhantomData<fn() -> HashTable<S, C>>,
}

impl<S: KeyStrategy, C: ValueKind> HashTableVisitor<S, C> {
    fn new() -> Self {
        HashTableVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, S, C> Visitor<'de> for HashTableVisitor<S, C>
where
    S: KeyStrategy,
    S::Key: Deserialize<'de>,
    C: ValueKind,
    C::Value: Deserialize<'de>,
{
    type Value = HashTable<S, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a HashTable")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let table = HashTable::with_capacity(capacity_from_size_hint(access.size_hint()));

        while let Some((key, value)) = access.next_entry()? {
            table.put(key, value);
        }

        Ok(table)
    }
}

impl<'de, S, C> Deserialize<'de> for HashTable<S, C>
where
    S: KeyStrategy,
    S::Key: Deserialize<'de>,
    C: ValueKind,
    C::Value: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(HashTableVisitor::<S, C>::new())
    }
}

impl<S, C> Serialize for HashTable<S, C>
where
    S: KeyStrategy,
    S::Key: Serialize,
    C: ValueKind,
    C::Value: Serialize,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.entry_iter() {
            map.serialize_entry(&key, C::borrow(&value))?;
        }
        map.end()
    }
}
