//! Lists and string-keyed maps built from bracketed keys.
//!
//! `List[4]`, `List[1]`, `List[2]` bind to a three element list ordered by
//! index; gaps are compacted rather than filled. `Map[Hello]` and `Map[World]`
//! bind to a map keyed by the verbatim bracket text, in discovery order.

use std::collections::HashSet;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use super::de::{bind_slot, Session};
use crate::key::{self, Step};
use crate::mapping::Target;
use crate::BindError;

/// Distinct collection keys below `prefix`, in the order they were first seen.
///
/// Every key under the prefix must be indexed; a list or map bound from a
/// single value or from dotted properties is rejected.
pub(crate) fn distinct_indices<'m>(
    prefix: &str,
    target: &Target<'m>,
    shape: &str,
) -> Result<Vec<&'m str>, BindError> {
    let steps = match target {
        Target::Nested(steps) => steps,
        Target::Leaf(_) => {
            return Err(BindError::unsupported(
                prefix,
                format!("a {shape} cannot be bound from a single value"),
            ))
        }
        Target::Absent => return Ok(Vec::new()),
    };

    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for step in steps {
        match *step {
            Step::Index(index) => {
                if seen.insert(index) {
                    keys.push(index);
                }
            }
            Step::Field(name) => {
                return Err(BindError::unsupported(
                    prefix,
                    format!("a {shape} needs indexed keys like '{prefix}[0]', found '.{name}'"),
                ))
            }
        }
    }
    Ok(keys)
}

/// Sorts list indices by numeric value. Equal values keep discovery order.
pub(crate) fn list_order<'m>(prefix: &str, keys: Vec<&'m str>) -> Result<Vec<&'m str>, BindError> {
    let mut numbered = keys
        .into_iter()
        .map(|index| match index.trim().parse::<u64>() {
            Ok(n) => Ok((n, index)),
            Err(_) => Err(BindError::malformed(
                &key::index_path(prefix, index),
                format!("list index '{index}' is not a non-negative integer"),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, index)| index).collect())
}

pub(crate) struct ListAccess<'m> {
    session: Session<'m>,
    prefix: String,
    site: String,
    indices: std::iter::Enumerate<std::vec::IntoIter<&'m str>>,
}

impl<'m> ListAccess<'m> {
    pub(crate) fn new(session: Session<'m>, prefix: String, site: String, indices: Vec<&'m str>) -> Self {
        Self {
            session,
            prefix,
            site,
            indices: indices.into_iter().enumerate(),
        }
    }
}

impl<'de> SeqAccess<'de> for ListAccess<'_> {
    type Error = BindError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, BindError>
    where
        T: DeserializeSeed<'de>,
    {
        let Some((position, index)) = self.indices.next() else {
            return Ok(None);
        };
        let site = key::index_path(&self.site, &position.to_string());
        bind_slot(self.session, key::index_path(&self.prefix, index), site, seed).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.indices.len())
    }
}

pub(crate) struct IndexedMap<'m> {
    session: Session<'m>,
    prefix: String,
    site: String,
    keys: std::vec::IntoIter<&'m str>,
    pending: Option<&'m str>,
}

impl<'m> IndexedMap<'m> {
    pub(crate) fn new(session: Session<'m>, prefix: String, site: String, keys: Vec<&'m str>) -> Self {
        Self {
            session,
            prefix,
            site,
            keys: keys.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for IndexedMap<'_> {
    type Error = BindError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, BindError>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(key) = self.keys.next() else {
            return Ok(None);
        };
        self.pending = Some(key);
        seed.deserialize(MapKey {
            key,
            prefix: &self.prefix,
        })
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, BindError>
    where
        V: DeserializeSeed<'de>,
    {
        let key = self
            .pending
            .take()
            .ok_or_else(|| <BindError as de::Error>::custom("map value requested before its key"))?;
        bind_slot(
            self.session,
            key::index_path(&self.prefix, key),
            key::index_path(&self.site, key),
            seed,
        )
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keys.len())
    }
}

/// Hands a collection key to the map's key type, which must be text.
struct MapKey<'a> {
    key: &'a str,
    prefix: &'a str,
}

impl MapKey<'_> {
    fn not_text(&self) -> BindError {
        BindError::unsupported(self.prefix, "map keys must be text (use a string-keyed map)")
    }
}

macro_rules! reject_key {
    ($($method:ident,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, BindError> {
                Err(self.not_text())
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for MapKey<'_> {
    type Error = BindError;

    reject_key! {
        deserialize_bool,
        deserialize_i8,
        deserialize_i16,
        deserialize_i32,
        deserialize_i64,
        deserialize_i128,
        deserialize_u8,
        deserialize_u16,
        deserialize_u32,
        deserialize_u64,
        deserialize_u128,
        deserialize_f32,
        deserialize_f64,
        deserialize_char,
        deserialize_bytes,
        deserialize_byte_buf,
        deserialize_option,
        deserialize_unit,
        deserialize_seq,
        deserialize_map,
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.key)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.key)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.key)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.key)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(self.not_text())
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(self.not_text())
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(self.not_text())
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(self.not_text())
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(self.not_text())
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}
