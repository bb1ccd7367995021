//! The object binder: a serde `Deserializer` over one prefix of a [`FlatMap`].

use std::cell::RefCell;
use std::collections::HashSet;

use serde::de::value::{MapDeserializer, StrDeserializer};
use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, Visitor};
use tracing::trace;

use super::collection::{self, IndexedMap, ListAccess};
use super::leaf::{self, is_duration};
use super::zero::ZeroValue;
use crate::key::{self, Step};
use crate::mapping::{FlatMap, Target};
use crate::BindError;

/// State shared by every binder of one [`create_object`](super::create_object) call.
#[derive(Clone, Copy)]
pub(crate) struct Session<'m> {
    map: &'m FlatMap,
    built: &'m RefCell<HashSet<String>>,
}

impl<'m> Session<'m> {
    /// `built` collects the site of every value bound from keys, so that
    /// validation can pass over defaults and zero-filled slots.
    pub(crate) fn new(map: &'m FlatMap, built: &'m RefCell<HashSet<String>>) -> Self {
        Self { map, built }
    }

    pub(crate) fn lookup(&self, prefix: &str) -> Result<Target<'m>, BindError> {
        self.map.lookup(prefix)
    }
}

/// Binds whatever type asks for it from the keys at `prefix`.
///
/// A binder only exists for a prefix that resolved to something; callers
/// decide what absence means (skip a field, zero a slot, default the root).
///
/// `site` is where the value sits in the bound graph. It differs from
/// `prefix` only below lists, whose elements are numbered by position once
/// gaps are compacted.
pub(crate) struct Binder<'m> {
    session: Session<'m>,
    prefix: String,
    site: String,
    target: Target<'m>,
}

impl<'m> Binder<'m> {
    pub(crate) fn new(session: Session<'m>, prefix: String, site: String, target: Target<'m>) -> Self {
        session.built.borrow_mut().insert(site.clone());
        Self {
            session,
            prefix,
            site,
            target,
        }
    }

    fn leaf(&self, expected: &str) -> Result<&'m str, BindError> {
        match self.target {
            Target::Leaf(raw) => Ok(raw),
            Target::Nested(_) => Err(BindError::unsupported(
                &self.prefix,
                format!("{expected} cannot be bound from nested keys"),
            )),
            Target::Absent => Err(BindError::MissingRequired(self.prefix.clone())),
        }
    }

    fn convert<T>(&self, expected: &str) -> Result<T, BindError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.leaf(expected)?;
        leaf::parse_primitive(raw, expected).map_err(|reason| BindError::malformed(&self.prefix, reason))
    }

    /// Names of the distinct properties directly below the prefix.
    fn field_names(&self) -> Vec<&'m str> {
        let Target::Nested(steps) = &self.target else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        steps
            .iter()
            .filter_map(|step| match step {
                Step::Field(name) => Some(*name),
                Step::Index(_) => None,
            })
            .filter(|name| seen.insert(*name))
            .collect()
    }

    fn bind_object<'de, V: Visitor<'de>>(
        self,
        fields: Vec<&'m str>,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        trace!(prefix = %self.prefix, "binding object");
        let prefix = self.prefix.clone();
        visitor
            .visit_map(ObjectAccess {
                session: self.session,
                prefix: self.prefix,
                site: self.site,
                fields: fields.into_iter(),
                pending: None,
            })
            .map_err(|e| e.at(&prefix))
    }
}

/// Binds one collection slot, substituting the zero value when it is blank.
pub(crate) fn bind_slot<'de, S>(
    session: Session<'_>,
    path: String,
    site: String,
    seed: S,
) -> Result<S::Value, BindError>
where
    S: DeserializeSeed<'de>,
{
    let target = session.lookup(&path)?;
    if matches!(target, Target::Absent) {
        trace!(prefix = %path, "slot is blank, using zero value");
        return seed
            .deserialize(ZeroValue { key: &path })
            .map_err(|e| e.at(&path));
    }
    let key = path.clone();
    seed.deserialize(Binder::new(session, path, site, target))
        .map_err(|e| e.at(&key))
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty),)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
                let value: $ty = self.convert(stringify!($ty))?;
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Binder<'_> {
    type Error = BindError;

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    /// Leaves come through as text; indexed keys as a map keyed by index;
    /// dotted keys as a map keyed by property name.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let indexed = match &self.target {
            Target::Nested(steps) => steps.iter().all(|s| matches!(s, Step::Index(_))),
            _ => false,
        };
        match self.target {
            Target::Leaf(raw) => visitor
                .visit_str(raw)
                .map_err(|e: BindError| e.malformed_at(&self.prefix)),
            Target::Nested(_) if indexed => self.deserialize_map(visitor),
            Target::Nested(_) => {
                let fields = self.field_names();
                self.bind_object(fields, visitor)
            }
            Target::Absent => visitor.visit_unit(),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let raw = self.leaf("bool")?;
        let value = leaf::parse_bool(raw).map_err(|reason| BindError::malformed(&self.prefix, reason))?;
        visitor.visit_bool(value)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let raw = self.leaf("char")?;
        let value =
            leaf::parse_char(raw.trim()).map_err(|reason| BindError::malformed(&self.prefix, reason))?;
        visitor.visit_char(value)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let raw = self.leaf("text")?;
        visitor
            .visit_str(raw)
            .map_err(|e: BindError| e.malformed_at(&self.prefix))
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let raw = self.leaf("bytes")?;
        visitor
            .visit_bytes(raw.as_bytes())
            .map_err(|e: BindError| e.malformed_at(&self.prefix))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let keys = collection::distinct_indices(&self.prefix, &self.target, "list")?;
        let order = collection::list_order(&self.prefix, keys)?;
        trace!(prefix = %self.prefix, len = order.len(), "binding list");
        visitor.visit_seq(ListAccess::new(self.session, self.prefix, self.site, order))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(BindError::unsupported(
            &self.prefix,
            "unsupported collection type; bind a list or a string-keyed map",
        ))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let keys = collection::distinct_indices(&self.prefix, &self.target, "map")?;
        trace!(prefix = %self.prefix, len = keys.len(), "binding map");
        visitor.visit_map(IndexedMap::new(self.session, self.prefix, self.site, keys))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self.target {
            Target::Leaf(raw) if is_duration(name, fields) => {
                let duration =
                    leaf::parse_duration(raw).map_err(|reason| BindError::malformed(&self.prefix, reason))?;
                visitor.visit_map(MapDeserializer::new(
                    [
                        ("secs", duration.as_secs()),
                        ("nanos", u64::from(duration.subsec_nanos())),
                    ]
                    .into_iter(),
                ))
            }
            Target::Leaf(_) => Err(BindError::unsupported(
                &self.prefix,
                format!("'{name}' is not a convertible type"),
            )),
            _ => self.bind_object(fields.to_vec(), visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let raw = self.leaf(name)?;
        let member = raw.trim();
        if !variants.iter().any(|variant| *variant == member) {
            return Err(BindError::malformed(
                &self.prefix,
                format!("'{raw}' is not a member of {name} (expected one of {variants:?})"),
            ));
        }
        let variant: StrDeserializer<'_, BindError> = member.into_deserializer();
        visitor.visit_enum(variant).map_err(|e| e.at(&self.prefix))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}

/// Walks the properties of a structured type, yielding only those that have
/// something bound below them. The rest keep their defaults.
struct ObjectAccess<'m> {
    session: Session<'m>,
    prefix: String,
    site: String,
    fields: std::vec::IntoIter<&'m str>,
    pending: Option<Binder<'m>>,
}

impl<'de, 'm> MapAccess<'de> for ObjectAccess<'m> {
    type Error = BindError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, BindError>
    where
        K: DeserializeSeed<'de>,
    {
        for field in self.fields.by_ref() {
            let path = key::field_path(&self.prefix, field);
            let target = self.session.lookup(&path)?;
            if matches!(target, Target::Absent) {
                continue;
            }
            let site = key::field_path(&self.site, field);
            self.pending = Some(Binder::new(self.session, path, site, target));
            let name: StrDeserializer<'_, BindError> = field.into_deserializer();
            return seed.deserialize(name).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, BindError>
    where
        V: DeserializeSeed<'de>,
    {
        let binder = self
            .pending
            .take()
            .ok_or_else(|| <BindError as de::Error>::custom("property value requested before its name"))?;
        seed.deserialize(binder)
    }
}
