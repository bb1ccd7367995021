//! Zero values for collection slots whose value is blank.

use serde::de::value::{MapDeserializer, StrDeserializer};
use serde::de::{self, DeserializeSeed, Expected, IntoDeserializer, MapAccess, SeqAccess, Visitor};

use super::leaf::is_duration;
use crate::BindError;

/// Zero literals for text-parsed types that reject `""`, keyed by what their
/// visitor expects. These are chrono's date and time types; each literal is
/// that type's `Default` (the Unix epoch, or midnight).
const ZERO_LITERALS: &[(&str, &str)] = &[
    ("RFC 3339", "1970-01-01T00:00:00+00:00"),
    ("date and time", "1970-01-01T00:00:00"),
    ("date string", "1970-01-01"),
    ("time string", "00:00:00"),
];

fn zero_text(expected: &dyn Expected) -> &'static str {
    let expected = expected.to_string();
    ZERO_LITERALS
        .iter()
        .find(|(marker, _)| expected.contains(*marker))
        .map_or("", |&(_, literal)| literal)
}

/// A deserializer that produces the zero value of whatever type asks for it:
/// `0`, `false`, `""`, `None`, empty collections, the first unit variant of an
/// enum, a zero `Duration`, or an empty struct (which a `#[serde(default)]`
/// struct fills from `Default`).
pub(crate) struct ZeroValue<'p> {
    pub(crate) key: &'p str,
}

macro_rules! zero_primitive {
    ($($method:ident => $visit:ident($zero:expr),)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
                visitor.$visit($zero)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ZeroValue<'_> {
    type Error = BindError;

    zero_primitive! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i8(0),
        deserialize_i16 => visit_i16(0),
        deserialize_i32 => visit_i32(0),
        deserialize_i64 => visit_i64(0),
        deserialize_i128 => visit_i128(0),
        deserialize_u8 => visit_u8(0),
        deserialize_u16 => visit_u16(0),
        deserialize_u32 => visit_u32(0),
        deserialize_u64 => visit_u64(0),
        deserialize_u128 => visit_u128(0),
        deserialize_f32 => visit_f32(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_bytes => visit_bytes(&[]),
        deserialize_byte_buf => visit_bytes(&[]),
        deserialize_identifier => visit_str(""),
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let zero = zero_text(&visitor);
        visitor.visit_str(zero).map_err(|e: BindError| e.malformed_at(self.key))
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_none()
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
        visitor.visit_seq(ZeroSeq {
            key: self.key,
            remaining: 0,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_seq(ZeroSeq {
            key: self.key,
            remaining: len,
        })
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
        visitor.visit_map(EmptyMap)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        if is_duration(name, fields) {
            return visitor.visit_map(MapDeserializer::new(
                [("secs", 0u64), ("nanos", 0u64)].into_iter(),
            ));
        }
        visitor.visit_map(EmptyMap).map_err(|e| e.at(self.key))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let Some(first) = variants.first() else {
            return Err(BindError::unsupported(
                self.key,
                format!("enum '{name}' has no variants to default to"),
            ));
        };
        let variant: StrDeserializer<'_, BindError> = (*first).into_deserializer();
        visitor.visit_enum(variant).map_err(|e| e.at(self.key))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}

struct ZeroSeq<'p> {
    key: &'p str,
    remaining: usize,
}

impl<'de> SeqAccess<'de> for ZeroSeq<'_> {
    type Error = BindError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, BindError>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(ZeroValue { key: self.key }).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct EmptyMap;

impl<'de> MapAccess<'de> for EmptyMap {
    type Error = BindError;

    fn next_key_seed<K>(&mut self, _seed: K) -> Result<Option<K::Value>, BindError>
    where
        K: DeserializeSeed<'de>,
    {
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, _seed: V) -> Result<V::Value, BindError>
    where
        V: DeserializeSeed<'de>,
    {
        Err(de::Error::custom("value requested from an empty map"))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Point {
        x: i32,
        label: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[allow(dead_code)]
    enum Mode {
        Fast,
        Slow,
    }

    fn zero<T: for<'de> Deserialize<'de>>() -> T {
        T::deserialize(ZeroValue { key: "Slot" }).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(zero::<i64>(), 0);
        assert!(!zero::<bool>());
        assert_eq!(zero::<String>(), "");
        assert_eq!(zero::<Option<u8>>(), None);
        assert_eq!(zero::<Duration>(), Duration::ZERO);
    }

    #[test]
    fn test_compound() {
        assert_eq!(zero::<Vec<i32>>(), Vec::<i32>::new());
        assert!(zero::<HashMap<String, i32>>().is_empty());
        assert_eq!(zero::<Point>(), Point::default());
        assert_eq!(zero::<(u8, bool)>(), (0, false));
        assert_eq!(zero::<Mode>(), Mode::Fast);
    }

    #[test]
    fn test_text_stays_empty() {
        assert_eq!(zero::<String>(), "");
        assert_eq!(zero::<PathBuf>(), PathBuf::new());
    }

    #[test]
    fn test_date_times_take_their_default() {
        assert_eq!(zero::<NaiveDateTime>(), NaiveDateTime::default());
        assert_eq!(zero::<NaiveDate>(), NaiveDate::default());
        assert_eq!(zero::<NaiveTime>(), NaiveTime::default());
        assert_eq!(zero::<DateTime<Utc>>(), DateTime::<Utc>::default());
        assert_eq!(zero::<DateTime<FixedOffset>>().timestamp(), 0);
    }
}
