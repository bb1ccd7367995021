//! Validation of bound objects.
//!
//! Every bound value implements [`Validate`]. Scalars and collections come
//! with implementations that do nothing beyond visiting their contents; your
//! own structs implement the trait to attach rules, to visit nested values,
//! and optionally to declare a boolean field that switches validation off.
//!
//! ```
//! use dotbind::validate::{self, Validate, ValidationError};
//! use dotbind::{BindError, FlatMap};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default, rename_all = "PascalCase")]
//! struct Pool {
//!     size: u32,
//!     checks_enabled: bool,
//! }
//!
//! impl Validate for Pool {
//!     fn control_flags() -> &'static [&'static str] {
//!         &["ChecksEnabled"]
//!     }
//!
//!     fn control_flag(&self, _name: &str) -> Option<bool> {
//!         Some(self.checks_enabled)
//!     }
//!
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         validate::range("Size", self.size, 1, 64)
//!     }
//! }
//!
//! let map = FlatMap::from([("Pool.Size", "0")]);
//! let pool: Pool = map.create_object()?;
//! assert_eq!(pool.size, 0);
//! # Ok::<(), BindError>(())
//! ```

mod gate;
mod rules;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::BuildHasher;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::key;
use crate::BindError;

pub use gate::validation_enabled;
pub use rules::{length, not_blank, range, required};

/// A rule violation reported by [`Validate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Rules and structure a bound type exposes to validation.
pub trait Validate: 'static {
    /// Names of the boolean fields marked as this type's validation switch.
    ///
    /// No names means validation always runs. One name means its value on
    /// each instance decides. More than one is rejected as ambiguous.
    fn control_flags() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }

    /// Current value of the control flag `name` on this instance.
    fn control_flag(&self, name: &str) -> Option<bool> {
        let _ = name;
        None
    }

    /// Checks this value's own rules. Nested values are checked separately,
    /// before their parent, through [`walk_nested`](Self::walk_nested).
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Hands nested values to `nested` so each is validated in turn.
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        let _ = nested;
        Ok(())
    }
}

/// Cursor handed to [`Validate::walk_nested`]; tracks the key path used in
/// error reports.
///
/// Values the binder never built from keys (properties left at their
/// defaults, zero-filled collection slots) are passed over.
#[derive(Debug)]
pub struct Nested<'p> {
    path: &'p str,
    built: Option<&'p HashSet<String>>,
}

impl Nested<'_> {
    /// Validates a property value at `{path}.{name}`.
    pub fn field<V: Validate>(&self, name: &str, value: &V) -> Result<(), BindError> {
        self.descend(&key::field_path(self.path, name), value)
    }

    /// Validates a collection element at `{path}[{index}]`. List elements are
    /// numbered by position.
    pub fn element<V: Validate>(&self, index: impl Display, value: &V) -> Result<(), BindError> {
        self.descend(&key::index_path(self.path, &index.to_string()), value)
    }

    /// Validates a wrapped value at the same path (`Option`, `Box`).
    pub fn inner<V: Validate>(&self, value: &V) -> Result<(), BindError> {
        check(value, self.path, self.built)
    }

    fn descend<V: Validate>(&self, path: &str, value: &V) -> Result<(), BindError> {
        match self.built {
            Some(built) if !built.contains(path) => Ok(()),
            _ => check(value, path, self.built),
        }
    }
}

/// Validates `value` bottom-up: nested values first, then `value` itself if
/// its gate is open. With `built`, nested values at paths outside the set
/// are skipped.
pub(crate) fn check<V: Validate>(
    value: &V,
    path: &str,
    built: Option<&HashSet<String>>,
) -> Result<(), BindError> {
    value.walk_nested(&Nested { path, built })?;

    if validation_enabled(value)? {
        value
            .validate()
            .map_err(|source| BindError::ValidationFailed {
                key: path.to_string(),
                source,
            })?;
    }

    Ok(())
}

macro_rules! leaf_validate {
    ($($ty:ty),* $(,)?) => {
        $(impl Validate for $ty {})*
    };
}

leaf_validate!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, PathBuf, Duration,
);

leaf_validate!(
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
);

impl<T: Validate> Validate for Option<T> {
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        match self {
            Some(value) => nested.inner(value),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Box<T> {
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        nested.inner(&**self)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, value)| nested.element(i, value))
    }
}

impl<T: Validate> Validate for VecDeque<T> {
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, value)| nested.element(i, value))
    }
}

impl<K, T, S> Validate for HashMap<K, T, S>
where
    K: Display + 'static,
    T: Validate,
    S: BuildHasher + 'static,
{
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        self.iter().try_for_each(|(k, value)| nested.element(k, value))
    }
}

impl<K: Display + 'static, T: Validate> Validate for BTreeMap<K, T> {
    fn walk_nested(&self, nested: &Nested<'_>) -> Result<(), BindError> {
        self.iter().try_for_each(|(k, value)| nested.element(k, value))
    }
}
