//! Binding typed objects from a [`FlatMap`].
//!
//! Keys name a path through the target type: `Server.Port` binds the `Port`
//! property of the `Server` root, `Server.Hosts[0]` the first element of a
//! list, `Server.Limits[Upload]` the `Upload` entry of a string-keyed map.
//!
//! Structs are bound through their serde `Deserialize` implementation and
//! should carry `#[serde(default)]` so that properties without keys keep their
//! `Default` values.

mod collection;
mod de;
mod error;
mod leaf;
mod zero;

use std::cell::RefCell;
use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::debug;

pub use error::BindError;

use crate::key;
use crate::mapping::{FlatMap, Target};
use crate::validate::{self, Validate};

/// How [`create_object`] binds its root.
#[derive(Debug, Clone)]
#[must_use]
pub struct BindOptions {
    prefix: Option<String>,
    required: bool,
    validate: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            required: false,
            validate: true,
        }
    }
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root key prefix. Defaults to the target type's own name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Fail with [`BindError::MissingRequired`] when nothing is bound at the
    /// root, instead of returning `T::default()`.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Run [`Validate`] rules on the bound object graph.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn root_prefix<T>(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.trim().is_empty() => prefix.to_string(),
            _ => key::short_type_name::<T>().to_string(),
        }
    }
}

/// Binds a `T` from the keys of `map` under the configured root prefix.
///
/// When nothing is bound at the root, a required bind fails and an optional
/// one returns `T::default()` without validating it. Otherwise every value
/// bound from keys is validated bottom-up (unless disabled); defaults and
/// zero-filled slots are not.
///
/// ```
/// use dotbind::{create_object, BindOptions, FlatMap};
/// use std::collections::HashMap;
///
/// let map = FlatMap::from([("A[1]", "1"), ("A[2]", "2"), ("A[4]", "4")]);
/// let list: Vec<i32> = create_object(&map, &BindOptions::new().prefix("A"))?;
/// assert_eq!(list, [1, 2, 4]);
///
/// let map = FlatMap::from([("A[A]", "1"), ("A[BB]", "22")]);
/// let dict: HashMap<String, i32> = create_object(&map, &BindOptions::new().prefix("A"))?;
/// assert_eq!(dict["BB"], 22);
/// # Ok::<(), dotbind::BindError>(())
/// ```
pub fn create_object<T>(map: &FlatMap, options: &BindOptions) -> Result<T, BindError>
where
    T: DeserializeOwned + Default + Validate,
{
    let prefix = options.root_prefix::<T>();
    let target = map.lookup(&prefix)?;

    if matches!(target, Target::Absent) {
        if options.required {
            return Err(BindError::MissingRequired(prefix));
        }
        debug!(prefix = %prefix, "nothing bound at root, using default");
        return Ok(T::default());
    }

    let built = RefCell::new(HashSet::new());
    let session = de::Session::new(map, &built);
    let value = T::deserialize(de::Binder::new(session, prefix.clone(), prefix.clone(), target))?;

    if options.validate {
        validate::check(&value, &prefix, Some(&built.into_inner()))?;
    }

    Ok(value)
}
