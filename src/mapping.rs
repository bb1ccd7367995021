//! The flat key-value mapping the binder reads from.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::bind::{self, BindOptions};
use crate::key::{self, Step};
use crate::{BindError, Validate};

/// An ordered list of `key = value` text pairs.
///
/// Keys are case-sensitive. Duplicate keys may be stored; they only become an
/// error when the binder resolves a target that matches more than one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMap {
    entries: Vec<(String, String)>,
}

impl FlatMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Existing pairs with the same key are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Merges `others` behind `self`: a key already present in the result is
    /// skipped, so the earliest mapping that defines a key wins.
    ///
    /// ```
    /// use dotbind::FlatMap;
    ///
    /// let primary = FlatMap::from([("A", "1")]);
    /// let fallback = FlatMap::from([("A", "2"), ("B", "2")]);
    ///
    /// let merged = primary.combine(&[&fallback]);
    /// assert_eq!(merged.get("A"), Some("1"));
    /// assert_eq!(merged.get("B"), Some("2"));
    /// ```
    pub fn combine(&self, others: &[&FlatMap]) -> FlatMap {
        let mut result = self.clone();
        let mut seen: HashSet<String> = self.keys().map(str::to_owned).collect();

        for other in others {
            for (key, value) in other.iter() {
                if seen.contains(key) {
                    continue;
                }
                seen.insert(key.to_owned());
                result.push(key, value);
            }
        }

        result
    }

    /// Binds an object of type `T` rooted at the type's own name, with
    /// validation enabled and absence tolerated.
    pub fn create_object<T>(&self) -> Result<T, BindError>
    where
        T: DeserializeOwned + Default + Validate,
    {
        bind::create_object(self, &BindOptions::default())
    }

    /// Binds an object of type `T` with explicit options.
    pub fn bind<T>(&self, options: &BindOptions) -> Result<T, BindError>
    where
        T: DeserializeOwned + Default + Validate,
    {
        bind::create_object(self, options)
    }

    /// Resolves what lies at `prefix`: a single value, a set of deeper keys,
    /// or nothing.
    pub(crate) fn lookup(&self, prefix: &str) -> Result<Target<'_>, BindError> {
        let mut exact = self.entries.iter().filter(|(k, _)| k == prefix);
        if let Some((_, value)) = exact.next() {
            if exact.next().is_some() {
                return Err(BindError::DuplicateKey(prefix.to_string()));
            }
            if value.trim().is_empty() {
                return Ok(Target::Absent);
            }
            return Ok(Target::Leaf(value));
        }

        let mut children = Vec::new();
        for (k, _) in &self.entries {
            if let Some(step) = key::step_after(k, prefix)? {
                children.push(step);
            }
        }

        if children.is_empty() {
            Ok(Target::Absent)
        } else {
            Ok(Target::Nested(children))
        }
    }
}

/// Free-function form of [`FlatMap::combine`].
pub fn combine(primary: &FlatMap, others: &[&FlatMap]) -> FlatMap {
    primary.combine(others)
}

/// What a bind prefix resolves to within a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target<'m> {
    /// No key, or a single blank value.
    Absent,
    /// Exactly one key equals the prefix.
    Leaf(&'m str),
    /// Keys continue past the prefix; one step per key, in mapping order.
    Nested(Vec<Step<'m>>),
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FlatMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FlatMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.push(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for FlatMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_first_wins() {
        let one = FlatMap::from([("A", "1")]);
        let two = FlatMap::from([("A", "2"), ("B", "2")]);
        let three = FlatMap::from([("A", "3"), ("B", "3"), ("C", "3")]);

        let result = one.combine(&[&two, &three]);

        assert_eq!(result.len(), 3);
        assert_eq!(result.get("A"), Some("1"));
        assert_eq!(result.get("B"), Some("2"));
        assert_eq!(result.get("C"), Some("3"));
    }

    #[test]
    fn test_combine_leaves_inputs_untouched() {
        let one = FlatMap::from([("A", "1")]);
        let two = FlatMap::from([("B", "2")]);

        let result = combine(&one, &[&two]);

        assert_eq!(result.len(), 2);
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 1);
    }

    #[test]
    fn test_lookup_leaf_and_blank() {
        let map = FlatMap::from([("A", "1"), ("B", "  ")]);
        assert_eq!(map.lookup("A").unwrap(), Target::Leaf("1"));
        assert_eq!(map.lookup("B").unwrap(), Target::Absent);
        assert_eq!(map.lookup("C").unwrap(), Target::Absent);
    }

    #[test]
    fn test_lookup_duplicate() {
        let mut map = FlatMap::new();
        map.push("A", "1");
        map.push("A", "2");
        assert!(matches!(map.lookup("A"), Err(BindError::DuplicateKey(k)) if k == "A"));
    }

    #[test]
    fn test_lookup_nested() {
        let map = FlatMap::from([("A.X", "1"), ("A[0]", "2"), ("AB", "3")]);
        assert_eq!(
            map.lookup("A").unwrap(),
            Target::Nested(vec![Step::Field("X"), Step::Index("0")])
        );
    }
}
