//! Key reference resolution for configuration values.
//!
//! Supports `${Section.Key}` syntax for reusing another key's value.
//! Use `$${...}` to escape and produce a literal `${...}`.

use super::ConfigError;
use crate::FlatMap;

/// Resolves all `${Some.Key}` references in the mapping's values.
///
/// Referenced values are expanded recursively against the original mapping,
/// so escapes are applied exactly once. Returns an error if a circular
/// reference is detected or a referenced key doesn't exist.
pub fn resolve_references(map: &mut FlatMap) -> Result<(), ConfigError> {
    let snapshot = map.clone();
    for value in map.values_mut() {
        if value.contains('$') {
            *value = expand(value, &snapshot, &mut Vec::new())?;
        }
    }
    Ok(())
}

/// Expands all `${...}` references in a string.
/// Handles `$$` escape sequences.
fn expand(s: &str, root: &FlatMap, stack: &mut Vec<String>) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            match chars.peek() {
                Some('$') => {
                    // $$ -> $
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let key = consume_until(&mut chars, '}').ok_or(ConfigError::UnclosedReference)?;
                    if stack.contains(&key) {
                        return Err(ConfigError::CircularReference);
                    }
                    let raw = lookup_key(root, &key)?;
                    stack.push(key);
                    result.push_str(&expand(raw, root, stack)?);
                    stack.pop();
                }
                _ => result.push('$'),
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}

fn lookup_key<'m>(root: &'m FlatMap, key: &str) -> Result<&'m str, ConfigError> {
    if key.trim().is_empty() {
        return Err(ConfigError::InvalidReferencePath(key.to_string()));
    }
    root.get(key)
        .ok_or_else(|| ConfigError::ReferenceNotFound(key.to_string()))
}
