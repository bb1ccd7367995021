//! Flat key grammar.
//!
//! A key is `Segment ("." Segment)*` where each segment is
//! `Identifier ("[" Index "]")*`, e.g. `Root.List[2].Name`.

use crate::BindError;

/// The next step a key takes past a bind prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step<'k> {
    /// `prefix.Name...`: the property segment that follows the dot.
    Field(&'k str),
    /// `prefix[Index]...`: the raw collection key between the brackets.
    Index(&'k str),
}

/// Returns how `key` continues beyond `prefix`, or `None` when the key does not
/// lie under it. Keys that merely share leading text (`Intx` under `Int`) do not
/// match.
pub(crate) fn step_after<'k>(key: &'k str, prefix: &str) -> Result<Option<Step<'k>>, BindError> {
    let Some(rest) = key.strip_prefix(prefix) else {
        return Ok(None);
    };

    if let Some(rest) = rest.strip_prefix('.') {
        let end = rest.find(['.', '[']).unwrap_or(rest.len());
        return Ok(Some(Step::Field(&rest[..end])));
    }

    if let Some(rest) = rest.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => Ok(Some(Step::Index(&rest[..end]))),
            None => Err(BindError::MalformedKey(key.to_string())),
        };
    }

    Ok(None)
}

pub(crate) fn field_path(prefix: &str, name: &str) -> String {
    format!("{prefix}.{name}")
}

pub(crate) fn index_path(prefix: &str, index: &str) -> String {
    format!("{prefix}[{index}]")
}

/// The unqualified name of `T` without generic arguments, used as the default
/// root prefix (`my_app::settings::Server` becomes `Server`).
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_step() {
        assert_eq!(
            step_after("Root.List[2].Name", "Root").unwrap(),
            Some(Step::Field("List"))
        );
        assert_eq!(
            step_after("Root.Name", "Root").unwrap(),
            Some(Step::Field("Name"))
        );
    }

    #[test]
    fn test_index_step() {
        assert_eq!(
            step_after("Root.List[2].Name", "Root.List").unwrap(),
            Some(Step::Index("2"))
        );
        assert_eq!(
            step_after("Map[Hello World]", "Map").unwrap(),
            Some(Step::Index("Hello World"))
        );
    }

    #[test]
    fn test_shared_leading_text_is_not_a_child() {
        assert_eq!(step_after("Root.IntWithDefault", "Root.Int").unwrap(), None);
        assert_eq!(step_after("Root.Int", "Root.Int").unwrap(), None);
        assert_eq!(step_after("Other.Int", "Root").unwrap(), None);
    }

    #[test]
    fn test_unterminated_index() {
        let result = step_after("Root[1.Name", "Root");
        assert!(matches!(result, Err(BindError::MalformedKey(_))));
    }

    #[test]
    fn test_short_type_name() {
        struct Server;
        assert_eq!(short_type_name::<Server>(), "Server");
        assert_eq!(short_type_name::<Vec<i32>>(), "Vec");
        assert_eq!(short_type_name::<i32>(), "i32");
    }
}
