//! Decides per instance whether validation runs.

use std::any::{type_name, TypeId};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::warn;

use super::Validate;
use crate::BindError;

/// Control-flag declaration of a type, resolved once.
#[derive(Debug, Clone, Copy)]
enum ControlFlag {
    Absent,
    Field(&'static str),
    Ambiguous(&'static [&'static str]),
}

/// Type → control flag, populated on first use and kept for the process lifetime.
static CONTROL_FLAGS: Lazy<DashMap<TypeId, ControlFlag>> = Lazy::new(DashMap::new);

fn control_flag_of<T: Validate>() -> ControlFlag {
    *CONTROL_FLAGS
        .entry(TypeId::of::<T>())
        .or_insert_with(|| match T::control_flags() {
            [] => ControlFlag::Absent,
            [name] => ControlFlag::Field(*name),
            names => ControlFlag::Ambiguous(names),
        })
}

/// Returns whether `value` should be validated.
///
/// Types without a control flag always validate. Types with one validate when
/// the flag reads `true`. Types declaring several flags are an error.
pub fn validation_enabled<T: Validate>(value: &T) -> Result<bool, BindError> {
    match control_flag_of::<T>() {
        ControlFlag::Absent => Ok(true),
        ControlFlag::Field(name) => match value.control_flag(name) {
            Some(enabled) => Ok(enabled),
            None => {
                warn!(
                    type_name = type_name::<T>(),
                    flag = name,
                    "control flag declared but not readable, validating"
                );
                Ok(true)
            }
        },
        ControlFlag::Ambiguous(flags) => Err(BindError::AmbiguousControlFlag {
            type_name: type_name::<T>(),
            flags,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct HasFlag {
        is_enabled: bool,
    }

    impl Validate for HasFlag {
        fn control_flags() -> &'static [&'static str] {
            &["IsEnabled"]
        }

        fn control_flag(&self, name: &str) -> Option<bool> {
            (name == "IsEnabled").then_some(self.is_enabled)
        }
    }

    #[derive(Default)]
    struct NoFlag {
        #[allow(dead_code)]
        is_enabled: bool,
    }

    impl Validate for NoFlag {}

    struct TwoFlags;

    impl Validate for TwoFlags {
        fn control_flags() -> &'static [&'static str] {
            &["A", "B"]
        }
    }

    #[test]
    fn test_flag_value_decides() {
        let mut value = HasFlag::default();
        assert!(!validation_enabled(&value).unwrap());

        value.is_enabled = true;
        assert!(validation_enabled(&value).unwrap());
    }

    #[test]
    fn test_no_flag_always_validates() {
        let mut value = NoFlag::default();
        assert!(validation_enabled(&value).unwrap());

        value.is_enabled = true;
        assert!(validation_enabled(&value).unwrap());
    }

    #[test]
    fn test_several_flags_are_ambiguous() {
        let result = validation_enabled(&TwoFlags);
        assert!(matches!(
            result,
            Err(BindError::AmbiguousControlFlag { flags, .. }) if flags == ["A", "B"]
        ));
    }

    #[test]
    fn test_lookup_is_cached_per_type() {
        validation_enabled(&HasFlag::default()).unwrap();
        assert!(matches!(
            CONTROL_FLAGS.get(&TypeId::of::<HasFlag>()).map(|entry| *entry),
            Some(ControlFlag::Field("IsEnabled"))
        ));
    }
}
