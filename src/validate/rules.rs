//! Small rule functions for writing [`Validate::validate`](super::Validate::validate).

use std::fmt::Display;

use super::ValidationError;

/// `value` must lie within `min..=max`.
pub fn range<N>(field: &str, value: N, min: N, max: N) -> Result<(), ValidationError>
where
    N: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("{value} is outside the range {min}..={max}"),
        ));
    }
    Ok(())
}

/// An optional value must have been bound.
pub fn required<T>(field: &str, value: &Option<T>) -> Result<(), ValidationError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ValidationError::new(field, "a value is required")),
    }
}

/// Text must contain something other than whitespace.
pub fn not_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(())
}

/// Text length in characters must lie within `min..=max`.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("length {len} is outside the range {min}..={max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert!(range("Int", 1, 1, 10).is_ok());
        assert!(range("Int", 10, 1, 10).is_ok());
        assert!(range("Int", 0, 1, 10).is_err());
        assert!(range("Int", 11, 1, 10).is_err());
    }

    #[test]
    fn test_range_message() {
        let err = range("Int", 11, 1, 10).unwrap_err();
        assert_eq!(err.to_string(), "Int: 11 is outside the range 1..=10");
    }

    #[test]
    fn test_required_and_not_blank() {
        assert!(required("Name", &Some(1)).is_ok());
        assert!(required::<i32>("Name", &None).is_err());
        assert!(not_blank("Name", " x ").is_ok());
        assert!(not_blank("Name", "  ").is_err());
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(length("Name", "héllo", 5, 5).is_ok());
        assert!(length("Name", "", 1, 5).is_err());
    }
}
