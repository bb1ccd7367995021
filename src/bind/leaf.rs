//! Conversion of single text values into scalar targets.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

const SECS_PER_DAY: u64 = 24 * 60 * 60;
const MAX_FRACTION_DIGITS: usize = 7;

/// Parses a primitive via `FromStr`, ignoring surrounding whitespace.
pub(crate) fn parse_primitive<T>(raw: &str, expected: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("'{raw}' is not a valid {expected}: {e}"))
}

/// Accepts `true`/`false` in any letter case.
pub(crate) fn parse_bool(raw: &str) -> Result<bool, String> {
    let text = raw.trim();
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{raw}' is not a valid bool"))
    }
}

pub(crate) fn parse_char(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("'{raw}' is not a single character")),
    }
}

/// True for the shape serde gives `std::time::Duration`.
pub(crate) fn is_duration(name: &str, fields: &[&str]) -> bool {
    name == "Duration" && fields == ["secs", "nanos"]
}

/// Parses a culture-invariant time span: either a bare day count (`3`) or
/// `[d.]hh:mm[:ss[.fffffff]]` (`1.02:30:00`, `00:01:00`, `00:00:01.5`).
///
/// Negative spans are rejected since `Duration` is unsigned.
pub(crate) fn parse_duration(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    let invalid = |detail: &str| format!("'{raw}' is not a valid duration: {detail}");

    if text.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }

    let Some(colon) = text.find(':') else {
        let days = parse_digits(text).ok_or_else(|| invalid("expected a day count"))?;
        let secs = days
            .checked_mul(SECS_PER_DAY)
            .ok_or_else(|| invalid("out of range"))?;
        return Ok(Duration::from_secs(secs));
    };

    let (days, clock) = match text[..colon].find('.') {
        Some(dot) => {
            let days = parse_digits(&text[..dot]).ok_or_else(|| invalid("bad day count"))?;
            (days, &text[dot + 1..])
        }
        None => (0, text),
    };

    let mut parts = clock.split(':');
    let hours = parse_bounded(parts.next(), 23).ok_or_else(|| invalid("bad hours"))?;
    let minutes = parse_bounded(parts.next(), 59).ok_or_else(|| invalid("bad minutes"))?;

    let (seconds, nanos) = match parts.next() {
        None => (0, 0),
        Some(part) => {
            let (secs, fraction) = match part.split_once('.') {
                Some((secs, fraction)) => (secs, Some(fraction)),
                None => (part, None),
            };
            let secs = parse_bounded(Some(secs), 59).ok_or_else(|| invalid("bad seconds"))?;
            let nanos = match fraction {
                Some(fraction) => {
                    parse_fraction(fraction).ok_or_else(|| invalid("bad fraction"))?
                }
                None => 0,
            };
            (secs, nanos)
        }
    };

    if parts.next().is_some() {
        return Err(invalid("too many ':' separators"));
    }

    let secs = days
        .checked_mul(SECS_PER_DAY)
        .and_then(|s| s.checked_add(hours * 3600 + minutes * 60 + seconds))
        .ok_or_else(|| invalid("out of range"))?;

    Ok(Duration::new(secs, nanos))
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_bounded(text: Option<&str>, max: u64) -> Option<u64> {
    parse_digits(text?).filter(|value| *value <= max)
}

/// Up to seven fractional digits (100ns ticks), scaled to nanoseconds.
fn parse_fraction(text: &str) -> Option<u32> {
    if text.len() > MAX_FRACTION_DIGITS {
        return None;
    }
    parse_digits(text)?;
    format!("{text:0<9}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive() {
        assert_eq!(parse_primitive::<i32>(" 42 ", "i32"), Ok(42));
        assert_eq!(parse_primitive::<f64>("1.5", "f64"), Ok(1.5));
        assert!(parse_primitive::<u8>("300", "u8").is_err());
        assert!(parse_primitive::<i32>("forty", "i32").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_parse_char() {
        assert_eq!(parse_char("x"), Ok('x'));
        assert!(parse_char("xy").is_err());
        assert!(parse_char("").is_err());
    }

    #[test]
    fn test_duration_clock() {
        assert_eq!(parse_duration("00:01:00"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("01:30"), Ok(Duration::from_secs(5400)));
        assert_eq!(
            parse_duration("1.02:00:05"),
            Ok(Duration::from_secs(SECS_PER_DAY + 7205))
        );
    }

    #[test]
    fn test_duration_fraction() {
        assert_eq!(
            parse_duration("00:00:01.5"),
            Ok(Duration::new(1, 500_000_000))
        );
        assert_eq!(
            parse_duration("00:00:00.0000001"),
            Ok(Duration::new(0, 100))
        );
        assert!(parse_duration("00:00:00.00000001").is_err());
    }

    #[test]
    fn test_duration_days_only() {
        assert_eq!(parse_duration("2"), Ok(Duration::from_secs(2 * SECS_PER_DAY)));
    }

    #[test]
    fn test_duration_rejects_malformed() {
        assert!(parse_duration("00:60:00").is_err());
        assert!(parse_duration("24:00:00").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
        assert!(parse_duration("-00:01:00").is_err());
        assert!(parse_duration("one minute").is_err());
    }
}
