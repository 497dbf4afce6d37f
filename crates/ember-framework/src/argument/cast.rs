//! Built-in casts.
//!
//! Every built-in cast is a pure function from a raw value to a typed value.
//! A cast never fails: a value that does not fit the type yields
//! [`ArgValue::Null`] (or `NaN` for `number`).
//!
//! | Tag | Result |
//! |-----|--------|
//! | `string` | the raw text |
//! | `number` | any float, `NaN` when not numeric |
//! | `int` | an integer literal |
//! | `float` | a non-integer float literal |
//! | `whole`, `wholeNumber` | a number with a zero fractional part |
//! | `decimal` | a number with a non-zero fractional part |
//! | `url` | an absolute URL |
//! | `date` | RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or epoch milliseconds |
//! | `color` | six hex digits, optionally prefixed with `#` |
//! | `boolean` | `on/1/yes/true` or `off/0/no/false`, case-insensitive |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use url::Url;

use super::value::ArgValue;

/// The signature of a built-in cast.
pub type BuiltinCast = fn(&ArgValue) -> ArgValue;

/// Tags of every built-in cast.
pub const BUILTIN_TAGS: [&str; 12] = [
    "string",
    "number",
    "int",
    "float",
    "whole",
    "wholeNumber",
    "decimal",
    "url",
    "date",
    "color",
    "boolean",
    "bool",
];

/// Looks up a built-in cast by tag.
pub fn builtin(tag: &str) -> Option<BuiltinCast> {
    let cast: BuiltinCast = match tag {
        "string" => cast_string,
        "number" => cast_number,
        "int" => cast_int,
        "float" => cast_float,
        "whole" | "wholeNumber" => cast_whole,
        "decimal" => cast_decimal,
        "url" => cast_url,
        "date" => cast_date,
        "color" => cast_color,
        "boolean" | "bool" => cast_boolean,
        _ => return None,
    };
    Some(cast)
}

/// Casts `raw` with the built-in cast named `tag`.
///
/// Returns `None` when `tag` is not a built-in.
pub fn cast_builtin(tag: &str, raw: &ArgValue) -> Option<ArgValue> {
    builtin(tag).map(|cast| cast(raw))
}

// ============================================================================
// Helpers
// ============================================================================

/// A finite number, from a numeric value or numeric text.
fn numeric(raw: &ArgValue) -> Option<f64> {
    let n = match raw {
        ArgValue::Int(n) => *n as f64,
        ArgValue::Float(n) => *n,
        ArgValue::Str(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn fits_i64(n: f64) -> bool {
    n >= i64::MIN as f64 && n < i64::MAX as f64
}

// ============================================================================
// Casts
// ============================================================================

fn cast_string(raw: &ArgValue) -> ArgValue {
    raw.as_text()
        .map_or(ArgValue::Null, |text| ArgValue::Str(text.into_owned()))
}

fn cast_number(raw: &ArgValue) -> ArgValue {
    ArgValue::Float(numeric(raw).unwrap_or(f64::NAN))
}

fn cast_int(raw: &ArgValue) -> ArgValue {
    match raw {
        ArgValue::Int(n) => ArgValue::Int(*n),
        ArgValue::Str(s) => s.trim().parse::<i64>().map_or(ArgValue::Null, ArgValue::Int),
        _ => ArgValue::Null,
    }
}

fn cast_float(raw: &ArgValue) -> ArgValue {
    match raw {
        ArgValue::Float(n) if n.is_finite() => ArgValue::Float(*n),
        ArgValue::Str(s) if s.trim().parse::<i64>().is_err() => {
            numeric(raw).map_or(ArgValue::Null, ArgValue::Float)
        }
        _ => ArgValue::Null,
    }
}

fn cast_whole(raw: &ArgValue) -> ArgValue {
    if let ArgValue::Int(n) = raw {
        return ArgValue::Int(*n);
    }
    match numeric(raw) {
        Some(n) if n.fract() == 0.0 && fits_i64(n) => ArgValue::Int(n as i64),
        _ => ArgValue::Null,
    }
}

fn cast_decimal(raw: &ArgValue) -> ArgValue {
    match numeric(raw) {
        Some(n) if n.fract() != 0.0 => ArgValue::Float(n),
        _ => ArgValue::Null,
    }
}

fn cast_url(raw: &ArgValue) -> ArgValue {
    if let ArgValue::Url(url) = raw {
        return ArgValue::Url(url.clone());
    }
    raw.as_text()
        .and_then(|text| Url::parse(text.trim()).ok())
        .map_or(ArgValue::Null, ArgValue::Url)
}

fn cast_date(raw: &ArgValue) -> ArgValue {
    match raw {
        ArgValue::Date(date) => ArgValue::Date(*date),
        ArgValue::Int(ms) => Utc
            .timestamp_millis_opt(*ms)
            .single()
            .map_or(ArgValue::Null, ArgValue::Date),
        ArgValue::Str(s) => parse_date(s.trim()).map_or(ArgValue::Null, ArgValue::Date),
        _ => ArgValue::Null,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    let ms = text.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

fn cast_color(raw: &ArgValue) -> ArgValue {
    match raw {
        ArgValue::Color(c) => ArgValue::Color(*c),
        ArgValue::Int(n) => u32::try_from(*n)
            .ok()
            .filter(|c| *c <= 0xFF_FFFF)
            .map_or(ArgValue::Null, ArgValue::Color),
        ArgValue::Str(s) => {
            let hex = s.trim();
            let hex = hex.strip_prefix('#').unwrap_or(hex);
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return ArgValue::Null;
            }
            u32::from_str_radix(hex, 16).map_or(ArgValue::Null, ArgValue::Color)
        }
        _ => ArgValue::Null,
    }
}

fn cast_boolean(raw: &ArgValue) -> ArgValue {
    if let ArgValue::Bool(b) = raw {
        return ArgValue::Bool(*b);
    }
    let Some(text) = raw.as_text() else {
        return ArgValue::Null;
    };
    match text.trim().to_ascii_lowercase().as_str() {
        "on" | "1" | "yes" | "true" => ArgValue::Bool(true),
        "off" | "0" | "no" | "false" => ArgValue::Bool(false),
        _ => ArgValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast(raw: &str, tag: &str) -> ArgValue {
        cast_builtin(tag, &ArgValue::from(raw)).unwrap()
    }

    #[test]
    fn test_color() {
        assert_eq!(cast("#ffffff", "color"), ArgValue::Color(16_777_215));
        assert_eq!(cast("00ff00", "color"), ArgValue::Color(0x00ff00));
        assert_eq!(cast("#fff", "color"), ArgValue::Null);
        assert_eq!(cast("#gggggg", "color"), ArgValue::Null);
        assert_eq!(cast("+fffff", "color"), ArgValue::Null);
    }

    #[test]
    fn test_whole_and_decimal() {
        assert_eq!(cast("1.5", "whole"), ArgValue::Null);
        assert_eq!(cast("3", "whole"), ArgValue::Int(3));
        assert_eq!(cast("4.0", "wholeNumber"), ArgValue::Int(4));
        assert_eq!(cast("1.5", "decimal"), ArgValue::Float(1.5));
        assert_eq!(cast("2", "decimal"), ArgValue::Null);
        assert_eq!(cast("abc", "whole"), ArgValue::Null);
    }

    #[test]
    fn test_boolean() {
        assert_eq!(cast("on", "boolean"), ArgValue::Bool(true));
        assert_eq!(cast("off", "boolean"), ArgValue::Bool(false));
        assert_eq!(cast("YES", "boolean"), ArgValue::Bool(true));
        assert_eq!(cast("0", "boolean"), ArgValue::Bool(false));
        assert_eq!(cast("maybe", "boolean"), ArgValue::Null);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(cast("2", "int"), ArgValue::Int(2));
        assert_eq!(cast("2.5", "int"), ArgValue::Null);
        assert_eq!(cast("2.5", "float"), ArgValue::Float(2.5));
        assert_eq!(cast("2", "float"), ArgValue::Null);
        assert_eq!(cast("string", "float"), ArgValue::Null);
        assert_eq!(cast("7", "number"), ArgValue::Float(7.0));
        assert!(cast("seven", "number").as_f64().unwrap().is_nan());
        assert_eq!(cast_builtin("int", &ArgValue::Int(2)), Some(ArgValue::Int(2)));
    }

    #[test]
    fn test_url() {
        let url = cast("https://example.com/a?b=c", "url");
        assert_eq!(url.as_url().map(Url::as_str), Some("https://example.com/a?b=c"));
        assert_eq!(cast("example.com", "url"), ArgValue::Null);
        assert_eq!(cast("/relative/path", "url"), ArgValue::Null);
    }

    #[test]
    fn test_date() {
        let day = cast("2024-02-29", "date").as_date().unwrap();
        assert_eq!(day.to_rfc3339(), "2024-02-29T00:00:00+00:00");

        let stamped = cast("2024-01-01T12:30:00+02:00", "date").as_date().unwrap();
        assert_eq!(stamped.timestamp(), 1_704_105_000);

        let epoch = cast("0", "date").as_date().unwrap();
        assert_eq!(epoch.timestamp_millis(), 0);

        assert_eq!(cast("yesterday", "date"), ArgValue::Null);
    }

    #[test]
    fn test_string_and_unknown() {
        assert_eq!(cast("hello", "string"), ArgValue::from("hello"));
        assert_eq!(cast_builtin("string", &ArgValue::Int(2)), Some(ArgValue::from("2")));
        assert_eq!(cast_builtin("string", &ArgValue::Null), Some(ArgValue::Null));
        assert!(cast_builtin("user", &ArgValue::from("1")).is_none());
    }
}
