//! Type validator registry.
//!
//! Maps a raw text value and the arguments of its column declaration to a
//! [`Verdict`]. Validators check syntactic shape only; numeric ranges are not
//! interpreted, with the exception of calendar validity for `date` and
//! `datetime`.
//!
//! | kind | rule |
//! |---|---|
//! | integer | optional `-`, ASCII digits only |
//! | float | optional `-`, digits with at most one decimal point |
//! | decimal(p, s) | at most `max(p - s, 1)` integer digits, at most `s` fractional digits |
//! | date | `YYYY-MM-DD` and a real calendar date |
//! | datetime | `YYYY-MM-DD HH:MM:SS`, real date, hour < 24, minute and second < 60 |
//! | time | `HH:MM:SS` shape only |
//! | year | four digits |
//! | char(n) | at most `n` characters |
//! | text, unrecognized | always valid |
//! | timestamp | [`Verdict::Unimplemented`] |
//!
//! # Example
//! ```rust
//! use sqlguard_core::validation::{Verdict, validate};
//! use sqlguard_core::models::ColumnKind;
//!
//! let args = vec!["5".to_string(), "2".to_string()];
//! assert_eq!(validate(&ColumnKind::Decimal, "123.45", &args), Verdict::Valid);
//! assert_eq!(validate(&ColumnKind::Decimal, "123.456", &args), Verdict::Invalid);
//! ```

use crate::models::ColumnKind;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Default display length MySQL assumes for `char` without arguments.
const DEFAULT_CHAR_LENGTH: usize = 1;

/// Default `(precision, scale)` MySQL assumes for `decimal` without arguments.
const DEFAULT_DECIMAL_PRECISION: (usize, usize) = (10, 0);

/// Outcome of validating one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The value matches its column type
    Valid,
    /// The value does not match its column type
    Invalid,
    /// No rule has been decided for the column type
    Unimplemented,
}

impl Verdict {
    /// Boolean view where only [`Verdict::Valid`] passes.
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }
}

/// Pre-compiled value patterns.
struct TypePatterns {
    integer: Regex,
    float: Regex,
    decimal: Regex,
    date: Regex,
    datetime: Regex,
    time: Regex,
    year: Regex,
}

impl TypePatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<TypePatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    #[allow(clippy::expect_used)]
    fn compile() -> Self {
        Self {
            integer: Regex::new(r"^-?[0-9]+$").expect("Invalid integer pattern"),
            float: Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$")
                .expect("Invalid float pattern"),
            decimal: Regex::new(r"^-?(?P<int>[0-9]+)(?:\.(?P<frac>[0-9]+))?$")
                .expect("Invalid decimal pattern"),
            date: Regex::new(r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{2})-(?P<d>[0-9]{2})$")
                .expect("Invalid date pattern"),
            datetime: Regex::new(
                r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{2})-(?P<d>[0-9]{2}) (?P<hh>[0-9]{2}):(?P<mm>[0-9]{2}):(?P<ss>[0-9]{2})$",
            )
            .expect("Invalid datetime pattern"),
            time: Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}$").expect("Invalid time pattern"),
            year: Regex::new(r"^[0-9]{4}$").expect("Invalid year pattern"),
        }
    }
}

/// Validates a raw value against a column kind and its type arguments.
pub fn validate(kind: &ColumnKind, raw_value: &str, arguments: &[String]) -> Verdict {
    match kind {
        ColumnKind::Integer => is_integer(raw_value).into(),
        ColumnKind::Float => is_float(raw_value).into(),
        ColumnKind::Decimal => is_decimal(raw_value, arguments).into(),
        ColumnKind::Date => is_date(raw_value).into(),
        ColumnKind::DateTime => is_datetime(raw_value).into(),
        ColumnKind::Time => is_time(raw_value).into(),
        ColumnKind::Year => is_year(raw_value).into(),
        ColumnKind::Char => fits_char(raw_value, arguments).into(),
        ColumnKind::Timestamp => Verdict::Unimplemented,
        ColumnKind::Text | ColumnKind::Unrecognized(_) => Verdict::Valid,
    }
}

/// Boolean form keyed by base type name.
///
/// Unknown base types pass; a type with an undecided rule does not.
pub fn is_valid(base_type: &str, raw_value: &str, arguments: &[String]) -> bool {
    validate(&ColumnKind::from_base_type(base_type), raw_value, arguments).is_valid()
}

/// Arbitrary-precision integer literal.
pub fn is_integer(value: &str) -> bool {
    TypePatterns::instance().integer.is_match(value)
}

/// Plain decimal floating-point literal, no exponent.
pub fn is_float(value: &str) -> bool {
    TypePatterns::instance().float.is_match(value)
}

/// Fixed-point literal bounded by `[precision, scale]`.
pub fn is_decimal(value: &str, arguments: &[String]) -> bool {
    let Some((precision, scale)) = decimal_arguments(arguments) else {
        return false;
    };

    let Some(captures) = TypePatterns::instance().decimal.captures(value) else {
        return false;
    };

    let max_integer_digits = precision.saturating_sub(scale).max(1);
    let integer_digits = captures.name("int").map_or(0, |m| m.as_str().len());
    let fraction_digits = captures.name("frac").map_or(0, |m| m.as_str().len());

    integer_digits <= max_integer_digits && fraction_digits <= scale
}

fn decimal_arguments(arguments: &[String]) -> Option<(usize, usize)> {
    match arguments {
        [] => Some(DEFAULT_DECIMAL_PRECISION),
        [precision] => Some((precision.trim().parse().ok()?, 0)),
        [precision, scale] => Some((precision.trim().parse().ok()?, scale.trim().parse().ok()?)),
        _ => None,
    }
}

/// `YYYY-MM-DD` naming a real calendar date.
pub fn is_date(value: &str) -> bool {
    let Some(captures) = TypePatterns::instance().date.captures(value) else {
        return false;
    };
    calendar_date(&captures["y"], &captures["m"], &captures["d"]).is_some()
}

/// `YYYY-MM-DD HH:MM:SS` naming a real date and wall-clock time.
pub fn is_datetime(value: &str) -> bool {
    let Some(captures) = TypePatterns::instance().datetime.captures(value) else {
        return false;
    };
    calendar_date(&captures["y"], &captures["m"], &captures["d"]).is_some()
        && clock_time(&captures["hh"], &captures["mm"], &captures["ss"]).is_some()
}

/// `HH:MM:SS` shape.
pub fn is_time(value: &str) -> bool {
    TypePatterns::instance().time.is_match(value)
}

/// Four digits.
pub fn is_year(value: &str) -> bool {
    TypePatterns::instance().year.is_match(value)
}

/// Character count within the declared length.
pub fn fits_char(value: &str, arguments: &[String]) -> bool {
    let max_length = match arguments.first() {
        None => DEFAULT_CHAR_LENGTH,
        Some(length) => match length.trim().parse::<usize>() {
            Ok(length) => length,
            Err(_) => return false,
        },
    };
    value.chars().count() <= max_length
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
        // year zero parses in the proleptic calendar but is not a storable date
        .filter(|_| year != "0000")
}

fn clock_time(hour: &str, minute: &str, second: &str) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?)
}
