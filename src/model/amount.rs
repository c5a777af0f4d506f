//! Amount type for handling monetary values as they are typed into room sheets.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a euro sign and thousands separators. It also provides the lenient
//! number parser used for every numeric cell (quantities and discounts included).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents how euro amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ euro: true, commas: true }` -> `-€60,000.00`
///  - `AmountFormat{ euro: false, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ euro: false, commas: false }` -> `-60000.00`
///  - `AmountFormat{ euro: true, commas: false }` -> `-€60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a euro sign is present in the formatting.
    euro: bool,
    /// Whether thousands separators are present in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// Values computed by the engine are written back bare: `1234.50`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    euro: false,
    commas: false,
};

/// Represents a euro amount, held to the cent.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// Parsing with a euro sign:
/// ```
/// # use arredo::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("€ 1.234,50").unwrap();
/// assert_eq!(amount.to_string(), "€1,234.50");
/// ```
///
/// Value equivalency, but not absolute equivalency
/// ```
/// # use arredo::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("5000").unwrap();
/// let b = Amount::from_str("€5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value, rounded to cents.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub fn new(value: Decimal) -> Self {
        Self {
            value: to_cents(value),
            format: DEFAULT_FORMAT,
        }
    }

    /// Creates an Amount that displays with a euro sign and thousands separators, for reports.
    pub fn euro(value: Decimal) -> Self {
        Self {
            value: to_cents(value),
            format: AmountFormat {
                euro: true,
                commas: true,
            },
        }
    }

    /// Creates a new Amount that keeps the formatting of `self` but holds `value`.
    pub fn with_value(&self, value: Decimal) -> Self {
        Self {
            value: to_cents(value),
            format: self.format,
        }
    }

    /// Parses `s`, falling back to zero when the cell does not hold a number.
    pub fn parse_lenient(s: &str) -> Self {
        Amount::from_str(s).unwrap_or_default()
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value().is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value().is_sign_negative()
    }
}

/// Rounds to cents, midpoint away from zero.
pub(crate) fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a number", self.0)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Amount::default());
        }
        let number = parse_number(s).ok_or_else(|| AmountError(s.to_string()))?;
        Ok(Amount {
            value: to_cents(number.value),
            format: AmountFormat {
                euro: number.euro,
                commas: number.grouped,
            },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            (String::from("-"), self.value().abs())
        } else {
            (String::new(), self.value().abs())
        };

        let eur = if self.format.euro {
            String::from("€")
        } else {
            String::new()
        };

        if self.format.commas {
            let digits = format!("{num:.2}");
            let (int, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
            write!(f, "{sign}{eur}{}.{frac}", group_thousands(int))
        } else {
            write!(f, "{sign}{eur}{num:.2}")
        }
    }
}

/// Inserts a comma between every group of three digits, counting from the right.
fn group_thousands(int: &str) -> String {
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (ix, c) in int.chars().enumerate() {
        if ix > 0 && (int.len() - ix) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

/// Parses a numeric cell leniently: anything that is not a number is zero.
///
/// Accepts the same shapes as `Amount`, plus a trailing `%`, without rounding. Used for
/// quantities and discount percentages.
pub fn parse_decimal(s: &str) -> Decimal {
    parse_number(s).map(|n| n.value).unwrap_or_default()
}

/// Renders a non-monetary number without trailing zeros, e.g. `2.50` -> `2.5`.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// The result of reading a number out of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Number {
    value: Decimal,
    euro: bool,
    grouped: bool,
}

/// Reads a number from spreadsheet text. Handles an optional sign, a euro sign before or after
/// the digits, a trailing `%`, and both `1,234.56` and `1.234,56` grouping conventions. A single
/// comma that is not followed by exactly three digits is a decimal comma (`12,5`).
fn parse_number(s: &str) -> Option<Number> {
    let mut t = s.trim();
    let mut negative = false;
    let mut euro = false;

    if let Some(rest) = t.strip_prefix('-') {
        negative = true;
        t = rest.trim_start();
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest.trim_start();
    }
    if let Some(rest) = t.strip_prefix('€') {
        euro = true;
        t = rest.trim_start();
    }
    if !negative {
        if let Some(rest) = t.strip_prefix('-') {
            negative = true;
            t = rest.trim_start();
        }
    }
    if let Some(rest) = t.strip_suffix('%') {
        t = rest.trim_end();
    }
    if let Some(rest) = t.strip_suffix('€') {
        euro = true;
        t = rest.trim_end();
    }

    if t.is_empty() || !t.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let (canonical, grouped) = canonicalize_separators(t)?;
    let mut value = Decimal::from_str(&canonical).ok()?;
    if negative {
        value.set_sign_negative(true);
    }
    Some(Number {
        value,
        euro,
        grouped,
    })
}

/// Rewrites the digits in `t` (digits, `.` and `,` only) to `1234.56` form. Returns whether
/// thousands grouping was present.
fn canonicalize_separators(t: &str) -> Option<(String, bool)> {
    let dots = t.matches('.').count();
    let commas = t.matches(',').count();

    let (decimal, group) = match (dots, commas) {
        (0, 0) => return Some((t.to_string(), false)),
        (1, 0) => return Some((t.to_string(), false)),
        (_, 0) => (None, Some('.')),
        (0, 1) => {
            let (before, after) = t.split_once(',')?;
            if after.len() == 3 && !before.is_empty() && !before.starts_with('0') {
                (None, Some(','))
            } else {
                (Some(','), None)
            }
        }
        (0, _) => (None, Some(',')),
        _ => {
            // Both present: whichever comes last is the decimal separator.
            let last_dot = t.rfind('.')?;
            let last_comma = t.rfind(',')?;
            if last_dot > last_comma {
                (Some('.'), Some(','))
            } else {
                (Some(','), Some('.'))
            }
        }
    };

    let (int_part, frac_part) = match decimal {
        Some(sep) => {
            let idx = t.rfind(sep)?;
            (&t[..idx], Some(&t[idx + 1..]))
        }
        None => (t, None),
    };

    if let Some(frac) = frac_part {
        if frac.contains(['.', ',']) {
            return None;
        }
    }

    let grouped = match group {
        Some(sep) if int_part.contains(sep) => {
            let mut groups = int_part.split(sep);
            let first = groups.next().unwrap_or_default();
            if first.is_empty()
                || first.len() > 3
                || first.starts_with('0')
                || groups.any(|g| g.len() != 3)
            {
                return None;
            }
            true
        }
        _ => false,
    };

    let digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if int_part.contains(['.', ',']) && !grouped {
        return None;
    }
    let canonical = match frac_part {
        Some(frac) if digits.is_empty() => format!("0.{frac}"),
        Some(frac) => format!("{digits}.{frac}"),
        None => digits,
    };
    Some((canonical, grouped))
}
