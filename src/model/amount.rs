//! Amount handling for monetary values typed by a user or sent over the wire.
//!
//! Amounts travel as plain decimal strings (`1234567.891`) and are shown to the user with
//! thousands separators (`1,234,567.891`). This module converts between the two.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

const SEPARATOR: char = ',';
const POINT: char = '.';

/// Reformats free-form amount input for display.
///
/// Every character that is not an ASCII digit or a period is dropped, only the first period is
/// kept, and the integer part is grouped by thousands. The fractional part is never grouped.
/// Formatting an already formatted amount returns it unchanged.
///
/// ```
/// # use cashcal::model::format_amount;
/// assert_eq!(format_amount("1234567.891"), "1,234,567.891");
/// assert_eq!(format_amount("1,234,567.891"), "1,234,567.891");
/// assert_eq!(format_amount("$12a34.5.6"), "1,234.56");
/// ```
pub fn format_amount(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    let mut seen_point = false;
    for c in value.chars() {
        if c.is_ascii_digit() {
            cleaned.push(c);
        } else if c == POINT && !seen_point {
            seen_point = true;
            cleaned.push(c);
        }
    }

    match cleaned.split_once(POINT) {
        Some((int, frac)) => format!("{}{POINT}{frac}", group_thousands(int)),
        None => group_thousands(&cleaned),
    }
}

/// Removes thousands separators, turning a display amount back into its wire form.
pub fn strip_grouping(value: &str) -> String {
    value.replace(SEPARATOR, "")
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (ix, c) in digits.chars().enumerate() {
        if ix > 0 && (len - ix) % 3 == 0 {
            out.push(SEPARATOR);
        }
        out.push(c);
    }
    out
}

/// Represents a monetary amount.
///
/// Parsing accepts the value with or without thousands separators. Serialization always
/// produces the plain wire form, while `Display` produces the grouped form.
///
/// ```
/// # use cashcal::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1,250.75").unwrap();
/// assert_eq!(amount.wire(), "1250.75");
/// assert_eq!(amount.to_string(), "1,250.75");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        value: Decimal::ZERO,
    };

    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The plain decimal string sent to the backend.
    pub fn wire(&self) -> String {
        self.value.to_string()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmountError")
            .field("input", &self.input)
            .field("source", &self.source)
            .finish()
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let plain = strip_grouping(s.trim());
        let value = Decimal::from_str(&plain).map_err(|source| AmountError {
            input: s.to_string(),
            source,
        })?;
        Ok(Amount { value })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.value.is_sign_negative() && !self.value.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{sign}{}", format_amount(&self.value.abs().to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.wire())
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

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.value + rhs.value)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}
