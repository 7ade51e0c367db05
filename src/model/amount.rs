//! Amount type for monetary values on an invoice.
//!
//! The editor accepts whatever the user types into the amount field. That text is normalized
//! exactly once, by `Amount::coerce`, whenever totals are computed: anything that does not parse
//! becomes zero. Formatting follows the en-AU currency convention, e.g. `-$1,234.56`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Div, Sub};
use std::str::FromStr;

/// The number of minor-unit digits for AUD.
const MINOR_DIGITS: u32 = 2;

/// The largest magnitude accepted from text. Sums of accepted amounts stay far inside `Decimal`'s
/// range.
const MAX_DOLLARS: i64 = 1_000_000_000_000_000;

/// Represents a dollar amount.
///
/// `Amount` keeps full precision internally; rounding to cents only happens when the amount is
/// displayed. This matters for GST, where `143.48 / 11` is carried unrounded into the net.
///
/// # Examples
///
/// ```
/// # use invoice_pad::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "$1,250.50");
/// ```
///
/// Lenient parsing never fails:
/// ```
/// # use invoice_pad::model::Amount;
/// assert!(Amount::coerce("abc").is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parses `s`, substituting zero for empty, unparsable or out-of-range input. This is the one
    /// place where the parse-or-zero policy lives.
    pub fn coerce(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the value rounded to whole cents, half away from zero.
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(MINOR_DIGITS, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub struct AmountError(Reason);

#[derive(Debug)]
enum Reason {
    Decimal(rust_decimal::Error),
    Malformed(String),
    TooLarge(String),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Reason::Decimal(e) => Display::fmt(e, f),
            Reason::Malformed(s) => write!(f, "'{s}' is not an amount"),
            Reason::TooLarge(s) => write!(f, "'{s}' is larger than {MAX_DOLLARS}"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.0 {
            Reason::Decimal(e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Accepts `50`, `50.00`, `$50.00`, `-$50.00`, `$1,000.00` and surrounding whitespace. An
    /// empty string is zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");
        // Decimal accepts its own sign and `_` separators, neither of which is an amount here.
        if digits.starts_with(['-', '+']) || digits.contains('_') {
            return Err(AmountError(Reason::Malformed(trimmed.to_string())));
        }

        let value = Decimal::from_str(&digits)
            .or_else(|_| Decimal::from_scientific(&digits))
            .map_err(|e| AmountError(Reason::Decimal(e)))?;
        if value.abs() > Decimal::from(MAX_DOLLARS) {
            return Err(AmountError(Reason::TooLarge(trimmed.to_string())));
        }
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    /// en-AU currency: `$1,234.56`, `-$5.00`, `$0.00`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let num = rounded.abs().to_f64().unwrap_or_default();
        write!(f, "{sign}${}", format_num::format_num!(",.2", num))
    }
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

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl Div<u32> for Amount {
    type Output = Amount;

    fn div(self, rhs: u32) -> Self::Output {
        Amount(self.0 / Decimal::from(rhs))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

/// Renders `amount` as an en-AU currency string rounded to cents.
pub fn format_currency(amount: impl Into<Amount>) -> String {
    amount.into().to_string()
}

/// Renders raw user text as currency. Text that is not a number renders as `$0.00`.
pub fn format_currency_text(text: &str) -> String {
    format_currency(Amount::coerce(text))
}
