//! Decimal amount type for statement, finance and ledger figures.
//!
//! Uses `rust_decimal` internally so that exact comparisons between finance
//! and ledger credits are not subject to floating-point error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A monetary amount read from one of the source tables.
///
/// Equality is value equality: `500`, `500.0` and `500.00` compare equal.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use threeway_recon::Amount;
///
/// let amount = Amount::from_str("1,250.50").unwrap();
/// assert_eq!(amount, Amount::from_str("1250.5").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Tolerance used when comparing group sums against the bank amount.
    pub const EPSILON: Self = Amount(Decimal::from_parts(1, 0, 0, false, 4));

    /// Parses a cell value, returning `None` for blank or malformed input.
    pub fn parse(cell: &str) -> Option<Self> {
        if cell.trim().is_empty() {
            return None;
        }
        Amount::from_str(cell).ok()
    }

    /// Returns `true` if `|self - other| < epsilon`.
    ///
    /// A difference too large to represent is never within tolerance.
    pub fn within(&self, other: Amount, epsilon: Amount) -> bool {
        self.0
            .checked_sub(other.0)
            .map_or(false, |diff| diff.abs() < epsilon.0)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Sums amounts, returning `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Amount>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Rounds to the nearest whole unit, ties to even.
    ///
    /// Returns `None` if the rounded value does not fit in an `i64`.
    pub fn round_to_units(&self) -> Option<i64> {
        self.0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    /// Accepts thousands separators (`1,250.00`) and scientific notation.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
        let decimal = Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned))?;
        Ok(Amount(decimal))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}
