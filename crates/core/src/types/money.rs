//! Integer currency amounts.
//!
//! The marketplace sells in a single currency (KRW) that has no minor unit,
//! so every price and total is a whole number of won.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

use crate::Quantity;

/// An amount of money in whole won.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Won(i64);

impl Won {
    /// Zero won.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a whole number of won.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity.get())))
    }

    /// Convert an amount reported by a payment provider to whole won.
    ///
    /// Providers report amounts as JSON numbers; the value is rounded to the
    /// nearest integer (halves away from zero).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Saturating float-to-int cast is intended
    pub fn from_reported(amount: f64) -> Self {
        Self(amount.round() as i64)
    }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₩{}", self.0)
    }
}

impl From<i64> for Won {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Won> for i64 {
    fn from(amount: Won) -> Self {
        amount.0
    }
}

impl Add for Won {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Won {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Won {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <i64 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Won {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        Ok(Self(<i64 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Won {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <i64 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap_or(Quantity::ONE)
    }

    #[test]
    fn test_times_multiplies_by_quantity() {
        assert_eq!(Won::new(12_500).times(qty(3)), Won::new(37_500));
    }

    #[test]
    fn test_sum_of_line_totals() {
        let total: Won = [Won::new(5_000).times(qty(2)), Won::new(5_000)]
            .into_iter()
            .sum();
        assert_eq!(total, Won::new(15_000));
    }

    #[test]
    fn test_from_reported_rounds_to_nearest() {
        assert_eq!(Won::from_reported(15_000.0), Won::new(15_000));
        assert_eq!(Won::from_reported(14_999.4), Won::new(14_999));
        assert_eq!(Won::from_reported(14_999.5), Won::new(15_000));
    }

    #[test]
    fn test_display() {
        assert_eq!(Won::new(9_900).to_string(), "₩9900");
    }
}
