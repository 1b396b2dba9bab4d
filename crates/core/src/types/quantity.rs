//! Positive item quantities.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative input.
    #[error("quantity must be greater than zero")]
    NotPositive,
    /// Input does not fit the storage type.
    #[error("quantity is too large")]
    TooLarge,
}

/// A strictly positive number of units of a product.
///
/// Cart lines and order items never carry a zero quantity; the database
/// enforces the same rule with a `CHECK (quantity > 0)` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(value) {
            Some(v) => Ok(Self(v)),
            None => Err(QuantityError::NotPositive),
        }
    }

    /// Interpret a client-supplied value, falling back to one unit when the
    /// value is missing or not positive.
    #[must_use]
    pub fn or_one(value: Option<i64>) -> Self {
        value
            .and_then(|v| Self::try_from(v).ok())
            .unwrap_or(Self::ONE)
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(QuantityError::NotPositive);
        }
        let value = i32::try_from(value).map_err(|_| QuantityError::TooLarge)?;
        // i32 is the column type; stay within it so round trips never fail.
        u32::try_from(value)
            .map_err(|_| QuantityError::TooLarge)
            .and_then(Self::new)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        Self::from(value.get())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Quantity {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Quantity {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let raw = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        let raw = i32::try_from(self.get())?;
        <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&raw, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::try_from(-3_i64), Err(QuantityError::NotPositive));
    }

    #[test]
    fn test_too_large_is_rejected() {
        assert_eq!(
            Quantity::try_from(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge)
        );
    }

    #[test]
    fn test_or_one_defaults_invalid_values() {
        assert_eq!(Quantity::or_one(None), Quantity::ONE);
        assert_eq!(Quantity::or_one(Some(0)), Quantity::ONE);
        assert_eq!(Quantity::or_one(Some(-2)), Quantity::ONE);
        assert_eq!(Quantity::or_one(Some(4)).get(), 4);
    }

    #[test]
    fn test_deserialize_rejects_non_positive() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        let q: Result<Quantity, _> = serde_json::from_str("2");
        assert_eq!(q.map(|q| q.get()).ok(), Some(2));
    }
}
