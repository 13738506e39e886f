//! Line-item quantity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is below the minimum of 1.
    #[error("quantity must be at least 1, got {0}")]
    TooSmall(i32),
}

/// A cart line-item quantity.
///
/// Quantities are always positive: a line with zero items does not exist,
/// it is removed. Constructing a `Quantity` is the only way to get one, so
/// any code holding a value of this type may rely on `>= 1`.
///
/// Deserialization goes through the same validation, so a request body
/// carrying `0` or a negative number is rejected before it reaches any
/// service code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// The smallest allowed quantity.
    pub const MIN: Self = Self(1);

    /// Create a quantity, rejecting values below 1.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooSmall`] if `value < 1`.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(QuantityError::TooSmall(value))
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Combine two quantities additively, clamping at `i32::MAX`.
    ///
    /// Used when two lines for the same variant collapse into one; the sum
    /// of two positive values stays positive, so the result needs no
    /// re-validation.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_positive() {
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_new_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::TooSmall(0)));
        assert_eq!(Quantity::new(-3), Err(QuantityError::TooSmall(-3)));
    }

    #[test]
    fn test_saturating_add_combines() {
        let a = Quantity::new(2).unwrap();
        let b = Quantity::new(3).unwrap();
        assert_eq!(a.saturating_add(b).get(), 5);
    }

    #[test]
    fn test_saturating_add_clamps() {
        let a = Quantity::new(i32::MAX).unwrap();
        let b = Quantity::MIN;
        assert_eq!(a.saturating_add(b).get(), i32::MAX);
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let quantity = Quantity::new(7).unwrap();
        let json = serde_json::to_string(&quantity).unwrap();
        assert_eq!(json, "7");

        let parsed: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, quantity);
    }
}
