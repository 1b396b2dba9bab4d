//! Status and role enums.
//!
//! Both are stored as `TEXT` columns holding their `SCREAMING_SNAKE_CASE`
//! string form.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Order lifecycle status.
///
/// The checkout core only ever moves an order from `Pending` to `Paid`.
/// Status updates issued by clients may carry any other label, which is kept
/// verbatim in [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Created, payment not yet confirmed.
    #[default]
    Pending,
    /// Payment confirmed.
    Paid,
    /// Free-form status supplied by a client.
    Other(String),
}

impl OrderStatus {
    /// String form stored in the database and sent over the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Other(label) => label,
        }
    }

    /// Parse a status label. Known labels map to their variants; anything
    /// else is preserved as [`OrderStatus::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "PENDING" => Self::Pending,
            "PAID" => Self::Paid,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Marketplace user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular customer or seller.
    #[default]
    User,
    /// Can edit any product and view the member list.
    Admin,
}

impl UserRole {
    /// String form stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether this role carries administrator rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use sqlx::error::BoxDynError;
    use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
    use sqlx::{Decode, Encode, Postgres, Type, encode::IsNull};

    use super::{OrderStatus, UserRole};

    impl Type<Postgres> for OrderStatus {
        fn type_info() -> PgTypeInfo {
            <String as Type<Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            <String as Type<Postgres>>::compatible(ty)
        }
    }

    impl<'r> Decode<'r, Postgres> for OrderStatus {
        fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
            let label = <&str as Decode<Postgres>>::decode(value)?;
            Ok(Self::from_label(label))
        }
    }

    impl Encode<'_, Postgres> for OrderStatus {
        fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
        }
    }

    impl Type<Postgres> for UserRole {
        fn type_info() -> PgTypeInfo {
            <String as Type<Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            <String as Type<Postgres>>::compatible(ty)
        }
    }

    impl<'r> Decode<'r, Postgres> for UserRole {
        fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
            let label = <&str as Decode<Postgres>>::decode(value)?;
            Ok(label.parse()?)
        }
    }

    impl Encode<'_, Postgres> for UserRole {
        fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::from_label("PENDING"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_label("PAID"), OrderStatus::Paid);
        assert_eq!(
            OrderStatus::from_label("SHIPPED"),
            OrderStatus::Other("SHIPPED".to_string())
        );
        assert_eq!(OrderStatus::Other("SHIPPED".into()).to_string(), "SHIPPED");
    }

    #[test]
    fn test_order_status_serde_is_plain_string() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap_or_default();
        assert_eq!(json, "\"PAID\"");

        let status: OrderStatus =
            serde_json::from_str("\"DELIVERED\"").unwrap_or(OrderStatus::Pending);
        assert_eq!(status, OrderStatus::Other("DELIVERED".into()));
    }

    #[test]
    fn test_user_role_round_trip() {
        assert_eq!("ADMIN".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("user".parse::<UserRole>(), Ok(UserRole::User));
        assert!("owner".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}
