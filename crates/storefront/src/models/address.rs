//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gogi_core::{AddressId, UserId};

/// An entry in a user's address book.
///
/// At most one address per user has `is_default` set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub address1: String,
    pub address2: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating an address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub label: String,
    pub receiver_name: String,
    pub phone: String,
    pub postal_code: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub is_default: bool,
}

impl NewAddress {
    /// Name of the first required field that is blank, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("label", &self.label),
            ("receiverName", &self.receiver_name),
            ("phone", &self.phone),
            ("postalCode", &self.postal_code),
            ("address1", &self.address1),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Partial address update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdate {
    pub label: Option<String>,
    pub receiver_name: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_reports_first_blank() {
        let mut address = NewAddress {
            label: "Home".into(),
            receiver_name: "Kim".into(),
            phone: "010-0000-0000".into(),
            postal_code: "04524".into(),
            address1: "  ".into(),
            ..NewAddress::default()
        };
        assert_eq!(address.missing_field(), Some("address1"));

        address.address1 = "Sejong-daero 110".into();
        assert_eq!(address.missing_field(), None);
    }

    #[test]
    fn test_address2_defaults_to_empty() {
        let address: NewAddress = serde_json::from_str(
            r#"{"label":"Home","receiverName":"Kim","phone":"010","postalCode":"04524","address1":"Seoul"}"#,
        )
        .unwrap_or_default();
        assert_eq!(address.address2, "");
        assert!(!address.is_default);
    }
}
