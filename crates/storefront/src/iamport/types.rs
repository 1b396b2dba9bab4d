//! Iamport REST API wire types.

use serde::Deserialize;

/// Response envelope shared by every Iamport endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub code: i64,
    pub message: Option<String>,
    pub response: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap a successful response, or surface the provider's message.
    pub fn into_result(self, fallback: &str) -> Result<T, super::IamportError> {
        match self.response {
            Some(response) if self.code == 0 => Ok(response),
            _ => Err(super::IamportError::Provider(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_owned()),
            )),
        }
    }
}

/// `response` of `POST /users/getToken`.
#[derive(Debug, Deserialize)]
pub(super) struct AccessToken {
    pub access_token: String,
}

/// Payment state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PaymentStatus {
    Ready,
    Paid,
    Cancelled,
    Failed,
    /// Any status this client does not know about.
    Other(String),
}

impl PaymentStatus {
    /// Provider label for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "ready" => Self::Ready,
            "paid" => Self::Paid,
            "cancelled" => Self::Cancelled,
            "failed" => Self::Failed,
            _ => Self::Other(label),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `response` of `GET /payments/{imp_uid}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    pub imp_uid: String,
    pub merchant_uid: String,
    pub status: PaymentStatus,
    /// Paid amount as a JSON number, in won.
    pub amount: f64,
    pub buyer_email: Option<String>,
    pub buyer_name: Option<String>,
    /// Unix timestamp of the payment, `0` when unpaid.
    pub paid_at: Option<i64>,
}

impl Payment {
    /// Whether the provider reports the payment as completed.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_deserializes_provider_shape() {
        let json = r#"{
            "imp_uid": "imp_123",
            "merchant_uid": "order_1",
            "status": "paid",
            "amount": 15000,
            "buyer_email": "buyer@gogi.kr",
            "paid_at": 1767225600,
            "pay_method": "card"
        }"#;
        let payment: Payment = serde_json::from_str(json).unwrap_or_else(|e| panic!("{e}"));
        assert!(payment.is_paid());
        assert!((payment.amount - 15_000.0).abs() < f64::EPSILON);
        assert_eq!(payment.buyer_name, None);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        assert_eq!(
            PaymentStatus::from("partial_cancelled".to_string()),
            PaymentStatus::Other("partial_cancelled".to_string())
        );
        assert_eq!(PaymentStatus::from("failed".to_string()), PaymentStatus::Failed);
    }

    #[test]
    fn test_envelope_non_zero_code_is_provider_error() {
        let envelope: Envelope<AccessToken> =
            serde_json::from_str(r#"{"code": -1, "message": "invalid imp_key", "response": null}"#)
                .unwrap_or_else(|e| panic!("{e}"));
        let err = envelope.into_result("token request failed");
        assert!(matches!(err, Err(super::super::IamportError::Provider(m)) if m == "invalid imp_key"));
    }

    #[test]
    fn test_envelope_missing_response_uses_fallback() {
        let envelope: Envelope<AccessToken> =
            serde_json::from_str(r#"{"code": 0}"#).unwrap_or_else(|e| panic!("{e}"));
        let err = envelope.into_result("token request failed");
        assert!(
            matches!(err, Err(super::super::IamportError::Provider(m)) if m == "token request failed")
        );
    }
}
