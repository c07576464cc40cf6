//! Request and response bodies of the REST API.
//!
//! Domain records (events, rosters, profiles) come from `luma-core`; this
//! module only holds the envelopes specific to individual endpoints.

use chrono::{DateTime, Utc};
use luma_core::{AttendeeId, Cart, EventId, PaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Token pair returned by `/login/` and `/api/token/refresh/`.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct CheckInRequest<'a> {
    pub qr_data: &'a str,
}

/// The attendee echoed back by an accepted check-in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckedInAttendee {
    #[serde(default)]
    pub id: Option<AttendeeId>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub(crate) struct CheckInSuccessBody {
    #[serde(default)]
    pub attendee: Option<CheckedInAttendee>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend verdict on a check-in submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInResponse {
    /// 2xx. `attendee` is absent when the backend only acknowledged the call.
    Accepted {
        attendee: Option<CheckedInAttendee>,
        message: Option<String>,
    },
    /// 4xx with an `error` body, e.g. already checked in or unknown ticket.
    Rejected { message: Option<String> },
}

/// One cart line as the payment endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentItem {
    pub event_id: EventId,
    pub quantity: u32,
    /// Sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body of `POST /payments/create-payment-intent/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntentRequest {
    pub items: Vec<PaymentItem>,
}

impl From<&Cart> for PaymentIntentRequest {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| PaymentItem {
                    event_id: item.event_id,
                    quantity: item.quantity,
                    price: item.unit_price,
                })
                .collect(),
        }
    }
}

/// Payment intent created by the backend, handed to the payment processor.
#[derive(Clone, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    pub payment_id: PaymentId,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("client_secret", &"[REDACTED]")
            .field("payment_id", &self.payment_id)
            .finish()
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend uses `error` for its own errors and `detail` for framework
/// errors (authentication, throttling).
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "detail", "message"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use luma_core::{CartItem, CartLineId, TicketId};

    use super::*;

    #[test]
    fn test_payment_request_from_cart_sends_numeric_prices() {
        let mut cart = Cart::new();
        cart.add_item(CartItem {
            id: CartLineId::generate(),
            event_id: EventId::new(12),
            event_title: "Show".to_string(),
            event_thumbnail: None,
            event_date: "2026-05-01T20:00:00Z".parse().unwrap(),
            ticket_id: TicketId::new(4),
            ticket_name: "VIP".to_string(),
            unit_price: Decimal::new(7550, 2),
            quantity: 2,
        })
        .unwrap();

        let body = serde_json::to_value(PaymentIntentRequest::from(&cart)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"items": [{"event_id": 12, "quantity": 2, "price": 75.5}]})
        );
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Participante já fez check-in"}"#).as_deref(),
            Some("Participante já fez check-in")
        );
        assert_eq!(
            error_message(r#"{"detail": "Token is invalid or expired"}"#).as_deref(),
            Some("Token is invalid or expired")
        );
        assert_eq!(error_message("<html>500</html>"), None);
    }
}
