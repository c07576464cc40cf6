//! Checkout against the payment backend.
//!
//! The backend turns the cart into a payment intent (it adds the same 10%
//! platform fee the cart shows) and returns the client secret the payment
//! processor's UI needs. Card entry happens in that UI; once it reports
//! success the cart is cleared with [`confirm_paid`].

use luma_core::Price;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError, PaymentIntent, PaymentIntentRequest};
use crate::cart::CartStore;
use crate::error::AppError;

/// A created payment intent plus the total the customer saw.
#[derive(Debug, Clone)]
pub struct PendingPayment {
    pub intent: PaymentIntent,
    pub total: Price,
}

/// Create a payment intent for the current cart.
///
/// # Errors
///
/// - `AppError::EmptyCart` if there is nothing to pay for
/// - a session error if nobody is logged in
/// - `ApiError::Status` with the backend's `error` text if it refuses
#[instrument(skip_all, fields(lines = cart.cart().items().len()))]
pub async fn start_checkout(
    client: &ApiClient,
    cart: &CartStore,
) -> Result<PendingPayment, AppError> {
    let cart = cart.cart();
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }
    if !client.is_authenticated().await {
        return Err(ApiError::NotAuthenticated.into());
    }

    let request = PaymentIntentRequest::from(cart);
    let intent = client.create_payment_intent(&request).await?;
    info!(payment_id = %intent.payment_id, total = %cart.total(), "Payment intent created");

    Ok(PendingPayment {
        intent,
        total: Price::brl(cart.total()),
    })
}

/// Empty the cart once the payment processor confirmed the payment.
///
/// # Errors
///
/// Returns `AppError::Storage` if the emptied cart cannot be persisted.
#[instrument(skip_all, fields(payment_id = %payment.intent.payment_id))]
pub fn confirm_paid(cart: &mut CartStore, payment: &PendingPayment) -> Result<(), AppError> {
    cart.clear()?;
    info!("Payment confirmed, cart cleared");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use luma_core::{CartItem, CartLineId, EventId, TicketId};
    use rust_decimal::Decimal;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn token() -> String {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("e30.{payload}.sig")
    }

    fn line(event: i64, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartLineId::generate(),
            event_id: EventId::new(event),
            event_title: "Show".to_string(),
            event_thumbnail: None,
            event_date: "2026-11-20T23:00:00Z".parse().unwrap(),
            ticket_id: TicketId::new(1),
            ticket_name: "Inteira".to_string(),
            unit_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    async fn setup(server: &MockServer, logged_in: bool) -> (ApiClient, CartStore) {
        let store = MemoryStore::new();
        let store = if logged_in {
            store.with_value("token", &token())
        } else {
            store
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(store);
        let config = StorefrontConfig::new(
            Url::parse(&format!("{}/api", server.uri())).unwrap(),
            "unused",
        );
        let client = ApiClient::new(&config, store.clone()).unwrap();
        let cart = CartStore::load(store).unwrap();
        (client, cart)
    }

    #[tokio::test]
    async fn test_checkout_then_confirm_clears_cart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payments/create-payment-intent/"))
            .and(body_json(json!({"items": [
                {"event_id": 3, "quantity": 2, "price": 50.0},
                {"event_id": 4, "quantity": 1, "price": 25.5}
            ]})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"clientSecret": "pi_123_secret", "payment_id": 88})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (client, mut cart) = setup(&server, true).await;
        cart.add_item(line(3, 5000, 2)).unwrap();
        cart.add_item(line(4, 2550, 1)).unwrap();

        let pending = start_checkout(&client, &cart).await.unwrap();
        assert_eq!(pending.intent.client_secret, "pi_123_secret");
        assert_eq!(pending.total.to_string(), "R$ 138,05");

        confirm_paid(&mut cart, &pending).unwrap();
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_and_missing_session_fail_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let (client, mut cart) = setup(&server, false).await;
        assert!(matches!(
            start_checkout(&client, &cart).await.unwrap_err(),
            AppError::EmptyCart
        ));

        cart.add_item(line(3, 5000, 1)).unwrap();
        let err = start_checkout(&client, &cart).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::NotAuthenticated)));
        assert_eq!(cart.cart().items().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_text_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payments/create-payment-intent/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Evento esgotado"})),
            )
            .mount(&server)
            .await;

        let (client, mut cart) = setup(&server, true).await;
        cart.add_item(line(3, 5000, 1)).unwrap();

        let err = start_checkout(&client, &cart).await.unwrap_err();
        assert_eq!(err.user_message(), "Evento esgotado");
        assert_eq!(cart.cart().items().len(), 1);
    }
}
