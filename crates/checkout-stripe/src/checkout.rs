//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API.
//! Line items reference prices that already exist in Stripe; amounts, tax and
//! currency are computed by Stripe and read back from its response.

use crate::config::StripeConfig;
use crate::webhook::{parse_event, verify_signature};
use async_trait::async_trait;
use chrono::DateTime;
use checkout_core::{
    CheckoutPolicy, CheckoutRequest, PaymentError, PaymentProvider, PaymentResult,
    ProviderSession, WebhookEvent,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page; card data never touches this service.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    policy: CheckoutPolicy,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig, policy: CheckoutPolicy) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            policy,
            client,
        })
    }

    /// Create from environment variables
    pub fn from_env(policy: CheckoutPolicy) -> PaymentResult<Self> {
        Self::new(StripeConfig::from_env(), policy)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form fields for `POST /v1/checkout/sessions`, in wire order
    pub fn build_form_params(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), self.policy.mode.as_str().to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (i, method) in self.policy.payment_method_types.iter().enumerate() {
            form_params.push((
                format!("payment_method_types[{}]", i),
                method.as_str().to_string(),
            ));
        }

        for (i, country) in self.policy.allowed_countries.iter().enumerate() {
            form_params.push((
                format!("shipping_address_collection[allowed_countries][{}]", i),
                country.to_string(),
            ));
        }

        form_params.push((
            "billing_address_collection".to_string(),
            self.policy.billing_address_collection.as_str().to_string(),
        ));

        if let Some(ref email) = request.customer_email {
            form_params.push(("customer_email".to_string(), email.clone()));
        }

        for (i, item) in request.line_items.iter().enumerate() {
            form_params.push((format!("line_items[{}][price]", i), item.price.clone()));
            form_params.push((
                format!("line_items[{}][quantity]", i),
                item.quantity.to_string(),
            ));
        }

        if let Some(ref metadata) = request.metadata {
            for (key, value) in metadata {
                form_params.push((format!("metadata[{}]", key), value.clone()));
            }
        }

        form_params
    }
}

#[async_trait]
impl PaymentProvider for StripeCheckoutStrategy {
    fn ensure_checkout_ready(&self) -> PaymentResult<()> {
        self.config.require_secret_key().map(|_| ())
    }

    #[instrument(skip(self, request), fields(items = request.line_items.len()))]
    async fn create_checkout(&self, request: &CheckoutRequest) -> PaymentResult<ProviderSession> {
        let auth_header = self.config.auth_header()?;
        let form_params = self.build_form_params(request);

        debug!(
            "Creating Stripe checkout session: {} items, mode={}",
            request.line_items.len(),
            self.policy.mode.as_str()
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth_header)
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            let detail = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(PaymentError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("Stripe API error: {}: {}", status.as_u16(), detail),
            });
        }

        let session_response: StripeCheckoutSessionResponse =
            serde_json::from_str(&body).map_err(|e| {
                PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
            })?;

        info!(
            "Created Stripe checkout session: id={}, amount_total={:?}",
            session_response.id, session_response.amount_total
        );

        Ok(ProviderSession {
            session_id: session_response.id,
            provider: "stripe".to_string(),
            checkout_url: session_response.url,
            amount_total: session_response.amount_total,
            currency: session_response.currency,
            expires_at: session_response
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookEvent> {
        let secret = self.config.require_webhook_secret()?;
        verify_signature(
            secret,
            payload,
            signature,
            self.config.webhook_tolerance_secs,
        )?;
        parse_event(payload)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::{CountryCode, PaymentMethodType};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strategy(base_url: &str, secret_key: Option<&str>) -> StripeCheckoutStrategy {
        let config = StripeConfig::new(secret_key, Some("whsec_test")).with_api_base_url(base_url);
        StripeCheckoutStrategy::new(config, CheckoutPolicy::default()).unwrap()
    }

    fn sample_request() -> CheckoutRequest {
        CheckoutRequest::new("https://shop.example/success", "https://shop.example/cancel")
            .with_item("price_shirt", 2)
            .with_item("price_mug", 1)
            .with_email("buyer@example.com")
            .with_metadata("cart_id", "cart_42")
    }

    #[test]
    fn test_form_params_follow_policy() {
        let params = strategy("http://unused", Some("sk_test_1")).build_form_params(&sample_request());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("payment_method_types[0]"), Some("card"));
        assert_eq!(get("payment_method_types[1]"), Some("paypal"));
        assert_eq!(get("shipping_address_collection[allowed_countries][0]"), Some("US"));
        assert_eq!(get("shipping_address_collection[allowed_countries][10]"), Some("CH"));
        assert_eq!(get("billing_address_collection"), Some("required"));
        assert_eq!(get("customer_email"), Some("buyer@example.com"));
        assert_eq!(get("line_items[0][price]"), Some("price_shirt"));
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("line_items[1][price]"), Some("price_mug"));
        assert_eq!(get("metadata[cart_id]"), Some("cart_42"));

        let countries = params
            .iter()
            .filter(|(k, _)| k.starts_with("shipping_address_collection"))
            .count();
        assert_eq!(countries, 11);
    }

    #[test]
    fn test_form_params_without_optional_fields() {
        let request = CheckoutRequest::new("https://a.example/ok", "https://a.example/no");
        let params = strategy("http://unused", Some("sk_test_1")).build_form_params(&request);

        assert!(params.iter().all(|(k, _)| k != "customer_email"));
        assert!(params.iter().all(|(k, _)| !k.starts_with("line_items")));
        assert!(params.iter().all(|(k, _)| !k.starts_with("metadata")));
    }

    #[test]
    fn test_custom_policy() {
        let policy = CheckoutPolicy {
            payment_method_types: vec![PaymentMethodType::Card],
            allowed_countries: vec![CountryCode::new("SE").unwrap()],
            ..CheckoutPolicy::default()
        };
        let config = StripeConfig::new(Some("sk_test_1"), None);
        let strategy = StripeCheckoutStrategy::new(config, policy).unwrap();

        let params = strategy.build_form_params(&sample_request());

        assert!(params.contains(&("payment_method_types[0]".to_string(), "card".to_string())));
        assert!(params.iter().all(|(k, _)| k != "payment_method_types[1]"));
        assert!(params.contains(&(
            "shipping_address_collection[allowed_countries][0]".to_string(),
            "SE".to_string()
        )));
    }

    #[tokio::test]
    async fn test_create_checkout_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_shirt"))
            .and(body_string_contains("metadata%5Bcart_id%5D=cart_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "object": "checkout.session",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "amount_total": 4500,
                "currency": "usd",
                "expires_at": 1_900_000_000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = strategy(&server.uri(), Some("sk_test_abc"))
            .create_checkout(&sample_request())
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.checkout_url, "https://checkout.stripe.com/c/pay/cs_test_123");
        assert_eq!(session.amount_total, Some(4500));
        assert_eq!(session.currency.as_deref(), Some("usd"));
        assert!(session.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_create_checkout_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "No such price: 'price_shirt'", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = strategy(&server.uri(), Some("sk_test_abc"))
            .create_checkout(&sample_request())
            .await
            .unwrap_err();

        match err {
            PaymentError::ProviderError { provider, message } => {
                assert_eq!(provider, "stripe");
                assert!(message.contains("400"));
                assert!(message.contains("No such price"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_secret_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = strategy(&server.uri(), None)
            .create_checkout(&sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Configuration(_)));
    }

    #[test]
    fn test_ensure_checkout_ready() {
        assert!(matches!(
            strategy("http://127.0.0.1:1", None).ensure_checkout_ready(),
            Err(PaymentError::Configuration(_))
        ));
        assert!(strategy("http://127.0.0.1:1", Some("sk_test_abc"))
            .ensure_checkout_ready()
            .is_ok());
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = strategy(&server.uri(), Some("sk_test_abc"))
            .create_checkout(&sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Serialization(_)));
    }
}
