//! Payment gateway.
//!
//! Orders hold money through an external gateway. The trait keeps the order
//! service testable; [`PaypalGateway`] talks to the PayPal Orders v2 API and
//! [`NoOpGateway`] stands in where no gateway is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tienda_common::{AppError, AppResult, PaypalConfig};

/// A payment hold created at checkout.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Gateway-side order ID, stored on the order for capture/cancel.
    pub id: String,
    /// Raw gateway response, kept on the order for audit.
    pub raw: serde_json::Value,
}

/// The outcome of capturing a payment.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// Gateway-side status string (e.g. `COMPLETED`).
    pub status: String,
    /// Raw gateway response.
    pub raw: serde_json::Value,
}

/// A payment gateway the order service can charge through.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment hold for `amount` in `currency`.
    async fn create_intent(&self, amount: Decimal, currency: &str) -> AppResult<PaymentIntent>;

    /// Capture a previously created hold.
    async fn capture(&self, intent_id: &str) -> AppResult<CaptureResult>;

    /// Cancel a previously created hold.
    async fn cancel(&self, intent_id: &str) -> AppResult<()>;
}

/// Shared handle to the configured gateway.
pub type PaymentService = Arc<dyn PaymentGateway>;

/// PayPal Orders v2 gateway.
pub struct PaypalGateway {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    brand_name: String,
    return_url: String,
    cancel_url: String,
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

impl PaypalGateway {
    /// Create a PayPal gateway. `server_url` is the public URL buyers return
    /// to after approving or cancelling.
    pub fn new(config: &PaypalConfig, server_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let server_url = server_url.trim_end_matches('/');

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            brand_name: config.brand_name.clone(),
            return_url: format!("{server_url}/checkout/success"),
            cancel_url: format!("{server_url}/checkout/cancel"),
        })
    }

    /// Fetch a short-lived OAuth2 access token via client credentials.
    async fn access_token(&self) -> AppResult<String> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayPal token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "PayPal token request returned {}",
                response.status()
            )));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Invalid PayPal token response: {e}")))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    async fn create_intent(&self, amount: Decimal, currency: &str) -> AppResult<PaymentIntent> {
        let token = self.access_token().await?;

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": currency,
                    "value": amount.round_dp(2).to_string(),
                },
            }],
            "application_context": {
                "brand_name": self.brand_name,
                "return_url": self.return_url,
                "cancel_url": self.cancel_url,
            },
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayPal order creation failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "PayPal order creation returned {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Invalid PayPal order response: {e}")))?;

        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Gateway("PayPal order response missing id".to_string()))?
            .to_string();

        tracing::info!(intent_id = %id, "Created PayPal order");
        Ok(PaymentIntent { id, raw })
    }

    async fn capture(&self, intent_id: &str) -> AppResult<CaptureResult> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{intent_id}/capture",
                self.base_url
            ))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayPal capture failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "PayPal capture returned {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Invalid PayPal capture response: {e}")))?;

        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        tracing::info!(intent_id = %intent_id, status = %status, "Captured PayPal order");
        Ok(CaptureResult { status, raw })
    }

    async fn cancel(&self, intent_id: &str) -> AppResult<()> {
        let token = self.access_token().await?;

        let response = self
            .client
            .delete(format!("{}/v1/checkout/orders/{intent_id}", self.base_url))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayPal cancel failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "PayPal cancel returned {}",
                response.status()
            )));
        }

        tracing::info!(intent_id = %intent_id, "Cancelled PayPal order");
        Ok(())
    }
}

/// Gateway used when no payment provider is configured. Intents are granted
/// locally so checkout flows stay exercisable in development.
pub struct NoOpGateway;

#[async_trait]
impl PaymentGateway for NoOpGateway {
    async fn create_intent(&self, amount: Decimal, currency: &str) -> AppResult<PaymentIntent> {
        let id = format!("noop_{}", uuid::Uuid::new_v4().simple());
        tracing::debug!(intent_id = %id, %amount, currency, "No-op payment intent");
        Ok(PaymentIntent {
            id: id.clone(),
            raw: json!({ "id": id, "status": "CREATED" }),
        })
    }

    async fn capture(&self, intent_id: &str) -> AppResult<CaptureResult> {
        Ok(CaptureResult {
            status: "COMPLETED".to_string(),
            raw: json!({ "id": intent_id, "status": "COMPLETED" }),
        })
    }

    async fn cancel(&self, _intent_id: &str) -> AppResult<()> {
        Ok(())
    }
}
