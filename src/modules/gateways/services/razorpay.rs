use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use super::gateway_trait::{CheckoutGateway, GatewayOrder, OrderRequest};
use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected callback signature:
/// hex(HMAC-SHA256(secret, order_id + "|" + payment_id)).
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Razorpay payment gateway client
///
/// Orders API: https://razorpay.com/docs/api/orders/
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayClient {
    /// # Arguments
    /// * `key_id` - Razorpay key id (from RAZORPAY_KEY_ID env var)
    /// * `key_secret` - Razorpay key secret; also signs callbacks
    /// * `base_url` - API base URL (defaults to production)
    pub fn new(key_id: String, key_secret: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            key_id,
            key_secret,
            base_url: base_url.unwrap_or_else(|| "https://api.razorpay.com".to_string()),
        }
    }
}

#[async_trait]
impl CheckoutGateway for RazorpayClient {
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder> {
        let url = format!("{}/v1/orders", self.base_url);

        let body = json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "receipt": request.receipt,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::gateway(format!(
                        "Razorpay gateway unavailable: {} ({})",
                        if e.is_timeout() {
                            "timeout"
                        } else {
                            "connection failed"
                        },
                        e
                    ))
                } else {
                    AppError::gateway(format!("Razorpay API request failed: {}", e))
                }
            })?;

        let status_code = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to read Razorpay response: {}", e)))?;

        if !status_code.is_success() {
            return Err(AppError::gateway(format!(
                "Razorpay API error - HTTP {} ({})",
                status_code.as_u16(),
                response_body
            )));
        }

        let order: RazorpayOrderResponse = serde_json::from_str(&response_body)
            .map_err(|e| AppError::gateway(format!("Failed to parse Razorpay response: {}", e)))?;

        Ok(GatewayOrder {
            order_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or(request.receipt),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        compute_signature(&self.key_secret, order_id, payment_id) == signature
    }

    fn name(&self) -> &str {
        "razorpay"
    }
}

// Razorpay API response structures

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
}
