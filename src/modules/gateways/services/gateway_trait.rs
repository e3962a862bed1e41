use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Payment gateway client for creating checkout orders and verifying
/// payment-completion callbacks.
///
/// Injected into the orchestrator so tests can run against a fake.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Reserve an order with the provider before collecting payment
    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder>;

    /// Check that a payment-completion callback was signed by the
    /// provider. Exact case-sensitive comparison; a mismatch is a normal
    /// outcome, not an error.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Gateway name
    fn name(&self) -> &str;
}

/// Order creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Amount in minor currency units (paisa/cents)
    pub amount_minor: i64,
    pub currency: String,
    /// Merchant receipt reference
    pub receipt: String,
}

/// Provider-issued order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    /// Amount echoed back by the provider, minor units
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}
