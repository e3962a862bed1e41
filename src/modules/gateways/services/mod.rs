pub mod gateway_trait;
pub mod razorpay;

pub use gateway_trait::{CheckoutGateway, GatewayOrder, OrderRequest};
pub use razorpay::{compute_signature, RazorpayClient};
