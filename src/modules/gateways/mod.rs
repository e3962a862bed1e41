pub mod services;

pub use services::{CheckoutGateway, GatewayOrder, OrderRequest, RazorpayClient};
