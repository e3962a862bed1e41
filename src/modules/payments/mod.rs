pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{BuyerInfo, EmiStatus, Payment, PaymentMethod, PaymentStatus};
pub use repositories::{PaymentRepository, SqlPaymentRepository};
pub use services::PurchaseService;
