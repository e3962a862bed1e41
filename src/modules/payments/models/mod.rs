pub mod payment;

pub use payment::{BuyerInfo, EmiStatus, Payment, PaymentMethod, PaymentStatus};
