pub mod purchase_service;

pub use purchase_service::{
    InitiatePurchase, InitiatedPurchase, PaymentReceipt, PurchaseService, Verification,
};
