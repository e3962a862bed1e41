pub mod purchase_repository;

pub use purchase_repository::{PurchaseRepository, SqlPurchaseRepository};
