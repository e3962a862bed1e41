pub mod models;
pub mod repositories;

pub use models::{CoursePurchase, PurchaseStatus};
pub use repositories::{PurchaseRepository, SqlPurchaseRepository};
