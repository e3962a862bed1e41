pub mod course_purchase;

pub use course_purchase::{CoursePurchase, PurchaseStatus};
