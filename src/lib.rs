//! EduPay Course Payment Platform Library
//!
//! Purchase orchestration for a course-selling platform: Razorpay order
//! creation, payment callback verification, EMI installment schedules,
//! and per-installment payment lifecycle.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod state;

// Re-export commonly used types
pub use crate::core::{AppError, Currency, Result};
pub use state::AppState;
