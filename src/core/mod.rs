pub mod currency;
pub mod error;
pub mod response;

pub use currency::Currency;
pub use error::{AppError, Result};
