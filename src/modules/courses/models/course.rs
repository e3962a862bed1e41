use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::Currency;

/// Course catalog entry. Purchases price against `selling_price`; the rest
/// of the catalog lives in the admin CRUD service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    /// Listed price before discount
    pub price: Decimal,
    /// Price actually charged at purchase time
    pub selling_price: Decimal,
    pub currency: Currency,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
