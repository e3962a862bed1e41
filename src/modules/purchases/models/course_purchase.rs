use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ownership of a course by a user or guest.
///
/// Created PENDING at purchase initiation; ACTIVE once the first payment
/// verifies on an EMI plan; COMPLETED when every installment is paid (or
/// immediately for full payments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursePurchase {
    pub id: String,
    pub course_id: String,
    /// None for guest checkouts
    pub user_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_mobile: Option<String>,
    /// Originating payment (the purchase-initiation Payment, not a
    /// per-installment one)
    pub payment_id: String,
    pub purchase_date: NaiveDateTime,
    pub total_amount: Decimal,
    pub is_emi: bool,
    pub emi_duration_months: Option<i32>,
    pub status: PurchaseStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PurchaseStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid purchase status: {}", value)),
        }
    }
}

impl CoursePurchase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        course_id: String,
        user_id: Option<String>,
        guest_name: Option<String>,
        guest_email: Option<String>,
        guest_mobile: Option<String>,
        payment_id: String,
        total_amount: Decimal,
        is_emi: bool,
        emi_duration_months: Option<i32>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();

        Self {
            id: Uuid::new_v4().to_string(),
            course_id,
            user_id,
            guest_name,
            guest_email,
            guest_mobile,
            payment_id,
            purchase_date: now,
            total_amount,
            is_emi,
            emi_duration_months,
            status: PurchaseStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
