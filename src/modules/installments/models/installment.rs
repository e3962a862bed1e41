use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled due date within an EMI plan.
///
/// All installments of a plan are created together at purchase initiation
/// and transition PENDING -> PAID independently, each through its own
/// gateway charge. The `amount_due` values of a plan sum exactly to the
/// owning payment's total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiInstallment {
    pub id: String,
    /// The original purchase-initiation payment, never a derivative one
    pub payment_id: String,
    /// None for plans created before purchases were linked
    pub course_purchase_id: Option<String>,
    pub user_id: Option<String>,
    /// 1-based, unique within a payment
    pub installment_number: i32,
    pub amount_due: Decimal,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    /// Gateway payment id once paid
    pub payment_ref_id: Option<String>,
    pub paid_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Late,
    Failed,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Late => "LATE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for InstallmentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "LATE" => Ok(Self::Late),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Invalid installment status: {}", value)),
        }
    }
}

impl EmiInstallment {
    pub fn new(
        payment_id: String,
        course_purchase_id: Option<String>,
        user_id: Option<String>,
        installment_number: i32,
        amount_due: Decimal,
        due_date: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();

        Self {
            id: Uuid::new_v4().to_string(),
            payment_id,
            course_purchase_id,
            user_id,
            installment_number,
            amount_due,
            due_date,
            status: InstallmentStatus::Pending,
            payment_ref_id: None,
            paid_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An unpaid installment past its due date is considered late
    pub fn is_past_due(&self) -> bool {
        if self.status == InstallmentStatus::Paid {
            return false;
        }

        let today = chrono::Utc::now().date_naive();
        self.due_date < today
    }
}
