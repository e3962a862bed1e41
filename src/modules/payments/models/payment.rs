use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};

/// One money-movement event: a full purchase, the first charge of an EMI
/// plan, or a later installment charge.
///
/// `amount` always holds the total course price, even when the event only
/// charges a single installment; the amount actually collected for an EMI
/// event is `monthly_emi_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub student_name: String,
    pub email: String,
    pub mobile: String,
    pub course_id: String,
    /// None for guest checkouts
    pub user_id: Option<String>,
    /// Total course price owed
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    /// Gateway used for online methods
    pub gateway: String,
    pub status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub is_emi: bool,
    pub emi_duration_months: Option<i32>,
    /// Per-month charge when `is_emi`
    pub monthly_emi_amount: Option<Decimal>,
    pub emi_status: Option<EmiStatus>,
    pub installments_completed: i32,
    /// Set on derivative payments created to charge one installment
    pub installment_id: Option<String>,
    pub receipt_number: String,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid payment status: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmiStatus {
    Active,
    Completed,
    Late,
    Cancelled,
}

impl EmiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Late => "LATE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for EmiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for EmiStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "LATE" => Ok(Self::Late),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid EMI status: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Cash,
    Cheque,
}

impl PaymentMethod {
    /// CASH and CHEQUE are collected offline and never touch the gateway
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Cash | Self::Cheque)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "CARD",
            Self::Upi => "UPI",
            Self::NetBanking => "NET_BANKING",
            Self::Cash => "CASH",
            Self::Cheque => "CHEQUE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "CARD" => Ok(Self::Card),
            "UPI" => Ok(Self::Upi),
            "NET_BANKING" => Ok(Self::NetBanking),
            "CASH" => Ok(Self::Cash),
            "CHEQUE" => Ok(Self::Cheque),
            _ => Err(format!("Invalid payment method: {}", value)),
        }
    }
}

/// Buyer details captured at checkout
#[derive(Debug, Clone)]
pub struct BuyerInfo {
    pub student_name: String,
    pub email: String,
    pub mobile: String,
    pub user_id: Option<String>,
}

impl Payment {
    /// Create a pending payment for a purchase-initiation event
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer: BuyerInfo,
        course_id: String,
        amount: Decimal,
        currency: Currency,
        payment_method: PaymentMethod,
        is_emi: bool,
        emi_duration_months: Option<i32>,
        monthly_emi_amount: Option<Decimal>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();

        Self {
            id: Uuid::new_v4().to_string(),
            student_name: buyer.student_name,
            email: buyer.email,
            mobile: buyer.mobile,
            course_id,
            user_id: buyer.user_id,
            amount,
            currency,
            payment_method,
            gateway: "razorpay".to_string(),
            status: PaymentStatus::Pending,
            razorpay_order_id: None,
            razorpay_payment_id: None,
            razorpay_signature: None,
            is_emi,
            emi_duration_months,
            monthly_emi_amount,
            emi_status: if is_emi { Some(EmiStatus::Active) } else { None },
            installments_completed: 0,
            installment_id: None,
            receipt_number: Self::generate_receipt_number(),
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a derivative payment charging a single installment.
    ///
    /// `amount` still carries the total course price; the installment's
    /// due amount goes into `monthly_emi_amount`.
    pub fn for_installment(original: &Payment, installment_id: &str, amount_due: Decimal) -> Self {
        let now = chrono::Utc::now().naive_utc();

        Self {
            id: Uuid::new_v4().to_string(),
            student_name: original.student_name.clone(),
            email: original.email.clone(),
            mobile: original.mobile.clone(),
            course_id: original.course_id.clone(),
            user_id: original.user_id.clone(),
            amount: original.amount,
            currency: original.currency,
            payment_method: original.payment_method,
            gateway: original.gateway.clone(),
            status: PaymentStatus::Pending,
            razorpay_order_id: None,
            razorpay_payment_id: None,
            razorpay_signature: None,
            is_emi: true,
            emi_duration_months: original.emi_duration_months,
            monthly_emi_amount: Some(amount_due),
            emi_status: Some(EmiStatus::Active),
            installments_completed: 0,
            installment_id: Some(installment_id.to_string()),
            receipt_number: Self::generate_receipt_number(),
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn generate_receipt_number() -> String {
        // Short unique receipt: RCPT-<12 hex chars of a v4 uuid>
        let uuid = Uuid::new_v4().simple().to_string();
        format!("RCPT-{}", &uuid[..12].to_uppercase())
    }

    /// Record successful gateway verification
    pub fn mark_success(&mut self, payment_id: String, signature: String) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(AppError::validation(format!(
                "Payment {} cannot transition from {} to SUCCESS",
                self.id, self.status
            )));
        }

        self.status = PaymentStatus::Success;
        self.razorpay_payment_id = Some(payment_id);
        self.razorpay_signature = Some(signature);
        self.paid_at = Some(chrono::Utc::now().naive_utc());
        self.updated_at = chrono::Utc::now().naive_utc();

        Ok(())
    }

    /// Record failed gateway verification. A payment fails at most once
    /// and a settled one is never overwritten; returns whether the
    /// transition happened.
    pub fn mark_failed(&mut self) -> bool {
        if self.status != PaymentStatus::Pending {
            return false;
        }

        self.status = PaymentStatus::Failed;
        self.updated_at = chrono::Utc::now().naive_utc();
        true
    }

    /// Attach the gateway order created for this payment
    pub fn attach_order(&mut self, order_id: String) {
        self.razorpay_order_id = Some(order_id);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Amount actually charged for this event
    pub fn charge_amount(&self) -> Decimal {
        if self.is_emi {
            self.monthly_emi_amount.unwrap_or(self.amount)
        } else {
            self.amount
        }
    }
}
