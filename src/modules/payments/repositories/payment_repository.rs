use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Currency, Result};
use crate::modules::payments::models::{EmiStatus, Payment, PaymentMethod, PaymentStatus};

/// Persistence for payment events
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>>;

    /// Payment carrying a given gateway order id
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>>;

    /// Persist the mutable fields of a payment (status, gateway ids,
    /// EMI progress, timestamps)
    async fn update(&self, payment: &Payment) -> Result<()>;
}

/// MySQL-backed payment repository
pub struct SqlPaymentRepository {
    pool: MySqlPool,
}

impl SqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, student_name, email, mobile, course_id, user_id, amount, currency,
    payment_method, gateway, status, razorpay_order_id, razorpay_payment_id,
    razorpay_signature, is_emi, emi_duration_months, monthly_emi_amount,
    emi_status, installments_completed, installment_id, receipt_number,
    paid_at, created_at, updated_at
"#;

#[async_trait]
impl PaymentRepository for SqlPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, student_name, email, mobile, course_id, user_id, amount,
                currency, payment_method, gateway, status, razorpay_order_id,
                razorpay_payment_id, razorpay_signature, is_emi,
                emi_duration_months, monthly_emi_amount, emi_status,
                installments_completed, installment_id, receipt_number,
                paid_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.student_name)
        .bind(&payment.email)
        .bind(&payment.mobile)
        .bind(&payment.course_id)
        .bind(&payment.user_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(payment.payment_method.to_string())
        .bind(&payment.gateway)
        .bind(payment.status.to_string())
        .bind(&payment.razorpay_order_id)
        .bind(&payment.razorpay_payment_id)
        .bind(&payment.razorpay_signature)
        .bind(payment.is_emi)
        .bind(payment.emi_duration_months)
        .bind(payment.monthly_emi_amount)
        .bind(payment.emi_status.map(|s| s.to_string()))
        .bind(payment.installments_completed)
        .bind(&payment.installment_id)
        .bind(&payment.receipt_number)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert payment: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payment: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE razorpay_order_id = ?",
            SELECT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payment: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE payments
            SET
                status = ?,
                razorpay_order_id = ?,
                razorpay_payment_id = ?,
                razorpay_signature = ?,
                emi_status = ?,
                installments_completed = ?,
                paid_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.status.to_string())
        .bind(&payment.razorpay_order_id)
        .bind(&payment.razorpay_payment_id)
        .bind(&payment.razorpay_signature)
        .bind(payment.emi_status.map(|s| s.to_string()))
        .bind(payment.installments_completed)
        .bind(payment.paid_at)
        .bind(payment.updated_at)
        .bind(&payment.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update payment: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Payment not found"));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    student_name: String,
    email: String,
    mobile: String,
    course_id: String,
    user_id: Option<String>,
    amount: rust_decimal::Decimal,
    currency: String,
    payment_method: String,
    gateway: String,
    status: String,
    razorpay_order_id: Option<String>,
    razorpay_payment_id: Option<String>,
    razorpay_signature: Option<String>,
    is_emi: bool,
    emi_duration_months: Option<i32>,
    monthly_emi_amount: Option<rust_decimal::Decimal>,
    emi_status: Option<String>,
    installments_completed: i32,
    installment_id: Option<String>,
    receipt_number: String,
    paid_at: Option<chrono::NaiveDateTime>,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let currency: Currency = row.currency.parse().map_err(AppError::Internal)?;
        let payment_method: PaymentMethod =
            row.payment_method.try_into().map_err(AppError::Internal)?;
        let status: PaymentStatus = row.status.try_into().map_err(AppError::Internal)?;
        let emi_status: Option<EmiStatus> = row
            .emi_status
            .map(|s| s.try_into().map_err(AppError::Internal))
            .transpose()?;

        Ok(Payment {
            id: row.id,
            student_name: row.student_name,
            email: row.email,
            mobile: row.mobile,
            course_id: row.course_id,
            user_id: row.user_id,
            amount: row.amount,
            currency,
            payment_method,
            gateway: row.gateway,
            status,
            razorpay_order_id: row.razorpay_order_id,
            razorpay_payment_id: row.razorpay_payment_id,
            razorpay_signature: row.razorpay_signature,
            is_emi: row.is_emi,
            emi_duration_months: row.emi_duration_months,
            monthly_emi_amount: row.monthly_emi_amount,
            emi_status,
            installments_completed: row.installments_completed,
            installment_id: row.installment_id,
            receipt_number: row.receipt_number,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
