use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::installments::models::{EmiInstallment, InstallmentStatus};

/// Persistence for EMI installments
#[async_trait]
pub trait InstallmentRepository: Send + Sync {
    /// Insert an entire schedule in one transaction
    async fn create_batch(&self, installments: &[EmiInstallment]) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<EmiInstallment>>;

    /// All installments of the original payment, ordered by number
    async fn find_by_payment(&self, payment_id: &str) -> Result<Vec<EmiInstallment>>;

    /// All installments of a course purchase, ordered by number
    async fn find_by_purchase(&self, purchase_id: &str) -> Result<Vec<EmiInstallment>>;

    /// Atomically flip an unpaid (PENDING or LATE) installment to PAID,
    /// recording the gateway payment id and paid date. Returns false when
    /// the installment was already settled, so a concurrent
    /// double-submission loses cleanly.
    async fn mark_paid_if_unpaid(
        &self,
        id: &str,
        payment_ref_id: &str,
        paid_date: NaiveDateTime,
    ) -> Result<bool>;

    /// Flip an unpaid installment to LATE
    async fn mark_late(&self, id: &str) -> Result<()>;

    /// Count of PAID installments for a payment
    async fn count_paid(&self, payment_id: &str) -> Result<i32>;
}

/// MySQL-backed installment repository
pub struct SqlInstallmentRepository {
    pool: MySqlPool,
}

impl SqlInstallmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        installment: &EmiInstallment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO emi_installments (
                id, payment_id, course_purchase_id, user_id,
                installment_number, amount_due, due_date, status,
                payment_ref_id, paid_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&installment.id)
        .bind(&installment.payment_id)
        .bind(&installment.course_purchase_id)
        .bind(&installment.user_id)
        .bind(installment.installment_number)
        .bind(installment.amount_due)
        .bind(installment.due_date)
        .bind(installment.status.to_string())
        .bind(&installment.payment_ref_id)
        .bind(installment.paid_date)
        .bind(installment.created_at)
        .bind(installment.updated_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert installment: {}", e)))?;

        Ok(())
    }
}

const SELECT_COLUMNS: &str = r#"
    id, payment_id, course_purchase_id, user_id, installment_number,
    amount_due, due_date, status, payment_ref_id, paid_date,
    created_at, updated_at
"#;

#[async_trait]
impl InstallmentRepository for SqlInstallmentRepository {
    async fn create_batch(&self, installments: &[EmiInstallment]) -> Result<()> {
        if installments.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        for installment in installments {
            self.insert_with_tx(&mut tx, installment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EmiInstallment>> {
        let row = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {} FROM emi_installments WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch installment: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_payment(&self, payment_id: &str) -> Result<Vec<EmiInstallment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            r#"
            SELECT {} FROM emi_installments
            WHERE payment_id = ?
            ORDER BY installment_number ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch installments: {}", e)))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_by_purchase(&self, purchase_id: &str) -> Result<Vec<EmiInstallment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            r#"
            SELECT {} FROM emi_installments
            WHERE course_purchase_id = ?
            ORDER BY installment_number ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch installments: {}", e)))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn mark_paid_if_unpaid(
        &self,
        id: &str,
        payment_ref_id: &str,
        paid_date: NaiveDateTime,
    ) -> Result<bool> {
        // Conditional update, not read-then-write: of two concurrent
        // verifications only one row update can succeed.
        let rows_affected = sqlx::query(
            r#"
            UPDATE emi_installments
            SET status = 'PAID', payment_ref_id = ?, paid_date = ?, updated_at = ?
            WHERE id = ? AND status IN ('PENDING', 'LATE')
            "#,
        )
        .bind(payment_ref_id)
        .bind(paid_date)
        .bind(chrono::Utc::now().naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to mark installment paid: {}", e)))?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn mark_late(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE emi_installments
            SET status = 'LATE', updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to mark installment late: {}", e)))?;

        Ok(())
    }

    async fn count_paid(&self, payment_id: &str) -> Result<i32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM emi_installments
            WHERE payment_id = ? AND status = 'PAID'
            "#,
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to count installments: {}", e)))?;

        Ok(count as i32)
    }
}

#[derive(sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    payment_id: String,
    course_purchase_id: Option<String>,
    user_id: Option<String>,
    installment_number: i32,
    amount_due: rust_decimal::Decimal,
    due_date: chrono::NaiveDate,
    status: String,
    payment_ref_id: Option<String>,
    paid_date: Option<chrono::NaiveDateTime>,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
}

impl TryFrom<InstallmentRow> for EmiInstallment {
    type Error = AppError;

    fn try_from(row: InstallmentRow) -> Result<Self> {
        let status: InstallmentStatus = row.status.try_into().map_err(AppError::Internal)?;

        Ok(EmiInstallment {
            id: row.id,
            payment_id: row.payment_id,
            course_purchase_id: row.course_purchase_id,
            user_id: row.user_id,
            installment_number: row.installment_number,
            amount_due: row.amount_due,
            due_date: row.due_date,
            status,
            payment_ref_id: row.payment_ref_id,
            paid_date: row.paid_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
