use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::purchases::models::{CoursePurchase, PurchaseStatus};

/// Persistence for course purchases
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn create(&self, purchase: &CoursePurchase) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<CoursePurchase>>;

    /// Purchase originated by a given payment
    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<CoursePurchase>>;

    /// A user's purchase of a course, newest first if several exist
    async fn find_by_course_and_user(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Option<CoursePurchase>>;

    async fn update_status(&self, id: &str, status: PurchaseStatus) -> Result<()>;

    /// EMI purchases, optionally scoped to one user
    async fn list_emi(&self, user_id: Option<&str>) -> Result<Vec<CoursePurchase>>;
}

/// MySQL-backed purchase repository
pub struct SqlPurchaseRepository {
    pool: MySqlPool,
}

impl SqlPurchaseRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, course_id, user_id, guest_name, guest_email, guest_mobile,
    payment_id, purchase_date, total_amount, is_emi, emi_duration_months,
    status, created_at, updated_at
"#;

#[async_trait]
impl PurchaseRepository for SqlPurchaseRepository {
    async fn create(&self, purchase: &CoursePurchase) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO course_purchases (
                id, course_id, user_id, guest_name, guest_email, guest_mobile,
                payment_id, purchase_date, total_amount, is_emi,
                emi_duration_months, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.course_id)
        .bind(&purchase.user_id)
        .bind(&purchase.guest_name)
        .bind(&purchase.guest_email)
        .bind(&purchase.guest_mobile)
        .bind(&purchase.payment_id)
        .bind(purchase.purchase_date)
        .bind(purchase.total_amount)
        .bind(purchase.is_emi)
        .bind(purchase.emi_duration_months)
        .bind(purchase.status.to_string())
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert purchase: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CoursePurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {} FROM course_purchases WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch purchase: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<CoursePurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {} FROM course_purchases WHERE payment_id = ?",
            SELECT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch purchase: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_course_and_user(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Option<CoursePurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {} FROM course_purchases
            WHERE course_id = ? AND user_id = ?
            ORDER BY purchase_date DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch purchase: {}", e)))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(&self, id: &str, status: PurchaseStatus) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE course_purchases
            SET status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update purchase: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Purchase not found"));
        }

        Ok(())
    }

    async fn list_emi(&self, user_id: Option<&str>) -> Result<Vec<CoursePurchase>> {
        let rows = match user_id {
            Some(uid) => {
                sqlx::query_as::<_, PurchaseRow>(&format!(
                    r#"
                    SELECT {} FROM course_purchases
                    WHERE is_emi = TRUE AND user_id = ?
                    ORDER BY purchase_date DESC
                    "#,
                    SELECT_COLUMNS
                ))
                .bind(uid)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PurchaseRow>(&format!(
                    r#"
                    SELECT {} FROM course_purchases
                    WHERE is_emi = TRUE
                    ORDER BY purchase_date DESC
                    "#,
                    SELECT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Internal(format!("Failed to list purchases: {}", e)))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    course_id: String,
    user_id: Option<String>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    guest_mobile: Option<String>,
    payment_id: String,
    purchase_date: chrono::NaiveDateTime,
    total_amount: rust_decimal::Decimal,
    is_emi: bool,
    emi_duration_months: Option<i32>,
    status: String,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
}

impl TryFrom<PurchaseRow> for CoursePurchase {
    type Error = AppError;

    fn try_from(row: PurchaseRow) -> Result<Self> {
        let status: PurchaseStatus = row.status.try_into().map_err(AppError::Internal)?;

        Ok(CoursePurchase {
            id: row.id,
            course_id: row.course_id,
            user_id: row.user_id,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            guest_mobile: row.guest_mobile,
            payment_id: row.payment_id,
            purchase_date: row.purchase_date,
            total_amount: row.total_amount,
            is_emi: row.is_emi,
            emi_duration_months: row.emi_duration_months,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
