use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Currency, Result};
use crate::modules::courses::models::Course;

/// Read access to the course catalog
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>>;
}

/// MySQL-backed course repository
pub struct SqlCourseRepository {
    pool: MySqlPool,
}

impl SqlCourseRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for SqlCourseRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, title, price, selling_price, currency, is_active,
                   created_at, updated_at
            FROM courses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch course: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: String,
    title: String,
    price: rust_decimal::Decimal,
    selling_price: rust_decimal::Decimal,
    currency: String,
    is_active: bool,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
}

impl TryFrom<CourseRow> for Course {
    type Error = AppError;

    fn try_from(row: CourseRow) -> Result<Self> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(AppError::Internal)?;

        Ok(Course {
            id: row.id,
            title: row.title,
            price: row.price,
            selling_price: row.selling_price,
            currency,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
