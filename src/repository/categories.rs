//! Categories repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryWithCount},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, icon FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    /// List categories ordered by name, with their book counts
    pub async fn list_with_counts(&self) -> AppResult<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.icon, COUNT(b.id) AS book_count
            FROM categories c
            LEFT JOIN books b ON b.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
