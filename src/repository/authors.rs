//! Authors repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorWithCount},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT id, name, bio FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// List authors ordered by name, with their book counts
    pub async fn list_with_counts(&self) -> AppResult<Vec<AuthorWithCount>> {
        let rows = sqlx::query_as::<_, AuthorWithCount>(
            r#"
            SELECT a.id, a.name, a.bio, COUNT(b.id) AS book_count
            FROM authors a
            LEFT JOIN books b ON b.author_id = a.id
            GROUP BY a.id
            ORDER BY a.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
