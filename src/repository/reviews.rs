//! Reviews repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        review::{Review, ReviewDetails},
        user::Member,
    },
    policy::{LendingError, LendingRules, ReviewLedger},
};

use super::{borrows::{unique_violation_as, BorrowsRepository}, members::MembersRepository};

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record the review of `member` for `book_id`, if the lending rules allow it
    pub async fn create(
        &self,
        member: &Member,
        book_id: i32,
        stars: i64,
        comment: Option<&str>,
        rules: &LendingRules,
    ) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        MembersRepository::lock(&mut tx, member.id).await?;

        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let borrowed_before = BorrowsRepository::has_returned(&mut tx, member.id, book_id).await?;
        let already_reviewed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(member.id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let stars = rules.check_review(
            member,
            ReviewLedger {
                borrowed_before,
                already_reviewed,
            },
            stars,
        )?;

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, book_id, stars, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, book_id, stars, comment, created_at
            "#,
        )
        .bind(member.id)
        .bind(book_id)
        .bind(stars.value())
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, LendingError::AlreadyReviewed))?;

        tx.commit().await?;
        Ok(review)
    }

    /// Reviews of a book with reviewer names, newest first
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<ReviewDetails>> {
        let reviews = sqlx::query_as::<_, ReviewDetails>(
            r#"
            SELECT r.id, u.username, r.stars, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }
}
