//! Borrows repository: the borrow ledger and its lending transactions

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, BorrowDetails},
        user::Member,
    },
    policy::{BorrowerLedger, LendingError, LendingRules},
};

use super::{books::BooksRepository, members::MembersRepository};

/// Map a unique-index race to the lending outcome it stands for
pub(crate) fn unique_violation_as(err: sqlx::Error, outcome: LendingError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Lending(outcome),
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Active-borrow facts about `member_id` relative to `book_id`
    pub async fn ledger(
        conn: &mut PgConnection,
        member_id: i32,
        book_id: i32,
    ) -> AppResult<BorrowerLedger> {
        let (active_for_book, active_total): (bool, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE book_id = $2) > 0, COUNT(*)
            FROM borrows
            WHERE user_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(conn)
        .await?;

        Ok(BorrowerLedger {
            active_for_book,
            active_total,
        })
    }

    /// Whether `member_id` has a closed borrow of `book_id`
    pub async fn has_returned(conn: &mut PgConnection, member_id: i32, book_id: i32) -> AppResult<bool> {
        let returned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrows
                WHERE user_id = $1 AND book_id = $2 AND returned_at IS NOT NULL
            )
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(conn)
        .await?;
        Ok(returned)
    }

    /// Borrow a copy of `book_id` for `member`.
    ///
    /// The member lock, the book row lock, the ledger read, the policy check,
    /// the insert and the counter update all happen in one transaction; any
    /// early return drops the transaction, which rolls it back.
    pub async fn create(
        &self,
        member: &Member,
        book_id: i32,
        rules: &LendingRules,
    ) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        MembersRepository::lock(&mut tx, member.id).await?;
        let stock = BooksRepository::lock_stock(&mut tx, book_id).await?;
        let ledger = Self::ledger(&mut tx, member.id, book_id).await?;

        let stock = rules.check_borrow(member, stock, ledger)?;

        MembersRepository::upsert(&mut tx, member).await?;

        let borrowed_at = Utc::now();
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, borrowed_at, expected_return_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, book_id, borrowed_at, expected_return_at, returned_at
            "#,
        )
        .bind(member.id)
        .bind(book_id)
        .bind(borrowed_at)
        .bind(rules.due_date(borrowed_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation_as(e, LendingError::DuplicateActiveBorrow))?;

        BooksRepository::write_stock(&mut tx, book_id, stock).await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Close an active borrow of `member` and put the copy back on the shelf.
    ///
    /// Ownership and the active state are checked by the same guarded UPDATE,
    /// so a foreign, unknown or already returned borrow all look alike.
    pub async fn return_borrow(
        &self,
        member: &Member,
        borrow_id: i32,
        rules: &LendingRules,
    ) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        MembersRepository::lock(&mut tx, member.id).await?;

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET returned_at = $1
            WHERE id = $2 AND user_id = $3 AND returned_at IS NULL
            RETURNING id, user_id, book_id, borrowed_at, expected_return_at, returned_at
            "#,
        )
        .bind(Utc::now())
        .bind(borrow_id)
        .bind(member.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LendingError::NotFoundOrAlreadyReturned)?;

        let stock = BooksRepository::lock_stock(&mut tx, borrow.book_id).await?;
        BooksRepository::write_stock(&mut tx, borrow.book_id, rules.check_return(stock)).await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Active and returned borrows of a member, newest first
    pub async fn list_for_member(&self, member_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.user_id, br.book_id, br.borrowed_at,
                   br.expected_return_at, br.returned_at, b.title AS book_title
            FROM borrows br
            JOIN books b ON b.id = br.book_id
            WHERE br.user_id = $1
            ORDER BY br.borrowed_at DESC, br.id DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(rows
            .iter()
            .map(|row| {
                let borrow = Borrow {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    book_id: row.get("book_id"),
                    borrowed_at: row.get("borrowed_at"),
                    expected_return_at: row.get("expected_return_at"),
                    returned_at: row.get("returned_at"),
                };
                BorrowDetails::new(borrow, row.get("book_title"), now)
            })
            .collect())
    }

    /// (currently borrowing, borrowed before) for one member and book
    pub async fn member_book_state(&self, member_id: i32, book_id: i32) -> AppResult<(bool, bool)> {
        let state: (bool, bool) = sqlx::query_as(
            r#"
            SELECT COALESCE(BOOL_OR(returned_at IS NULL), FALSE),
                   COALESCE(BOOL_OR(returned_at IS NOT NULL), FALSE)
            FROM borrows
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(state)
    }
}
