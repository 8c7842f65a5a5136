//! Members repository
//!
//! Members are owned by the identity provider; the local `users` table only
//! mirrors what borrows and reviews reference.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{error::AppResult, models::user::Member};

/// Advisory lock class for per-member lending transactions
const MEMBER_LOCK_CLASS: i32 = 0x4c44;

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Serialize lending transactions of one member until commit/rollback.
    ///
    /// Every lending transaction takes this lock first, before any row lock.
    pub async fn lock(conn: &mut PgConnection, member_id: i32) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(MEMBER_LOCK_CLASS)
            .bind(member_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Mirror the identity provider's record of `member`
    pub async fn upsert(conn: &mut PgConnection, member: &Member) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, is_staff)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username, is_staff = EXCLUDED.is_staff
            "#,
        )
        .bind(member.id)
        .bind(&member.username)
        .bind(member.is_staff)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Count non-staff members
    pub async fn count_readers(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE NOT is_staff")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
