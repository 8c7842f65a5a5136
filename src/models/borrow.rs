//! Borrow ledger records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrow row. `returned_at` unset means the borrow is active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub expected_return_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Borrow {
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_returned() && self.expected_return_at < now
    }
}

/// Borrow with its book, for the "my books" page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub borrowed_at: DateTime<Utc>,
    pub expected_return_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

impl BorrowDetails {
    pub fn new(borrow: Borrow, book_title: String, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: borrow.is_overdue(now),
            id: borrow.id,
            book_id: borrow.book_id,
            book_title,
            borrowed_at: borrow.borrowed_at,
            expected_return_at: borrow.expected_return_at,
            returned_at: borrow.returned_at,
        }
    }
}

/// Active borrows and history of a member, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyBooks {
    pub active: Vec<BorrowDetails>,
    pub history: Vec<BorrowDetails>,
}

impl MyBooks {
    pub fn split(borrows: Vec<BorrowDetails>) -> Self {
        let (history, active) = borrows.into_iter().partition(|b| b.returned_at.is_some());
        Self { active, history }
    }
}
