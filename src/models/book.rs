//! Book model and catalog query types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, Row};
use utoipa::{IntoParams, ToSchema};

use super::{author::Author, category::Category, review::ReviewDetails};

/// Shelf status shown next to a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn from_available_copies(available_copies: i32) -> Self {
        if available_copies > 0 {
            BookStatus::Available
        } else {
            BookStatus::Borrowed
        }
    }
}

/// Catalog sort orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookSort {
    #[default]
    Newest,
    Oldest,
    /// Highest average rating first
    Rated,
}

impl BookSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            BookSort::Newest => "b.created_at DESC",
            BookSort::Oldest => "b.created_at ASC",
            BookSort::Rated => "AVG(r.stars) DESC NULLS LAST, b.created_at DESC",
        }
    }
}

/// Catalog listing query
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Case-insensitive match on title or author name
    pub q: Option<String>,
    /// Category id
    pub category: Option<i32>,
    pub sort: Option<BookSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub const DEFAULT_PER_PAGE: i64 = 9;

impl BookQuery {
    /// Trimmed search text, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

/// Book as listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub author_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub publication_year: i32,
    pub language: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: BookStatus,
    /// Mean of all review stars, one decimal, 0 without reviews
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_rating: Decimal,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

impl BookShort {
    /// Build from a row produced by the shared catalog projection
    pub fn from_row(row: &PgRow) -> Self {
        let available_copies: i32 = row.get("available_copies");
        Self {
            id: row.get("id"),
            title: row.get("title"),
            author_id: row.get("author_id"),
            author_name: row.get("author_name"),
            category_id: row.get("category_id"),
            category_name: row.get("category_name"),
            publication_year: row.get("publication_year"),
            language: row.get("language"),
            total_copies: row.get("total_copies"),
            available_copies,
            status: BookStatus::from_available_copies(available_copies),
            avg_rating: row.get("avg_rating"),
            review_count: row.get("review_count"),
            created_at: row.get("created_at"),
        }
    }
}

/// Borrowing state of the current member for one book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ViewerStatus {
    pub can_borrow: bool,
    pub currently_borrowed_by_user: bool,
    pub borrowed_before: bool,
}

impl ViewerStatus {
    pub fn new(available: bool, currently_borrowed_by_user: bool, borrowed_before: bool) -> Self {
        Self {
            can_borrow: available && !currently_borrowed_by_user,
            currently_borrowed_by_user,
            borrowed_before,
        }
    }
}

/// Full book page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub author: Author,
    pub category: Category,
    pub publication_year: i32,
    pub pages: i32,
    pub language: String,
    pub description: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: BookStatus,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_rating: Decimal,
    pub created_at: DateTime<Utc>,
    /// Newest first
    pub reviews: Vec<ReviewDetails>,
    /// Present for authenticated members only
    pub viewer: Option<ViewerStatus>,
}
