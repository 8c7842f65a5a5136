//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    /// Icon class name used by the front end, e.g. "bi bi-book"
    pub icon: Option<String>,
}

/// Category with the number of books filed under it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub book_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryBooks {
    pub category: Category,
    pub books: Vec<BookShort>,
}
