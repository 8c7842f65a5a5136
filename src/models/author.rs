//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;

/// Author as stored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
}

/// Author with the number of books referencing it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorWithCount {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub book_count: i64,
}

/// Author page: the author and their books, newest first
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    pub author: Author,
    pub books: Vec<BookShort>,
}
