//! Review model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Review row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub stars: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review as displayed on a book page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReviewDetails {
    pub id: i32,
    pub username: String,
    pub stars: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review submission. The star range is enforced by the lending rules.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    /// Rating, 1 to 5
    pub stars: i64,
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}
