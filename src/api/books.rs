//! Book endpoints: catalog listing, book page, borrowing and reviews

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookDetails, BookQuery, BookShort},
        borrow::Borrow,
        review::{CreateReview, Review},
    },
    AppState,
};

use super::AuthenticatedUser;

/// One page of the catalog
#[derive(Serialize, ToSchema)]
pub struct BookPage {
    pub items: Vec<BookShort>,
    /// Total number of matching books
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Borrow confirmation
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub borrow: Borrow,
    pub message: String,
}

/// List books with search, category filter, sort and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "catalog",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let (items, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(BookPage {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// Book page, with the caller's borrowing state when authenticated
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let member = user.map(|AuthenticatedUser(claims)| claims.member());
    let book = state.services.catalog.get_book(id, member.as_ref()).await?;
    Ok(Json(book))
}

/// Borrow a copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 403, description = "forbidden-role"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "unavailable or duplicate-active-borrow"),
        (status = 422, description = "limit-exceeded")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let borrow = state
        .services
        .lending
        .borrow_book(&claims.member(), book_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            borrow,
            message: "Borrowing completed successfully".to_string(),
        }),
    ))
}

/// Review a book previously borrowed and returned
#[utoipa::path(
    post,
    path = "/books/{id}/reviews",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review added", body = Review),
        (status = 400, description = "invalid-rating"),
        (status = 403, description = "forbidden-role or never-borrowed"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "already-reviewed")
    )
)]
pub async fn add_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    WithRejection(Json(review), _): WithRejection<Json<CreateReview>, AppError>,
) -> AppResult<(StatusCode, Json<Review>)> {
    review.validate()?;

    let created = state
        .services
        .lending
        .add_review(&claims.member(), book_id, &review)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
