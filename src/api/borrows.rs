//! Borrow ledger endpoints for the authenticated member

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{Borrow, MyBooks},
    AppState,
};

use super::AuthenticatedUser;

/// Return confirmation
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub borrow: Borrow,
}

/// Active borrows and borrowing history of the caller
#[utoipa::path(
    get,
    path = "/me/borrows",
    tag = "lending",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active borrows and history", body = MyBooks),
        (status = 403, description = "Staff account")
    )
)]
pub async fn my_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MyBooks>> {
    claims.require_member()?;

    let books = state.services.lending.my_books(&claims.member()).await?;
    Ok(Json(books))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "not-found-or-already-returned")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrow_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let borrow = state
        .services
        .lending
        .return_book(&claims.member(), borrow_id)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrow,
    }))
}
