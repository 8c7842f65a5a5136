//! Author endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::author::{AuthorDetails, AuthorWithCount},
    AppState,
};

/// List authors with their book counts
#[utoipa::path(
    get,
    path = "/authors",
    tag = "catalog",
    responses(
        (status = 200, description = "Authors ordered by name", body = Vec<AuthorWithCount>)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Vec<AuthorWithCount>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

/// Author details with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author and books, newest first", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.catalog.author_details(id).await?;
    Ok(Json(author))
}
