//! Category endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::category::{CategoryBooks, CategoryWithCount},
    AppState,
};

/// List categories with their book counts
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<CategoryWithCount>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryWithCount>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// Books of a category
#[utoipa::path(
    get,
    path = "/categories/{id}/books",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category and its books, newest first", body = CategoryBooks),
        (status = 404, description = "Category not found")
    )
)]
pub async fn category_books(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CategoryBooks>> {
    let books = state.services.catalog.category_books(id).await?;
    Ok(Json(books))
}
