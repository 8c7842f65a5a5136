//! Home page endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::book::BookShort, AppState};

#[derive(Serialize, ToSchema)]
pub struct HomeStats {
    pub books: i64,
    pub authors: i64,
    /// Non-staff members
    pub readers: i64,
}

#[derive(Serialize, ToSchema)]
pub struct HomeResponse {
    pub latest_books: Vec<BookShort>,
    /// Books with the most reviews
    pub top_rated: Vec<BookShort>,
    pub stats: HomeStats,
}

/// Home page content
#[utoipa::path(
    get,
    path = "/home",
    tag = "catalog",
    responses(
        (status = 200, description = "Latest books, top rated books and counts", body = HomeResponse)
    )
)]
pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomeResponse>> {
    let overview = state.services.catalog.home().await?;

    Ok(Json(HomeResponse {
        latest_books: overview.latest_books,
        top_rated: overview.top_rated,
        stats: HomeStats {
            books: overview.books,
            authors: overview.authors,
            readers: overview.readers,
        },
    }))
}
