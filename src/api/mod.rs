//! API handlers for Athenaeum REST endpoints

pub mod authors;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod contact;
pub mod health;
pub mod home;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the member authenticated by the identity provider's JWT
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or malformed bearer token".to_string()))?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/home", get(home::home))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/:id", get(books::get_book))
        .route("/categories", get(categories::list_categories))
        .route("/categories/:id/books", get(categories::category_books))
        .route("/authors", get(authors::list_authors))
        .route("/authors/:id", get(authors::get_author))
        // Lending
        .route("/books/:id/borrow", post(books::borrow_book))
        .route("/books/:id/reviews", post(books::add_review))
        .route("/borrows/:id/return", post(borrows::return_book))
        .route("/me/borrows", get(borrows::my_books))
        // Contact
        .route("/contact", post(contact::send_message))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
