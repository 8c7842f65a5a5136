//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, borrows, categories, contact, health, home};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Athenaeum API",
        version = "0.1.0",
        description = "Library catalog, lending and review REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        home::home,
        books::list_books,
        books::get_book,
        categories::list_categories,
        categories::category_books,
        authors::list_authors,
        authors::get_author,
        // Lending
        books::borrow_book,
        books::add_review,
        borrows::my_books,
        borrows::return_book,
        // Contact
        contact::send_message,
    ),
    components(
        schemas(
            // Catalog
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::BookStatus,
            crate::models::book::BookSort,
            crate::models::book::ViewerStatus,
            crate::models::author::Author,
            crate::models::author::AuthorWithCount,
            crate::models::author::AuthorDetails,
            crate::models::category::Category,
            crate::models::category::CategoryWithCount,
            crate::models::category::CategoryBooks,
            books::BookPage,
            home::HomeResponse,
            home::HomeStats,
            // Lending
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::MyBooks,
            crate::models::review::Review,
            crate::models::review::ReviewDetails,
            crate::models::review::CreateReview,
            books::BorrowResponse,
            borrows::ReturnResponse,
            // Contact
            crate::models::contact::ContactMessage,
            contact::ContactResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Books, categories and authors"),
        (name = "lending", description = "Borrowing, returns and reviews"),
        (name = "contact", description = "Contact form")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
