//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, catalog, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "0.1.0",
        description = "Books, authors, copies and loans of a local library",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        catalog::index,
        catalog::list_books,
        catalog::get_book,
        catalog::list_authors,
        catalog::get_author,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renewal_form,
        loans::renew_book,
        // Admin
        admin::index,
        admin::list_genres,
        admin::get_genre,
        admin::create_genre,
        admin::update_genre,
        admin::delete_genre,
        admin::list_languages,
        admin::get_language,
        admin::create_language,
        admin::update_language,
        admin::delete_language,
        admin::list_authors,
        admin::get_author,
        admin::create_author,
        admin::update_author,
        admin::delete_author,
        admin::list_books,
        admin::get_book,
        admin::create_book,
        admin::update_book,
        admin::delete_book,
        admin::list_book_instances,
        admin::get_book_instance,
        admin::create_book_instance,
        admin::update_book_instance,
        admin::delete_book_instance,
        admin::create_user,
        admin::delete_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::UserInfo,
            crate::models::user::CreateUser,
            // Catalog
            catalog::IndexResponse,
            crate::services::catalog::CatalogCounts,
            crate::models::genre::Genre,
            crate::models::genre::GenreInput,
            crate::models::language::Language,
            crate::models::language::LanguageInput,
            crate::models::author::Author,
            crate::models::author::AuthorRef,
            crate::models::author::AuthorDetail,
            crate::models::author::AuthorInput,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::book::BookInput,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceInput,
            crate::models::book_instance::BookCopy,
            crate::models::book_instance::BookRef,
            crate::models::book_instance::BorrowerRef,
            crate::models::book_instance::LoanedCopy,
            // Loans
            crate::services::loans::RenewalRequest,
            crate::services::loans::RenewalForm,
            // Admin
            admin::AdminIndex,
            crate::admin::DueBackFilter,
            crate::services::admin::BookAdminRow,
            crate::services::admin::BookAdminDetail,
            crate::services::admin::BookInstanceAdminRow,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Public catalog browsing"),
        (name = "loans", description = "Loan listings and renewals"),
        (name = "admin", description = "Staff management of records and users")
    )
)]
pub struct ApiDoc;

/// Declares the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
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

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
