//! HTTP routing

use axum::{
    response::Redirect,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{api, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog = Router::new()
        .route("/", get(api::catalog::index))
        .route("/books", get(api::catalog::list_books))
        .route("/books/:id", get(api::catalog::get_book))
        .route("/authors", get(api::catalog::list_authors))
        .route("/authors/:id", get(api::catalog::get_author))
        .route("/mybooks", get(api::loans::my_borrowed))
        .route("/borrowed", get(api::loans::all_borrowed))
        .route(
            "/book/:id/renew",
            get(api::loans::renewal_form).post(api::loans::renew_book),
        );

    let accounts = Router::new()
        .route("/login", post(api::auth::login))
        .route("/me", get(api::auth::me));

    let admin = Router::new()
        .route("/", get(api::admin::index))
        .route(
            "/genres",
            get(api::admin::list_genres).post(api::admin::create_genre),
        )
        .route(
            "/genres/:id",
            get(api::admin::get_genre)
                .put(api::admin::update_genre)
                .delete(api::admin::delete_genre),
        )
        .route(
            "/languages",
            get(api::admin::list_languages).post(api::admin::create_language),
        )
        .route(
            "/languages/:id",
            get(api::admin::get_language)
                .put(api::admin::update_language)
                .delete(api::admin::delete_language),
        )
        .route(
            "/authors",
            get(api::admin::list_authors).post(api::admin::create_author),
        )
        .route(
            "/authors/:id",
            get(api::admin::get_author)
                .put(api::admin::update_author)
                .delete(api::admin::delete_author),
        )
        .route(
            "/books",
            get(api::admin::list_books).post(api::admin::create_book),
        )
        .route(
            "/books/:id",
            get(api::admin::get_book)
                .put(api::admin::update_book)
                .delete(api::admin::delete_book),
        )
        .route(
            "/bookinstances",
            get(api::admin::list_book_instances).post(api::admin::create_book_instance),
        )
        .route(
            "/bookinstances/:id",
            get(api::admin::get_book_instance)
                .put(api::admin::update_book_instance)
                .delete(api::admin::delete_book_instance),
        )
        .route("/users", post(api::admin::create_user))
        .route("/users/:id", delete(api::admin::delete_user));

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/catalog") }))
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .nest("/catalog", catalog)
        .nest("/accounts", accounts)
        .nest("/admin", admin)
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    app.merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
