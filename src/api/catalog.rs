//! Public catalog endpoints: home page, books and authors

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail},
        book::{BookDetail, BookSummary},
        pagination::{Page, PageQuery},
    },
    services::catalog::{record_visit, CatalogCounts},
    AppState,
};

use super::{with_session_cookie, ClientSession};

/// Home page figures
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits this session made before the current one
    pub num_visits: i64,
}

/// Catalog home page
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts and the session visit counter", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    ClientSession(mut session): ClientSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let counts = state.services.catalog.counts().await?;
    let num_visits = record_visit(&mut session).await?;

    let jar = with_session_cookie(jar, &state.config.session, &session);
    Ok((jar, Json(IndexResponse { counts, num_visits })))
}

/// List books, two per page
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = Page<BookSummary>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page).await?;
    Ok(Json(page))
}

/// Get book details with its copies
#[utoipa::path(
    get,
    path = "/catalog/books/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// List authors, ten per page
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = Page<Author>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let page = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(page))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}
