//! Staff-only management endpoints for catalog records and users

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    admin::{ModelAdmin, REGISTRY},
    error::AppResult,
    models::{
        author::{Author, AuthorDetail, AuthorInput},
        book::BookInput,
        book_instance::{BookInstance, BookInstanceInput},
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
        pagination::{Page, PageQuery},
        user::{CreateUser, UserInfo},
    },
    services::admin::{BookAdminDetail, BookAdminRow, BookInstanceAdminQuery, BookInstanceAdminRow},
    AppState,
};

use super::StaffUser;

/// Registered entity kinds and how they are presented
#[derive(Serialize, ToSchema)]
pub struct AdminIndex {
    #[schema(value_type = Vec<Object>)]
    pub models: Vec<ModelAdmin>,
}

/// Admin registry
#[utoipa::path(
    get,
    path = "/admin",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registered models", body = AdminIndex),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn index(_: StaffUser) -> Json<AdminIndex> {
    Json(AdminIndex {
        models: REGISTRY.to_vec(),
    })
}

// =============================================================================
// GENRES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All genres", body = Vec<Genre>))
)]
pub async fn list_genres(
    State(state): State<AppState>,
    _: StaffUser,
) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.services.admin.list_genres().await?))
}

#[utoipa::path(
    get,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.services.admin.get_genre(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Genre name already exists")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    data.validate()?;
    let genre = state.services.admin.create_genre(&data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    put,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreInput,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found"),
        (status = 409, description = "Genre name already exists")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
    Json(data): Json<GenreInput>,
) -> AppResult<Json<Genre>> {
    data.validate()?;
    Ok(Json(state.services.admin.update_genre(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.admin.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// LANGUAGES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/languages",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All languages", body = Vec<Language>))
)]
pub async fn list_languages(
    State(state): State<AppState>,
    _: StaffUser,
) -> AppResult<Json<Vec<Language>>> {
    Ok(Json(state.services.admin.list_languages().await?))
}

#[utoipa::path(
    get,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn get_language(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Language>> {
    Ok(Json(state.services.admin.get_language(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/languages",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = LanguageInput,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Language name already exists")
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<LanguageInput>,
) -> AppResult<(StatusCode, Json<Language>)> {
    data.validate()?;
    let language = state.services.admin.create_language(&data).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

#[utoipa::path(
    put,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = LanguageInput,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 404, description = "Language not found"),
        (status = 409, description = "Language name already exists")
    )
)]
pub async fn update_language(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
    Json(data): Json<LanguageInput>,
) -> AppResult<Json<Language>> {
    data.validate()?;
    Ok(Json(state.services.admin.update_language(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted; its books keep no language"),
        (status = 404, description = "Language not found")
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.admin.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// AUTHORS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Authors by last name, first name", body = Page<Author>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    _: StaffUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    Ok(Json(state.services.admin.list_authors(query.page).await?))
}

#[utoipa::path(
    get,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author with inline books", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    Ok(Json(state.services.admin.get_author(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<AuthorInput>,
) -> AppResult<(StatusCode, Json<Author>)> {
    data.validate()?;
    let author = state.services.admin.create_author(&data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[utoipa::path(
    put,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorInput,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
    Json(data): Json<AuthorInput>,
) -> AppResult<Json<Author>> {
    data.validate()?;
    Ok(Json(state.services.admin.update_author(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Books still reference the author")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.admin.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// BOOKS
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Books with author and genres", body = Page<BookAdminRow>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    _: StaffUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookAdminRow>>> {
    Ok(Json(state.services.admin.list_books(query.page).await?))
}

#[utoipa::path(
    get,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book with inline copies", body = BookAdminDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookAdminDetail>> {
    Ok(Json(state.services.admin.get_book(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookAdminDetail),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "ISBN already exists or a reference is missing")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<BookInput>,
) -> AppResult<(StatusCode, Json<BookAdminDetail>)> {
    data.validate()?;
    let book = state.services.admin.create_book(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = BookAdminDetail),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already exists or a reference is missing")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
    Json(data): Json<BookInput>,
) -> AppResult<Json<BookAdminDetail>> {
    data.validate()?;
    Ok(Json(state.services.admin.update_book(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies still reference the book")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.admin.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// BOOK INSTANCES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(BookInstanceAdminQuery),
    responses(
        (status = 200, description = "Copies by due date", body = Page<BookInstanceAdminRow>),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
    _: StaffUser,
    Query(query): Query<BookInstanceAdminQuery>,
) -> AppResult<Json<Page<BookInstanceAdminRow>>> {
    Ok(Json(state.services.admin.list_book_instances(&query).await?))
}

#[utoipa::path(
    get,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy", body = BookInstance),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    Ok(Json(state.services.admin.get_book_instance(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookInstanceInput,
    responses(
        (status = 201, description = "Copy created with a new ID", body = BookInstance),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Book or borrower does not exist")
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    data.validate()?;
    let instance = state.services.admin.create_book_instance(&data).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

#[utoipa::path(
    put,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = BookInstanceInput,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Book or borrower does not exist")
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<Uuid>,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<Json<BookInstance>> {
    data.validate()?;
    Ok(Json(state.services.admin.update_book_instance(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.admin.delete_book_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// USERS
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    _: StaffUser,
    Json(data): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    data.validate()?;
    let user = state.services.users.create_user(&data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted; their loans lose the borrower"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _: StaffUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
