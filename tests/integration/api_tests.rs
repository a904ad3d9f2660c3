//! API integration tests
//!
//! Guard tests run against a lazily connected pool: every request they send
//! is rejected before a query is made. Tests marked `#[ignore]` need a
//! PostgreSQL server. Run them with: cargo test -- --ignored

mod common;

use axum::http::{
    header::{COOKIE, LOCATION, SET_COOKIE},
    StatusCode,
};
use chrono::{Duration, Local};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use catalog_server::models::{
    author::AuthorInput,
    book::BookInput,
    book_instance::{BookInstanceInput, LoanStatus},
    user::{CreateUser, CAN_MARK_RETURNED},
};

use common::{app, get, json_body, lazy_pool, post_json, send, token};

fn location(response: &axum::response::Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app(lazy_pool());

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let app = app(lazy_pool());

    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog");
}

#[tokio::test]
async fn test_my_books_requires_login() {
    let app = app(lazy_pool());

    let response = send(&app, get("/catalog/mybooks?page=2", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/accounts/login?next=%2Fcatalog%2Fmybooks%3Fpage%3D2"
    );
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let app = app(lazy_pool());

    let response = send(&app, get("/catalog/borrowed", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login?next=%2Fcatalog%2Fborrowed");
}

#[tokio::test]
async fn test_all_borrowed_requires_permission() {
    let app = app(lazy_pool());

    let anonymous = send(&app, get("/catalog/borrowed", None)).await;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);

    let reader = token(1, false, &[]);
    let denied = send(&app, get("/catalog/borrowed", Some(&reader))).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let body = json_body(denied).await;
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_renewal_is_guarded_before_lookup() {
    let app = app(lazy_pool());
    let uri = format!("/catalog/book/{}/renew", Uuid::new_v4());
    let body = json!({ "renewal_date": "2000-01-01" });

    let anonymous = send(&app, post_json(&uri, None, body.clone())).await;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert!(location(&anonymous).starts_with("/accounts/login?next=%2Fcatalog%2Fbook%2F"));

    let reader = token(1, false, &[]);
    let denied = send(&app, post_json(&uri, Some(&reader), body)).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let form = send(&app, get(&uri, Some(&reader))).await;
    assert_eq!(form.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let app = app(lazy_pool());

    let reader = token(1, false, &[CAN_MARK_RETURNED]);
    let denied = send(&app, get("/admin/books", Some(&reader))).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let staff = token(2, true, &[]);
    let response = send(&app, get("/admin", Some(&staff))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 5);
    assert!(models
        .iter()
        .any(|m| m["model"] == "BookInstance" && m["list_filter"] == json!(["status", "due_back"])));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app(lazy_pool());

    let response = send(&app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["paths"]["/catalog/book/{id}/renew"].is_object());
}

// =============================================================================
// Database-backed flows
// =============================================================================

async fn seed_copy(pool: &PgPool, borrower_id: Option<i32>) -> Uuid {
    let services = common::services(pool.clone());
    let repository = &services.repository;

    let author = repository
        .authors
        .create(&AuthorInput {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();
    let book = repository
        .books
        .create(&BookInput {
            title: "Dune".to_string(),
            summary: String::new(),
            isbn: "9780441013593".to_string(),
            author_id: Some(author.id),
            language_id: None,
            genre_ids: vec![],
        })
        .await
        .unwrap();
    repository
        .book_instances
        .create(&BookInstanceInput {
            book_id: book.id,
            imprint: "Ace, 2005".to_string(),
            due_back: Some(Local::now().date_naive()),
            status: LoanStatus::OnLoan,
            borrower_id,
        })
        .await
        .unwrap()
        .id
}

async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        post_json(
            "/accounts/login",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["token_type"], "Bearer");
    body["token"].as_str().unwrap().to_string()
}

async fn create_librarian(pool: &PgPool) {
    common::services(pool.clone())
        .users
        .create_user(&CreateUser {
            username: "librarian".to_string(),
            password: "shelves-and-stacks".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            is_staff: false,
            is_superuser: false,
            permissions: vec![CAN_MARK_RETURNED.to_string()],
        })
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_renewal_flow(pool: PgPool) {
    let services = common::services(pool.clone());
    create_librarian(&pool).await;
    let copy_id = seed_copy(&pool, None).await;

    let app = app(pool.clone());
    let token = login(&app, "librarian", "shelves-and-stacks").await;
    let uri = format!("/catalog/book/{}/renew", copy_id);
    let today = Local::now().date_naive();

    let form = json_body(send(&app, get(&uri, Some(&token))).await).await;
    let proposed = (today + Duration::weeks(3)).format("%Y-%m-%d").to_string();
    assert_eq!(form["renewal_date"], proposed);

    let past = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
    let rejected = send(&app, post_json(&uri, Some(&token), json!({ "renewal_date": past }))).await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(rejected).await;
    assert_eq!(body["errors"]["renewal_date"][0], "Invalid date - renewal in past");

    let last_day = today + Duration::weeks(4);
    let renewed = send(
        &app,
        post_json(
            &uri,
            Some(&token),
            json!({ "renewal_date": last_day.format("%Y-%m-%d").to_string() }),
        ),
    )
    .await;
    assert_eq!(renewed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&renewed), "/catalog/borrowed");

    let stored = services.repository.book_instances.get_by_id(copy_id).await.unwrap();
    assert_eq!(stored.due_back, Some(last_day));

    let missing = format!("/catalog/book/{}/renew", Uuid::new_v4());
    let response = send(&app, get(&missing, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_unreadable_renewal_dates_return_the_form(pool: PgPool) {
    create_librarian(&pool).await;
    let copy_id = seed_copy(&pool, None).await;

    let app = app(pool.clone());
    let token = login(&app, "librarian", "shelves-and-stacks").await;
    let uri = format!("/catalog/book/{}/renew", copy_id);

    let numeric = send(
        &app,
        post_json(&uri, Some(&token), json!({ "renewal_date": 20240101 })),
    )
    .await;
    assert_eq!(numeric.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(numeric).await;
    assert_eq!(body["errors"]["renewal_date"][0], "Enter a valid date.");
    assert_eq!(body["renewal_date"], "20240101");
    assert_eq!(body["book_instance"]["id"], copy_id.to_string());

    let array = send(&app, post_json(&uri, Some(&token), json!(["2024-01-01"]))).await;
    assert_eq!(array.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(array).await;
    assert_eq!(body["errors"]["renewal_date"][0], "Enter a valid date.");

    // Plain text without a JSON content type
    let mut text = get(&uri, Some(&token));
    *text.method_mut() = axum::http::Method::POST;
    *text.body_mut() = axum::body::Body::from("renewal_date=2024-01-01");
    let response = send(&app, text).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["errors"]["renewal_date"][0], "Enter a valid date.");

    let stored = common::services(pool)
        .repository
        .book_instances
        .get_by_id(copy_id)
        .await
        .unwrap();
    assert_eq!(stored.due_back, Some(Local::now().date_naive()));

    let missing = format!("/catalog/book/{}/renew", Uuid::new_v4());
    let response = send(
        &app,
        post_json(&missing, Some(&token), json!({ "renewal_date": 20240101 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_bootstrap_admin_can_log_in(pool: PgPool) {
    let mut config = common::test_config();
    config.auth.bootstrap_admin_username = Some("admin".to_string());
    config.auth.bootstrap_admin_password = Some("let-me-in".to_string());
    let services = catalog_server::services::Services::new(
        catalog_server::repository::Repository::new(pool.clone()),
        config.auth,
        std::sync::Arc::new(catalog_server::services::sessions::MemorySessionStore::new()),
    );

    services.users.ensure_bootstrap_admin().await.unwrap();
    // Second start finds the account and leaves it alone
    services.users.ensure_bootstrap_admin().await.unwrap();

    let app = app(pool);
    let bad = send(
        &app,
        post_json(
            "/accounts/login",
            None,
            json!({ "username": "admin", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app, "admin", "let-me-in").await;
    let me = json_body(send(&app, get("/accounts/me", Some(&token))).await).await;
    assert_eq!(me["username"], "admin");
    assert_eq!(me["is_staff"], true);

    let response = send(&app, get("/admin", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_my_books_lists_only_own_loans(pool: PgPool) {
    let services = common::services(pool.clone());
    let reader = services
        .users
        .create_user(&CreateUser {
            username: "reader".to_string(),
            password: "reading-is-fun".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            is_staff: false,
            is_superuser: false,
            permissions: vec![],
        })
        .await
        .unwrap();
    let own = seed_copy(&pool, Some(reader.id)).await;

    let app = app(pool);
    let token = login(&app, "reader", "reading-is-fun").await;

    let body = json_body(send(&app, get("/catalog/mybooks", Some(&token))).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], own.to_string());
    assert_eq!(body["items"][0]["status"], "on_loan");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_visit_counter_increments_per_session(pool: PgPool) {
    let app = app(pool);

    let first = send(&app, get("/catalog", None)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("sessionid="));
    assert_eq!(json_body(first).await["num_visits"], 0);

    for expected in 1..=2 {
        let mut request = get("/catalog", None);
        request.headers_mut().insert(COOKIE, cookie.parse().unwrap());
        let response = send(&app, request).await;
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(json_body(response).await["num_visits"], expected);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_book_list_pages_of_two(pool: PgPool) {
    let services = common::services(pool.clone());
    for (i, title) in ["A", "B", "C", "D", "E"].iter().enumerate() {
        services
            .repository
            .books
            .create(&BookInput {
                title: title.to_string(),
                summary: String::new(),
                isbn: format!("978000000000{}", i),
                author_id: None,
                language_id: None,
                genre_ids: vec![],
            })
            .await
            .unwrap();
    }

    let app = app(pool);

    let first = json_body(send(&app, get("/catalog/books", None)).await).await;
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["num_pages"], 3);
    assert_eq!(first["items"][0]["title"], "A");

    let last = json_body(send(&app, get("/catalog/books?page=3", None)).await).await;
    assert_eq!(last["items"].as_array().unwrap().len(), 1);
    assert_eq!(last["items"][0]["title"], "E");

    let beyond = send(&app, get("/catalog/books?page=4", None)).await;
    assert_eq!(beyond.status(), StatusCode::NOT_FOUND);
}
