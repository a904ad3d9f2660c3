//! Repository tests against a real database
//!
//! Each test gets a fresh, migrated database. Run with a DATABASE_URL and:
//! cargo test -- --ignored

use chrono::NaiveDate;
use sqlx::PgPool;

use catalog_server::{
    error::AppError,
    models::{
        author::AuthorInput,
        book::BookInput,
        book_instance::{BookInstanceInput, LoanStatus},
        genre::GenreInput,
        language::LanguageInput,
        user::CreateUser,
    },
    repository::{book_instances::InstanceFilter, Repository},
};

fn author(last_name: &str) -> AuthorInput {
    AuthorInput {
        first_name: "Test".to_string(),
        last_name: last_name.to_string(),
        date_of_birth: None,
        date_of_death: None,
    }
}

fn book(title: &str, isbn: &str, author_id: Option<i32>) -> BookInput {
    BookInput {
        title: title.to_string(),
        summary: String::new(),
        isbn: isbn.to_string(),
        author_id,
        language_id: None,
        genre_ids: vec![],
    }
}

fn copy(book_id: i32, status: LoanStatus, borrower_id: Option<i32>) -> BookInstanceInput {
    BookInstanceInput {
        book_id,
        imprint: "First edition".to_string(),
        due_back: NaiveDate::from_ymd_opt(2024, 5, 1),
        status,
        borrower_id,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_genre_and_language_names_are_unique(pool: PgPool) {
    let repository = Repository::new(pool);

    let fantasy = GenreInput {
        name: "Fantasy".to_string(),
    };
    repository.genres.create(&fantasy).await.unwrap();
    let err = repository.genres.create(&fantasy).await.unwrap_err();
    assert!(err.is_unique_violation());

    let english = LanguageInput {
        name: "English".to_string(),
    };
    repository.languages.create(&english).await.unwrap();
    let err = repository.languages.create(&english).await.unwrap_err();
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_isbn_is_unique(pool: PgPool) {
    let repository = Repository::new(pool);

    repository
        .books
        .create(&book("Kindred", "9780807083697", None))
        .await
        .unwrap();
    let err = repository
        .books
        .create(&book("Dawn", "9780807083697", None))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_referenced_records_cannot_be_deleted(pool: PgPool) {
    let repository = Repository::new(pool);

    let butler = repository.authors.create(&author("Butler")).await.unwrap();
    let kindred = repository
        .books
        .create(&book("Kindred", "9780807083697", Some(butler.id)))
        .await
        .unwrap();
    let instance = repository
        .book_instances
        .create(&copy(kindred.id, LoanStatus::Available, None))
        .await
        .unwrap();

    let err = repository.authors.delete(butler.id).await.unwrap_err();
    assert!(err.is_foreign_key_violation());

    let err = repository.books.delete(kindred.id).await.unwrap_err();
    assert!(err.is_foreign_key_violation());

    repository.book_instances.delete(instance.id).await.unwrap();
    repository.books.delete(kindred.id).await.unwrap();
    repository.authors.delete(butler.id).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deleting_borrower_clears_loans(pool: PgPool) {
    let repository = Repository::new(pool);

    let reader = CreateUser {
        username: "reader".to_string(),
        password: "unused-here".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: None,
        is_staff: false,
        is_superuser: false,
        permissions: vec!["catalog.can_mark_returned".to_string()],
    };
    let user = repository.users.create(&reader, "$argon2id$placeholder").await.unwrap();
    assert_eq!(
        repository.users.get_permissions(user.id).await.unwrap(),
        vec!["catalog.can_mark_returned".to_string()]
    );

    let dune = repository
        .books
        .create(&book("Dune", "9780441013593", None))
        .await
        .unwrap();
    let instance = repository
        .book_instances
        .create(&copy(dune.id, LoanStatus::OnLoan, Some(user.id)))
        .await
        .unwrap();

    repository.users.delete(user.id).await.unwrap();

    let instance = repository.book_instances.get_by_id(instance.id).await.unwrap();
    assert_eq!(instance.borrower_id, None);
    assert!(repository.users.get_permissions(user.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_instance_filters(pool: PgPool) {
    let repository = Repository::new(pool);

    let dune = repository
        .books
        .create(&book("Dune", "9780441013593", None))
        .await
        .unwrap();
    repository
        .book_instances
        .create(&copy(dune.id, LoanStatus::OnLoan, None))
        .await
        .unwrap();
    repository
        .book_instances
        .create(&copy(dune.id, LoanStatus::Available, None))
        .await
        .unwrap();
    repository
        .book_instances
        .create(&BookInstanceInput {
            due_back: None,
            ..copy(dune.id, LoanStatus::Maintenance, None)
        })
        .await
        .unwrap();

    let instances = &repository.book_instances;
    assert_eq!(instances.count().await.unwrap(), 3);
    assert_eq!(
        instances.count_filtered(&InstanceFilter::on_loan(None)).await.unwrap(),
        1
    );

    let undated = InstanceFilter {
        has_due_date: Some(false),
        ..Default::default()
    };
    assert_eq!(instances.count_filtered(&undated).await.unwrap(), 1);

    let may = InstanceFilter {
        due_from: NaiveDate::from_ymd_opt(2024, 5, 1),
        due_before: NaiveDate::from_ymd_opt(2024, 6, 1),
        ..Default::default()
    };
    let rows = instances.list_filtered(&may, "bi.due_back, bi.id", 10, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_book_genres_and_title_count(pool: PgPool) {
    let repository = Repository::new(pool);

    let horror = repository
        .genres
        .create(&GenreInput {
            name: "Horror".to_string(),
        })
        .await
        .unwrap();
    let gothic = repository
        .genres
        .create(&GenreInput {
            name: "Gothic".to_string(),
        })
        .await
        .unwrap();

    let created = repository
        .books
        .create(&BookInput {
            genre_ids: vec![horror.id, gothic.id],
            ..book("The Haunting of Hill House", "9780143039983", None)
        })
        .await
        .unwrap();
    repository
        .books
        .create(&book("Carmilla", "9781535400000", None))
        .await
        .unwrap();
    repository
        .books
        .create(&book("Northanger Abbey", "9780141439792", None))
        .await
        .unwrap();

    let genres = repository.genres.list_for_book(created.id).await.unwrap();
    let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Gothic", "Horror"]);

    assert_eq!(repository.books.count_title_contains("the").await.unwrap(), 2);
    assert_eq!(repository.books.count_title_contains("THE").await.unwrap(), 2);

    let err = repository
        .books
        .update(9999, &book("Ghost", "9780000000000", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
