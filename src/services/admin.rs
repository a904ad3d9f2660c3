//! Staff management of catalog records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    admin::DueBackFilter,
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, AuthorInput, AuthorRef},
        book::{display_genre, Book, BookInput},
        book_instance::{today, BookInstance, BookInstanceInput, LoanStatus},
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
        pagination::{ListConfig, Page},
    },
    repository::{book_instances::InstanceFilter, Repository},
    services::paginate,
};

pub const AUTHOR_ADMIN_LIST: ListConfig = ListConfig {
    page_size: 100,
    order_by: "last_name, first_name, id",
};

pub const BOOK_ADMIN_LIST: ListConfig = ListConfig {
    page_size: 100,
    order_by: "b.title, a.last_name, a.first_name, b.id",
};

pub const BOOK_INSTANCE_ADMIN_LIST: ListConfig = ListConfig {
    page_size: 100,
    order_by: "bi.due_back, bi.id",
};

/// Filters accepted by the copy listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookInstanceAdminQuery {
    pub page: Option<i64>,
    pub status: Option<LoanStatus>,
    pub due_back: Option<DueBackFilter>,
}

impl BookInstanceAdminQuery {
    fn filter(&self, today: NaiveDate) -> InstanceFilter {
        let bounds = self
            .due_back
            .map(|f| f.bounds(today))
            .unwrap_or_default();
        InstanceFilter {
            status: self.status,
            borrower_id: None,
            due_from: bounds.from,
            due_before: bounds.before,
            has_due_date: bounds.has_date,
        }
    }
}

/// Book row in the admin listing: title, author, display_genre
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookAdminRow {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub display_genre: String,
}

/// Copy row in the admin listing: book, status, due_back, id
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceAdminRow {
    pub book: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub id: Uuid,
}

/// Book edit page with its genre selection and inline copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookAdminDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    pub genre_ids: Vec<i32>,
    pub instances: Vec<BookInstance>,
}

#[derive(Clone)]
pub struct AdminService {
    repository: Repository,
}

impl AdminService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, data: &GenreInput) -> AppResult<Genre> {
        let genre = self.repository.genres.create(data).await?;
        tracing::info!("Created genre {} ({})", genre.id, genre.name);
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i32, data: &GenreInput) -> AppResult<Genre> {
        let genre = self.repository.genres.update(id, data).await?;
        tracing::info!("Updated genre {}", id);
        Ok(genre)
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await?;
        tracing::info!("Deleted genre {}", id);
        Ok(())
    }

    // =========================================================================
    // LANGUAGES
    // =========================================================================

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, data: &LanguageInput) -> AppResult<Language> {
        let language = self.repository.languages.create(data).await?;
        tracing::info!("Created language {} ({})", language.id, language.name);
        Ok(language)
    }

    pub async fn update_language(&self, id: i32, data: &LanguageInput) -> AppResult<Language> {
        let language = self.repository.languages.update(id, data).await?;
        tracing::info!("Updated language {}", id);
        Ok(language)
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages.delete(id).await?;
        tracing::info!("Deleted language {}", id);
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Page<Author>> {
        let authors = &self.repository.authors;
        paginate(
            &AUTHOR_ADMIN_LIST,
            page,
            || authors.count(),
            |limit, offset| authors.list(AUTHOR_ADMIN_LIST.order_by, limit, offset),
        )
        .await
    }

    /// Author with the inline list of their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(author.id).await?;
        Ok(AuthorDetail::new(author, books))
    }

    pub async fn create_author(&self, data: &AuthorInput) -> AppResult<Author> {
        check_lifespan(data)?;
        let author = self.repository.authors.create(data).await?;
        tracing::info!("Created author {} ({})", author.id, author.display_name());
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, data: &AuthorInput) -> AppResult<Author> {
        check_lifespan(data)?;
        let author = self.repository.authors.update(id, data).await?;
        tracing::info!("Updated author {}", id);
        Ok(author)
    }

    /// Refused by the database while any book references the author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Page<BookAdminRow>> {
        let books = &self.repository.books;
        paginate(
            &BOOK_ADMIN_LIST,
            page,
            || books.count(),
            |limit, offset| async move {
                let summaries = books.list(BOOK_ADMIN_LIST.order_by, limit, offset).await?;
                let ids: Vec<i32> = summaries.iter().map(|b| b.id).collect();
                let mut genres = books.genres_for_books(&ids).await?;

                let rows: Vec<BookAdminRow> = summaries
                    .into_iter()
                    .map(|book| BookAdminRow {
                        display_genre: display_genre(
                            genres.remove(&book.id).as_deref().unwrap_or_default(),
                        ),
                        author: book.author.as_ref().map(AuthorRef::display_name),
                        id: book.id,
                        title: book.title,
                    })
                    .collect();
                Ok::<_, AppError>(rows)
            },
        )
        .await
    }

    /// Book with its genre links and the inline list of its copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookAdminDetail> {
        let book = self.repository.books.get_by_id(id).await?;
        let genres = self.repository.genres.list_for_book(book.id).await?;
        let instances = self.repository.book_instances.list_for_book(book.id).await?;
        Ok(book_detail(book, genres, instances))
    }

    pub async fn create_book(&self, data: &BookInput) -> AppResult<BookAdminDetail> {
        let book = self.repository.books.create(data).await?;
        tracing::info!("Created book {} ({})", book.id, book.title);
        self.get_book(book.id).await
    }

    pub async fn update_book(&self, id: i32, data: &BookInput) -> AppResult<BookAdminDetail> {
        self.repository.books.update(id, data).await?;
        tracing::info!("Updated book {}", id);
        self.get_book(id).await
    }

    /// Refused by the database while any copy references the book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    pub async fn list_book_instances(
        &self,
        query: &BookInstanceAdminQuery,
    ) -> AppResult<Page<BookInstanceAdminRow>> {
        let instances = &self.repository.book_instances;
        let filter = &query.filter(today());
        paginate(
            &BOOK_INSTANCE_ADMIN_LIST,
            query.page,
            || instances.count_filtered(filter),
            |limit, offset| async move {
                let rows = instances
                    .list_filtered(filter, BOOK_INSTANCE_ADMIN_LIST.order_by, limit, offset)
                    .await?;
                let today = today();
                Ok::<Vec<BookInstanceAdminRow>, AppError>(
                    rows.into_iter()
                        .map(|row| {
                            let copy = row.into_copy(today);
                            BookInstanceAdminRow {
                                book: copy.book.title,
                                status: copy.status,
                                due_back: copy.due_back,
                                id: copy.id,
                            }
                        })
                        .collect(),
                )
            },
        )
        .await
    }

    pub async fn get_book_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await
    }

    pub async fn create_book_instance(&self, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.create(data).await?;
        tracing::info!("Created copy {} of book {}", instance.id, instance.book_id);
        Ok(instance)
    }

    pub async fn update_book_instance(
        &self,
        id: Uuid,
        data: &BookInstanceInput,
    ) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.update(id, data).await?;
        tracing::info!("Updated copy {} (status {})", id, instance.status);
        Ok(instance)
    }

    pub async fn delete_book_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        tracing::info!("Deleted copy {}", id);
        Ok(())
    }
}

fn book_detail(book: Book, genres: Vec<Genre>, instances: Vec<BookInstance>) -> BookAdminDetail {
    BookAdminDetail {
        id: book.id,
        title: book.title,
        summary: book.summary,
        isbn: book.isbn,
        author_id: book.author_id,
        language_id: book.language_id,
        genre_ids: genres.into_iter().map(|g| g.id).collect(),
        instances,
    }
}

/// An author cannot die before being born
fn check_lifespan(data: &AuthorInput) -> AppResult<()> {
    match (data.date_of_birth, data.date_of_death) {
        (Some(born), Some(died)) if died < born => Err(AppError::Validation(
            "date_of_death: must not precede date_of_birth".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_instance_query_builds_filter() {
        let query = BookInstanceAdminQuery {
            page: None,
            status: Some(LoanStatus::OnLoan),
            due_back: Some(DueBackFilter::ThisYear),
        };
        let filter = query.filter(date(2024, 6, 1));

        assert_eq!(filter.status, Some(LoanStatus::OnLoan));
        assert_eq!(filter.borrower_id, None);
        assert_eq!(filter.due_from, Some(date(2024, 1, 1)));
        assert_eq!(filter.due_before, Some(date(2025, 1, 1)));
        assert_eq!(filter.has_due_date, None);

        let unfiltered = BookInstanceAdminQuery::default().filter(date(2024, 6, 1));
        assert_eq!(unfiltered.status, None);
        assert_eq!(unfiltered.due_from, None);
    }

    #[test]
    fn test_lifespan_check() {
        let mut input = AuthorInput {
            first_name: "Mary".to_string(),
            last_name: "Shelley".to_string(),
            date_of_birth: Some(date(1797, 8, 30)),
            date_of_death: Some(date(1851, 2, 1)),
        };
        assert!(check_lifespan(&input).is_ok());

        input.date_of_death = Some(date(1700, 1, 1));
        assert!(matches!(check_lifespan(&input), Err(AppError::Validation(_))));

        input.date_of_birth = None;
        assert!(check_lifespan(&input).is_ok());
    }

    #[test]
    fn test_book_detail_collects_genre_ids() {
        let book = Book {
            id: 4,
            title: "Frankenstein".to_string(),
            summary: String::new(),
            isbn: "9780141439471".to_string(),
            author_id: Some(1),
            language_id: None,
        };
        let genres = vec![
            Genre {
                id: 2,
                name: "Gothic".to_string(),
            },
            Genre {
                id: 5,
                name: "Horror".to_string(),
            },
        ];

        let detail = book_detail(book, genres, vec![]);
        assert_eq!(detail.genre_ids, vec![2, 5]);
        assert!(detail.instances.is_empty());
    }
}
