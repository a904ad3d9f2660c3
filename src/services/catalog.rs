//! Catalog browsing service: dashboard counts, books and authors

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail, AuthorRef},
        book::{BookDetail, BookSummary},
        book_instance::{today, BookCopy, LoanStatus},
        pagination::{ListConfig, Page},
    },
    repository::{book_instances::InstanceFilter, Repository},
    services::{paginate, sessions::Session},
};

/// Book listing: by title, then by author name
pub const BOOK_LIST: ListConfig = ListConfig {
    page_size: 2,
    order_by: "b.title, a.last_name, a.first_name, b.id",
};

pub const AUTHOR_LIST: ListConfig = ListConfig {
    page_size: 10,
    order_by: "last_name, first_name, id",
};

/// Session key holding the visit counter
pub const NUM_VISITS_KEY: &str = "num_visits";

/// Word counted in book titles on the dashboard
const TITLE_WORD: &str = "the";

/// Dashboard figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    /// Books with "the" anywhere in the title, ignoring case
    pub num_books_with_the: i64,
}

/// Count this visit and return how many visits the session made before it
pub async fn record_visit(session: &mut Session) -> AppResult<i64> {
    let visits: i64 = session.get(NUM_VISITS_KEY)?.unwrap_or(0);
    session.insert(NUM_VISITS_KEY, visits + 1)?;
    session.save().await?;
    Ok(visits)
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Aggregate counts for the home page
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let available = InstanceFilter {
            status: Some(LoanStatus::Available),
            ..Default::default()
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_filtered(&available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_books_with_the: self.repository.books.count_title_contains(TITLE_WORD).await?,
        })
    }

    /// One page of the book listing
    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Page<BookSummary>> {
        let books = &self.repository.books;
        paginate(
            &BOOK_LIST,
            page,
            || books.count(),
            |limit, offset| books.list(BOOK_LIST.order_by, limit, offset),
        )
        .await
    }

    /// Book with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(AuthorRef::from(
                self.repository.authors.get_by_id(author_id).await?,
            )),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };
        let genres = self.repository.genres.list_for_book(book.id).await?;

        let today = today();
        let copies = self
            .repository
            .book_instances
            .list_for_book(book.id)
            .await?
            .into_iter()
            .map(|instance| BookCopy::new(instance, today))
            .collect();

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            copies,
        })
    }

    /// One page of the author listing
    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Page<Author>> {
        let authors = &self.repository.authors;
        paginate(
            &AUTHOR_LIST,
            page,
            || authors.count(),
            |limit, offset| authors.list(AUTHOR_LIST.order_by, limit, offset),
        )
        .await
    }

    /// Author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(author.id).await?;
        Ok(AuthorDetail::new(author, books))
    }
}
