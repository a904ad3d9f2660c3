//! Book model (a title, not a specific copy) and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::AuthorRef, book_instance::BookCopy, genre::Genre, language::Language};

/// Genres shown in the admin "Genre" column
const DISPLAY_GENRE_LIMIT: usize = 3;

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
}

/// Internal row structure for book listings joined with their author
#[derive(Debug, Clone, FromRow)]
pub struct BookSummaryRow {
    id: i32,
    title: String,
    author_id: Option<i32>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        BookSummary {
            id: row.id,
            title: row.title,
            author: AuthorRef::from_columns(row.author_id, row.author_first_name, row.author_last_name),
        }
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorRef>,
}

/// Book with its author, language, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorRef>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub copies: Vec<BookCopy>,
}

/// Comma-separated names of the first few genres
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(DISPLAY_GENRE_LIMIT)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create or update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_display_genre_truncates_to_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Poetry"),
            genre(3, "Science Fiction"),
            genre(4, "Horror"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Poetry, Science Fiction");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn test_book_input_validation() {
        let input = BookInput {
            title: "The Dispossessed".to_string(),
            summary: String::new(),
            isbn: "97800609123456".to_string(),
            author_id: None,
            language_id: None,
            genre_ids: vec![],
        };
        // 14 characters is one too many
        assert!(input.validate().is_err());

        let input = BookInput {
            isbn: "9780060512750".to_string(),
            ..input
        };
        assert!(input.validate().is_ok());
    }
}
