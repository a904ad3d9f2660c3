//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "First, Last" as shown in listings
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.first_name, self.last_name)
    }
}

/// Author reference embedded in book payloads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl AuthorRef {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.first_name, self.last_name)
    }

    /// Build a reference from the nullable columns of a LEFT JOIN
    pub fn from_columns(
        id: Option<i32>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Option<Self> {
        id.map(|id| AuthorRef {
            id,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
        })
    }
}

impl From<Author> for AuthorRef {
    fn from(author: Author) -> Self {
        AuthorRef {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
        }
    }
}

/// Author with the books they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub books: Vec<BookSummary>,
}

impl AuthorDetail {
    pub fn new(author: Author, books: Vec<BookSummary>) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            books,
        }
    }
}

/// Create or update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorInput {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let author = Author {
            id: 1,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert_eq!(author.display_name(), "Ursula, Le Guin");
        assert_eq!(AuthorRef::from(author).display_name(), "Ursula, Le Guin");
    }

    #[test]
    fn test_ref_from_left_join_columns() {
        assert!(AuthorRef::from_columns(None, None, None).is_none());

        let author = AuthorRef::from_columns(Some(3), Some("Iain".into()), Some("Banks".into()))
            .unwrap();
        assert_eq!(author.id, 3);
        assert_eq!(author.last_name, "Banks");
    }
}
