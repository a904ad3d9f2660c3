//! Book instance (a physical, loanable copy) model and related types

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Current date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Availability of a copy; stored as a single character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    /// Database code
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On Loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    /// Accepts the database code or the snake_case name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m" | "maintenance" => Ok(LoanStatus::Maintenance),
            "o" | "on_loan" => Ok(LoanStatus::OnLoan),
            "a" | "available" => Ok(LoanStatus::Available),
            "r" | "reserved" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<'r, Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Book instance row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Unique ID for this copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    /// Overdue when a due date is set and lies before `today`
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(today())
    }
}

pub(crate) fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map_or(false, |due| due < today)
}

/// A copy as listed under its book
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookCopy {
    pub id: Uuid,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

impl BookCopy {
    pub fn new(instance: BookInstance, today: NaiveDate) -> Self {
        Self {
            is_overdue: instance.is_overdue_on(today),
            id: instance.id,
            imprint: instance.imprint,
            due_back: instance.due_back,
            status: instance.status,
        }
    }
}

/// Minimal book reference for copy listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookRef {
    pub id: i32,
    pub title: String,
}

/// Borrower reference for librarian listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowerRef {
    pub id: i32,
    pub username: String,
}

/// Internal row structure for copies joined with their book and borrower
#[derive(Debug, Clone, FromRow)]
pub struct LoanedCopyRow {
    id: Uuid,
    book_id: i32,
    book_title: String,
    imprint: String,
    due_back: Option<NaiveDate>,
    status: LoanStatus,
    borrower_id: Option<i32>,
    borrower_username: Option<String>,
}

impl LoanedCopyRow {
    pub fn into_copy(self, today: NaiveDate) -> LoanedCopy {
        let borrower = match (self.borrower_id, self.borrower_username) {
            (Some(id), Some(username)) => Some(BorrowerRef { id, username }),
            _ => None,
        };
        LoanedCopy {
            id: self.id,
            book: BookRef {
                id: self.book_id,
                title: self.book_title,
            },
            imprint: self.imprint,
            due_back: self.due_back,
            status: self.status,
            is_overdue: is_overdue(self.due_back, today),
            borrower,
        }
    }
}

/// Copy with its book title and borrower, as shown in loan listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanedCopy {
    pub id: Uuid,
    pub book: BookRef,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub is_overdue: bool,
    pub borrower: Option<BorrowerRef>,
}

impl LoanedCopy {
    /// "{id} ({title})"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.id, self.book.title)
    }
}

/// Create or update book instance request. The id is never accepted from clients.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInstanceInput {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    #[serde(default)]
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}
