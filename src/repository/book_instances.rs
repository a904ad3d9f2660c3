//! Book instances (copies) repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceInput, LoanStatus, LoanedCopyRow},
};

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, status, borrower_id";

const LOANED_COPY_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back, bi.status,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// Filters for copy listings; every field narrows the result
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<i32>,
    /// Inclusive lower bound on due_back
    pub due_from: Option<NaiveDate>,
    /// Exclusive upper bound on due_back
    pub due_before: Option<NaiveDate>,
    /// Some(true) keeps copies with a due date, Some(false) those without
    pub has_due_date: Option<bool>,
}

impl InstanceFilter {
    /// Copies currently on loan, optionally to one borrower
    pub fn on_loan(borrower_id: Option<i32>) -> Self {
        Self {
            status: Some(LoanStatus::OnLoan),
            borrower_id,
            ..Default::default()
        }
    }

    /// WHERE clause with numbered placeholders starting at 1, and the index of the next one
    fn where_clause(&self) -> (String, usize) {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if self.status.is_some() {
            conditions.push(format!("bi.status = ${}", idx));
            idx += 1;
        }
        if self.borrower_id.is_some() {
            conditions.push(format!("bi.borrower_id = ${}", idx));
            idx += 1;
        }
        if self.due_from.is_some() {
            conditions.push(format!("bi.due_back >= ${}", idx));
            idx += 1;
        }
        if self.due_before.is_some() {
            conditions.push(format!("bi.due_back < ${}", idx));
            idx += 1;
        }
        match self.has_due_date {
            Some(true) => conditions.push("bi.due_back IS NOT NULL".to_string()),
            Some(false) => conditions.push("bi.due_back IS NULL".to_string()),
            None => {}
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, idx)
    }
}

/// Bind filter values in the same order `where_clause` numbered them
macro_rules! bind_filter {
    ($builder:expr, $filter:expr) => {{
        let mut builder = $builder;
        if let Some(status) = $filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = $filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(from) = $filter.due_from {
            builder = builder.bind(from);
        }
        if let Some(before) = $filter.due_before {
            builder = builder.bind(before);
        }
        builder
    }};
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Count all copies
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count copies matching a filter
    pub async fn count_filtered(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let (where_clause, _) = filter.where_clause();
        let query = format!("SELECT COUNT(*) FROM book_instances bi {}", where_clause);
        let count: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&query), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One page of copies matching a filter, joined with book title and borrower
    pub async fn list_filtered(
        &self,
        filter: &InstanceFilter,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<LoanedCopyRow>> {
        let (where_clause, idx) = filter.where_clause();
        let query = format!(
            "{} {} ORDER BY {} LIMIT ${} OFFSET ${}",
            LOANED_COPY_SELECT,
            where_clause,
            order_by,
            idx,
            idx + 1
        );
        let rows = bind_filter!(sqlx::query_as::<_, LoanedCopyRow>(&query), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get copy by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("SELECT {} FROM book_instances WHERE id = $1", INSTANCE_COLUMNS);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Get copy by ID, joined with book title and borrower
    pub async fn get_loaned_copy(&self, id: Uuid) -> AppResult<LoanedCopyRow> {
        let query = format!("{} WHERE bi.id = $1", LOANED_COPY_SELECT);
        sqlx::query_as::<_, LoanedCopyRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Copies of a book, ordered by due date
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "SELECT {} FROM book_instances WHERE book_id = $1 ORDER BY due_back, id",
            INSTANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Set the due date of a copy
    pub async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Create a copy with a freshly generated ID
    pub async fn create(&self, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        let row = sqlx::query_as::<_, BookInstance>(&query)
            .bind(Uuid::new_v4())
            .bind(data.book_id)
            .bind(&data.imprint)
            .bind(data.due_back)
            .bind(data.status)
            .bind(data.borrower_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Update every field of a copy except its ID
    pub async fn update(&self, id: Uuid, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, status = $4, borrower_id = $5
            WHERE id = $6
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(data.book_id)
            .bind(&data.imprint)
            .bind(data.due_back)
            .bind(data.status)
            .bind(data.borrower_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}
