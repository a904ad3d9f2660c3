//! Loan listings and the renewal workflow

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{today, LoanedCopy},
        pagination::{ListConfig, Page},
    },
    repository::{book_instances::InstanceFilter, Repository},
    services::paginate,
};

/// Latest allowed renewal, in weeks from today
pub const RENEWAL_MAX_WEEKS: i64 = 4;

/// Renewal date proposed by the form
pub const RENEWAL_DEFAULT_WEEKS: i64 = 3;

/// Form field carrying the proposed due date
pub const RENEWAL_DATE_FIELD: &str = "renewal_date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Copies borrowed by the current user, soonest due first
pub const LOANED_BY_USER: ListConfig = ListConfig {
    page_size: 10,
    order_by: "bi.due_back, bi.id",
};

/// Every copy on loan, soonest due first
pub const ALL_LOANED: ListConfig = ListConfig {
    page_size: 10,
    order_by: "bi.due_back, bi.id",
};

/// Reasons a submitted renewal date is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenewalError {
    #[error("This field is required.")]
    Required,

    #[error("Enter a valid date.")]
    Malformed,

    #[error("Invalid date - renewal in past")]
    InPast,

    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFar,
}

/// Validate a submitted renewal date against the window [today, today + 4 weeks]
pub fn clean_renewal_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, RenewalError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(RenewalError::Required);
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| RenewalError::Malformed)?;

    if date < today {
        return Err(RenewalError::InPast);
    }
    if date > today + Duration::weeks(RENEWAL_MAX_WEEKS) {
        return Err(RenewalError::TooFar);
    }

    Ok(date)
}

/// Renewal form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewalRequest {
    /// Proposed due date, `YYYY-MM-DD`
    #[schema(value_type = Option<String>)]
    pub renewal_date: Option<Value>,
}

impl RenewalRequest {
    /// Field value as echoed back in a rejected form
    fn submitted(&self) -> Option<String> {
        match &self.renewal_date {
            None => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Only a JSON string can hold a date
    fn clean(&self, today: NaiveDate) -> Result<NaiveDate, RenewalError> {
        match &self.renewal_date {
            None => clean_renewal_date(None, today),
            Some(Value::String(raw)) => clean_renewal_date(Some(raw.as_str()), today),
            Some(_) => Err(RenewalError::Malformed),
        }
    }
}

/// Renewal form as presented to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: LoanedCopy,
    /// Initial or submitted value of the date field
    pub renewal_date: Option<String>,
    /// Field name to error messages; empty when the form is valid
    pub errors: HashMap<String, Vec<String>>,
}

impl RenewalForm {
    fn initial(book_instance: LoanedCopy, today: NaiveDate) -> Self {
        let proposed = today + Duration::weeks(RENEWAL_DEFAULT_WEEKS);
        Self {
            book_instance,
            renewal_date: Some(proposed.format(DATE_FORMAT).to_string()),
            errors: HashMap::new(),
        }
    }

    fn rejected(book_instance: LoanedCopy, submitted: Option<String>, error: RenewalError) -> Self {
        let mut errors = HashMap::new();
        errors.insert(RENEWAL_DATE_FIELD.to_string(), vec![error.to_string()]);
        Self {
            book_instance,
            renewal_date: submitted,
            errors,
        }
    }
}

/// Result of a renewal submission
#[derive(Debug)]
pub enum RenewalOutcome {
    Renewed(NaiveDate),
    /// Nothing was changed; the form carries the field errors
    Rejected(RenewalForm),
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to a user
    pub async fn my_loans(&self, user_id: i32, page: Option<i64>) -> AppResult<Page<LoanedCopy>> {
        self.loaned(&LOANED_BY_USER, InstanceFilter::on_loan(Some(user_id)), page)
            .await
    }

    /// Copies on loan to anyone, with their borrowers
    pub async fn all_loans(&self, page: Option<i64>) -> AppResult<Page<LoanedCopy>> {
        self.loaned(&ALL_LOANED, InstanceFilter::on_loan(None), page).await
    }

    async fn loaned(
        &self,
        config: &ListConfig,
        filter: InstanceFilter,
        page: Option<i64>,
    ) -> AppResult<Page<LoanedCopy>> {
        let instances = &self.repository.book_instances;
        let filter = &filter;
        let today = today();
        paginate(
            config,
            page,
            || instances.count_filtered(filter),
            |limit, offset| async move {
                let rows = instances
                    .list_filtered(filter, config.order_by, limit, offset)
                    .await?;
                Ok::<Vec<LoanedCopy>, AppError>(
                    rows.into_iter().map(|row| row.into_copy(today)).collect(),
                )
            },
        )
        .await
    }

    /// Form for renewing a copy, proposing a due date three weeks out
    pub async fn renewal_form(&self, id: Uuid) -> AppResult<RenewalForm> {
        let today = today();
        let copy = self
            .repository
            .book_instances
            .get_loaned_copy(id)
            .await?
            .into_copy(today);
        Ok(RenewalForm::initial(copy, today))
    }

    /// Validate the submitted date and, when it is acceptable, set it as the new due date.
    /// `None` stands for a body that could not be read as a submission.
    pub async fn renew(&self, id: Uuid, request: Option<RenewalRequest>) -> AppResult<RenewalOutcome> {
        let today = today();
        let copy = self
            .repository
            .book_instances
            .get_loaned_copy(id)
            .await?
            .into_copy(today);

        let cleaned = match &request {
            Some(request) => request.clean(today),
            None => Err(RenewalError::Malformed),
        };
        let due_back = match cleaned {
            Ok(date) => date,
            Err(error) => {
                return Ok(RenewalOutcome::Rejected(RenewalForm::rejected(
                    copy,
                    request.and_then(|r| r.submitted()),
                    error,
                )))
            }
        };

        self.repository
            .book_instances
            .update_due_back(id, due_back)
            .await?;

        tracing::info!(
            "Renewed {} until {} (was {:?})",
            copy.display_name(),
            due_back,
            copy.due_back
        );

        Ok(RenewalOutcome::Renewed(due_back))
    }
}
