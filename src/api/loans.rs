//! Loan listings and renewal endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::LoanedCopy,
        pagination::{Page, PageQuery},
    },
    services::loans::{RenewalForm, RenewalOutcome, RenewalRequest},
    AppState,
};

use super::{AuthenticatedUser, Authorized, CanMarkReturned};

/// Where a successful renewal sends the librarian
pub const BORROWED_URL: &str = "/catalog/borrowed";

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/catalog/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Current user's loans, soonest due first", body = Page<LoanedCopy>),
        (status = 303, description = "Not logged in; redirected to the login route"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanedCopy>>> {
    let page = state.services.loans.my_loans(claims.user_id, query.page).await?;
    Ok(Json(page))
}

/// Every copy on loan, with its borrower
#[utoipa::path(
    get,
    path = "/catalog/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans, soonest due first", body = Page<LoanedCopy>),
        (status = 303, description = "Not logged in; redirected to the login route"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    _: Authorized<CanMarkReturned>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanedCopy>>> {
    let page = state.services.loans.all_loans(query.page).await?;
    Ok(Json(page))
}

/// Renewal form proposing a due date three weeks from today
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 303, description = "Not logged in; redirected to the login route"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    _: Authorized<CanMarkReturned>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    let form = state.services.loans.renewal_form(id).await?;
    Ok(Json(form))
}

/// Set a new due date on a copy
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewalRequest,
    responses(
        (status = 303, description = "Renewed; redirected to the list of all loans"),
        (status = 403, description = "Missing catalog.can_mark_returned"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Date refused; the form is returned with its errors", body = RenewalForm)
    )
)]
pub async fn renew_book(
    State(state): State<AppState>,
    _: Authorized<CanMarkReturned>,
    Path(id): Path<Uuid>,
    body: Result<Json<RenewalRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = match body {
        Ok(Json(request)) => Some(request),
        Err(rejection) => {
            tracing::debug!("Unreadable renewal submission: {}", rejection.body_text());
            None
        }
    };

    match state.services.loans.renew(id, request).await? {
        RenewalOutcome::Renewed(_) => Ok(Redirect::to(BORROWED_URL).into_response()),
        RenewalOutcome::Rejected(form) => {
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(form)).into_response())
        }
    }
}
