//! Business logic services

pub mod admin;
pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;
pub mod users;

use std::future::Future;
use std::sync::Arc;

use utoipa::ToSchema;

use crate::{
    config::AuthConfig,
    error::AppResult,
    models::pagination::{ListConfig, Page, Pagination},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub admin: admin::AdminService,
    pub sessions: Arc<dyn sessions::SessionStore>,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        sessions: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            admin: admin::AdminService::new(repository.clone()),
            sessions,
            repository,
        }
    }
}

/// Run a paginated listing: count, validate the requested page, then fetch it
pub async fn paginate<T, C, CFut, F, FFut>(
    config: &ListConfig,
    page: Option<i64>,
    count: C,
    fetch: F,
) -> AppResult<Page<T>>
where
    T: for<'a> ToSchema<'a>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = AppResult<i64>>,
    F: FnOnce(i64, i64) -> FFut,
    FFut: Future<Output = AppResult<Vec<T>>>,
{
    let total = count().await?;
    let pagination = Pagination::new(page, config.page_size, total)?;
    let items = fetch(pagination.limit(), pagination.offset()).await?;
    Ok(Page::new(items, pagination))
}
