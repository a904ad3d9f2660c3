//! API handlers for catalog endpoints

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    config::SessionConfig,
    error::AppError,
    models::user::{UserClaims, CAN_MARK_RETURNED},
    services::sessions::Session,
    AppState,
};

/// Path and query of the request, used as the post-login destination
fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// Bearer token from the Authorization header
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extractor for authenticated user from JWT token.
/// Requests without a valid token are sent to the login route.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let login_required = || AppError::LoginRequired {
            next: requested_path(parts),
        };

        let token = bearer_token(parts).ok_or_else(login_required)?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            login_required()
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

/// A named permission grant checked by `Authorized`
pub trait Permission {
    const CODENAME: &'static str;
}

/// May list every loan and renew copies
pub struct CanMarkReturned;

impl Permission for CanMarkReturned {
    const CODENAME: &'static str = CAN_MARK_RETURNED;
}

/// Authenticated user holding permission `P`; others get 403
pub struct Authorized<P>(pub UserClaims, PhantomData<fn() -> P>);

#[async_trait]
impl<P> FromRequestParts<AppState> for Authorized<P>
where
    P: Permission + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        claims.require_permission(P::CODENAME)?;
        Ok(Authorized(claims, PhantomData))
    }
}

/// Authenticated user with access to the admin surface
pub struct StaffUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        claims.require_staff()?;
        Ok(StaffUser(claims))
    }
}

/// The client's session, resumed from its cookie or newly started
pub struct ClientSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let config = &state.config.session;
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar.get(&config.cookie_name).map(|c| c.value().to_string());

        let session = Session::load(
            state.services.sessions.clone(),
            config.ttl_seconds,
            session_id.as_deref(),
        )
        .await?;

        Ok(ClientSession(session))
    }
}

/// Cookie carrying a session id back to the client
pub fn session_cookie(config: &SessionConfig, session: &Session) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session.id().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Add the session cookie to `jar` when the client does not hold it yet
pub fn with_session_cookie(jar: CookieJar, config: &SessionConfig, session: &Session) -> CookieJar {
    if session.is_new() {
        jar.add(session_cookie(config, session))
    } else {
        jar
    }
}
