use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use cookie::{Cookie, SameSite, time::Duration};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::Role, repository::RepositoryState};

/// Name of the cookie carrying the admin session.
pub const SESSION_COOKIE_NAME: &str = "admin_session";

/// Lifetime of a session cookie.
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// SessionDescriptor
///
/// The authenticated identity resolved from a valid session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionDescriptor {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// create_session
///
/// Builds the cookie that opens a session for `user_id`. There is no server-side
/// session record; the cookie value is the user id itself.
pub fn create_session(user_id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, user_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
        .path("/")
        .build()
}

/// Builds an expired cookie that clears the session in the browser.
pub fn delete_session() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Returns the value of the cookie `name` from the request headers, if any.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// get_session
///
/// Resolves the session cookie to a descriptor. A missing or malformed cookie, an
/// unknown user, a non-admin role and a storage failure all degrade to `None`.
pub async fn get_session(headers: &HeaderMap, repo: &RepositoryState) -> Option<SessionDescriptor> {
    let raw = read_cookie(headers, SESSION_COOKIE_NAME)?;
    let user_id = Uuid::parse_str(raw.trim()).ok()?;

    let user = match repo.get_user(user_id).await {
        Ok(user) => user?,
        Err(e) => {
            tracing::error!("session lookup failed: {e}");
            return None;
        }
    };

    if user.role != Role::Admin {
        return None;
    }

    Some(SessionDescriptor {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

/// AdminSession
///
/// Extractor required by every mutation action. Reuses the descriptor the route
/// guard stored in the request extensions, or validates the cookie itself when the
/// guard did not run. Rejects with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionDescriptor);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<SessionDescriptor>() {
            return Ok(AdminSession(session.clone()));
        }

        let repo = RepositoryState::from_ref(state);
        get_session(&parts.headers, &repo)
            .await
            .map(AdminSession)
            .ok_or(AppError::Unauthorized)
    }
}
