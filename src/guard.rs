use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    locale::{self, Locale},
    repository::RepositoryState,
    session::get_session,
};

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

/// Prefixes that bypass locale routing entirely.
const EXEMPT_PREFIXES: [&str; 5] = ["/api", "/health", "/swagger-ui", "/api-docs", "/uploads"];

/// RouteClass
///
/// What the guard does with a path, decided before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Admin page or action: requires a valid session.
    Admin,
    /// The login surface itself, always reachable.
    AdminLogin,
    /// API, docs, health and static assets: passed through untouched.
    Exempt,
    /// Public path already carrying a locale prefix.
    Localized(Locale),
    /// Public path without a locale prefix: redirected to one.
    Unlocalized,
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

pub fn classify(path: &str) -> RouteClass {
    if under(path, ADMIN_PREFIX) {
        return if under(path, LOGIN_PATH) {
            RouteClass::AdminLogin
        } else {
            RouteClass::Admin
        };
    }

    if EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p)) || path.contains('.') {
        return RouteClass::Exempt;
    }

    match locale::strip_locale(path) {
        Some((locale, _)) => RouteClass::Localized(locale),
        None => RouteClass::Unlocalized,
    }
}

/// Percent-encodes the characters that would break a query value. `/` is kept
/// readable.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Login location carrying the originally requested path in `from`.
pub fn login_redirect(path: &str) -> String {
    format!("{LOGIN_PATH}?from={}", encode_query_value(path))
}

/// Target of the locale redirect for an unprefixed public path.
pub fn localized_location(locale: Locale, path: &str, query: Option<&str>) -> String {
    let path = if path == "/" { "" } else { path };
    match query {
        Some(q) if !q.is_empty() => format!("/{}{}?{}", locale.code(), path, q),
        _ => format!("/{}{}", locale.code(), path),
    }
}

/// route_guard
///
/// Runs once per request before any page logic. Admin requests need a session
/// that resolves to a real admin user; the cookie's presence alone is not enough.
/// A valid descriptor is stored in the request extensions for `AdminSession`.
pub async fn route_guard(
    State(repo): State<RepositoryState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match classify(&path) {
        RouteClass::Admin => match get_session(request.headers(), &repo).await {
            Some(session) => {
                request.extensions_mut().insert(session);
                next.run(request).await
            }
            None => {
                tracing::info!(%path, "redirecting unauthenticated admin request");
                Redirect::temporary(&login_redirect(&path)).into_response()
            }
        },
        RouteClass::AdminLogin | RouteClass::Exempt | RouteClass::Localized(_) => {
            next.run(request).await
        }
        RouteClass::Unlocalized => {
            let locale = locale::detect(request.headers());
            let target = localized_location(locale, &path, request.uri().query());
            Redirect::temporary(&target).into_response()
        }
    }
}
