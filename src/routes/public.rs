use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. Reading pages sit under a locale
/// segment; unprefixed paths never get here because the guard redirects them.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET/POST /admin/login
        // Form descriptor and credential check. Exempt from the session check.
        .route("/admin/login", get(handlers::login_page).post(handlers::login))
        // GET /{locale}
        .route("/{locale}", get(handlers::home_page))
        // GET /{locale}/blog?category=...&tag=...&search=...
        .route("/{locale}/blog", get(handlers::blog_listing))
        // GET /{locale}/blog/{slug}
        // Drafts answer 404 just like unknown slugs.
        .route("/{locale}/blog/{slug}", get(handlers::article_page))
        .route("/{locale}/about", get(handlers::about_page))
}
