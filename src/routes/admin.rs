use crate::{AppState, actions, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// The CMS. Every path here is under `/admin`, so the route guard has already
/// resolved a session before a handler runs; handlers still take `AdminSession`
/// so none of them can be mounted unguarded by mistake.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Dashboard counters and recent articles.
        .route("/admin", get(handlers::dashboard))
        .route("/admin/logout", post(handlers::logout))
        // GET /admin/articles lists everything, drafts included.
        // POST /admin/articles creates from a multipart form.
        .route(
            "/admin/articles",
            get(handlers::admin_articles).post(actions::create_article),
        )
        .route("/admin/articles/new", get(handlers::new_article_form))
        // GET /admin/articles/{id} renders the editor, POST updates.
        .route(
            "/admin/articles/{id}",
            get(handlers::edit_article_form).post(actions::update_article),
        )
        .route("/admin/articles/{id}/edit", get(handlers::edit_article_form))
        .route("/admin/articles/{id}/delete", post(actions::delete_article))
        .route(
            "/admin/articles/{id}/toggle-publish",
            post(actions::toggle_publish),
        )
}
