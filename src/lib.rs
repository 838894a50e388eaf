use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod actions;
pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod locale;
pub mod models;
pub mod repository;
pub mod revalidate;
pub mod seed;
pub mod session;
pub mod storage;

pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{RepositoryState, SqliteRepository};
pub use revalidate::{LogRevalidator, RevalidatorState};
pub use storage::{LocalDiskStorage, MockStorageService, S3StorageClient, StorageState};

/// Largest accepted request body; cover image uploads travel in it.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// ApiDoc
///
/// OpenAPI document for every page and action, served at `/api-docs/openapi.json`
/// and browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home_page, handlers::blog_listing, handlers::article_page,
        handlers::about_page, handlers::login_page, handlers::login, handlers::logout,
        handlers::dashboard, handlers::admin_articles, handlers::new_article_form,
        handlers::edit_article_form, actions::create_article, actions::update_article,
        actions::delete_article, actions::toggle_publish
    ),
    components(
        schemas(
            models::ArticleView, models::Category, models::Tag, models::Role,
            models::ArticleCard, models::HomePage, models::BlogListing, models::ArticlePage,
            models::AboutPage, models::ArticleEditor, models::DashboardStats,
            models::LoginForm, models::LoginPage, session::SessionDescriptor,
        )
    ),
    tags(
        (name = "inkwell-blog", description = "Blog reading surface and admin CMS")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Everything a handler may need, cloned cheaply per request. Handlers pull out
/// only the piece they use through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Content store access.
    pub repo: RepositoryState,
    /// Cover image backend (local disk or S3).
    pub storage: StorageState,
    /// Invalidation hook run after every mutation.
    pub revalidator: RevalidatorState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for RevalidatorState {
    fn from_ref(app_state: &AppState) -> RevalidatorState {
        app_state.revalidator.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles every route, wraps them in the route guard and the observability
/// layers, and binds the state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(admin::admin_routes())
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(handlers::not_found)
        // The guard sees every request, including ones that match no route, so
        // unprefixed public paths are redirected before routing.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by the `x-request-id` set upstream.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
