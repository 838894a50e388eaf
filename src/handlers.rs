use crate::{
    AppState,
    auth::verify_credentials,
    content::calculate_reading_time,
    error::{AppError, AppResult},
    guard::{self, RouteClass},
    locale::Locale,
    models::{
        AboutPage, ArticleCard, ArticleEditor, ArticleKey, ArticleOrder, ArticlePage,
        ArticleQuery, ArticleView, BlogListing, DashboardStats, HomePage, LoginForm, LoginPage,
    },
    repository::RepositoryState,
    session::{AdminSession, create_session, delete_session},
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use uuid::Uuid;

/// Number of articles shown on the home page.
pub const HOME_ARTICLE_COUNT: i64 = 3;

// --- Query Structs ---

/// BlogFilter
///
/// Query parameters accepted by the blog listing. Blank values are ignored.
#[derive(Debug, Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlogFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    /// Case-insensitive substring over title and excerpt.
    pub search: Option<String>,
}

/// AdminArticleFilter
///
/// Query parameters accepted by the admin article list.
#[derive(Debug, Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminArticleFilter {
    /// `published` or `draft`; anything else lists every article.
    pub filter: Option<String>,
    /// Case-insensitive substring over the title only.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginParams {
    /// Admin path to return to after a successful login.
    pub from: Option<String>,
}

fn resolve_locale(code: &str) -> AppResult<Locale> {
    Locale::from_code(code).ok_or(AppError::NotFound)
}

fn card(article: ArticleView) -> ArticleCard {
    let reading_time = calculate_reading_time(&article.content);
    ArticleCard { article, reading_time }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// --- Public Handlers ---

/// home_page
///
/// [Public Route] The three most recently published articles.
#[utoipa::path(
    get,
    path = "/{locale}",
    params(("locale" = String, Path, description = "Locale code, `en` or `ar`")),
    responses(
        (status = 200, description = "Home page", body = HomePage),
        (status = 404, description = "Unsupported locale")
    )
)]
pub async fn home_page(
    State(repo): State<RepositoryState>,
    Path(locale): Path<String>,
) -> AppResult<Json<HomePage>> {
    let locale = resolve_locale(&locale)?;

    let latest = repo
        .list_articles(ArticleQuery {
            published: Some(true),
            limit: Some(HOME_ARTICLE_COUNT),
            ..Default::default()
        })
        .await?;

    Ok(Json(HomePage {
        locale: locale.code().to_string(),
        direction: locale.direction().to_string(),
        latest_articles: latest.into_iter().map(card).collect(),
    }))
}

/// blog_listing
///
/// [Public Route] Published articles narrowed by category, tag and search, plus
/// every category for the filter bar.
#[utoipa::path(
    get,
    path = "/{locale}/blog",
    params(("locale" = String, Path, description = "Locale code"), BlogFilter),
    responses(
        (status = 200, description = "Blog listing", body = BlogListing),
        (status = 404, description = "Unsupported locale")
    )
)]
pub async fn blog_listing(
    State(repo): State<RepositoryState>,
    Path(locale): Path<String>,
    Query(filter): Query<BlogFilter>,
) -> AppResult<Json<BlogListing>> {
    let locale = resolve_locale(&locale)?;
    let category = non_blank(filter.category);
    let tag = non_blank(filter.tag);
    let search = non_blank(filter.search);

    let articles = repo
        .list_articles(ArticleQuery {
            published: Some(true),
            category: category.clone(),
            tag: tag.clone(),
            search: search.clone(),
            ..Default::default()
        })
        .await?;
    let categories = repo.list_categories().await?;

    let articles: Vec<ArticleCard> = articles.into_iter().map(card).collect();
    Ok(Json(BlogListing {
        locale: locale.code().to_string(),
        direction: locale.direction().to_string(),
        count: articles.len(),
        articles,
        categories,
        active_category: category,
        active_tag: tag,
        search,
    }))
}

/// article_page
///
/// [Public Route] A single published article. Drafts are reported as missing.
#[utoipa::path(
    get,
    path = "/{locale}/blog/{slug}",
    params(
        ("locale" = String, Path, description = "Locale code"),
        ("slug" = String, Path, description = "Article slug")
    ),
    responses(
        (status = 200, description = "Article", body = ArticlePage),
        (status = 404, description = "Unknown or unpublished article")
    )
)]
pub async fn article_page(
    State(repo): State<RepositoryState>,
    Path((locale, slug)): Path<(String, String)>,
) -> AppResult<Json<ArticlePage>> {
    let locale = resolve_locale(&locale)?;

    let article = repo
        .get_article(ArticleKey::Slug(slug))
        .await?
        .filter(|a| a.published)
        .ok_or(AppError::NotFound)?;

    let author_name = repo.get_user(article.author_id).await?.map(|u| u.name);
    let reading_time = calculate_reading_time(&article.content);

    Ok(Json(ArticlePage {
        locale: locale.code().to_string(),
        direction: locale.direction().to_string(),
        article,
        author_name,
        reading_time,
    }))
}

/// about_page
///
/// [Public Route] Static about text in the requested locale.
#[utoipa::path(
    get,
    path = "/{locale}/about",
    params(("locale" = String, Path, description = "Locale code")),
    responses(
        (status = 200, description = "About page", body = AboutPage),
        (status = 404, description = "Unsupported locale")
    )
)]
pub async fn about_page(Path(locale): Path<String>) -> AppResult<Json<AboutPage>> {
    let locale = resolve_locale(&locale)?;

    let (title, body) = match locale {
        Locale::En => (
            "About",
            "A blog about web development, design and the tools we build with.",
        ),
        Locale::Ar => (
            "من نحن",
            "مدونة عن تطوير الويب والتصميم والأدوات التي نبني بها.",
        ),
    };

    Ok(Json(AboutPage {
        locale: locale.code().to_string(),
        direction: locale.direction().to_string(),
        title: title.to_string(),
        body: body.to_string(),
    }))
}

// --- Login Surface ---

/// login_page
///
/// [Public Route] Describes the login form, carrying `from` through.
#[utoipa::path(
    get,
    path = "/admin/login",
    params(LoginParams),
    responses((status = 200, description = "Login form", body = LoginPage))
)]
pub async fn login_page(Query(params): Query<LoginParams>) -> Json<LoginPage> {
    Json(LoginPage {
        action: guard::LOGIN_PATH.to_string(),
        from: non_blank(params.from),
    })
}

/// login
///
/// [Public Route] Checks the credentials and opens a session. The redirect target
/// is `from` only when it points back into the admin area.
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirected"),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide both email and password".to_string(),
        ));
    }

    let user = verify_credentials(state.repo.as_ref(), email, &form.password)
        .await?
        .ok_or_else(|| {
            tracing::info!(email, "rejected admin login");
            AppError::InvalidCredentials
        })?;

    let target = form
        .from
        .filter(|from| guard::classify(from) == RouteClass::Admin)
        .filter(|from| HeaderValue::try_from(from.as_str()).is_ok())
        .unwrap_or_else(|| guard::ADMIN_PREFIX.to_string());

    tracing::info!(user_id = %user.id, "admin logged in");
    let cookie = create_session(user.id, state.config.secure_cookies());
    Ok(([(header::SET_COOKIE, cookie.to_string())], Redirect::to(&target)))
}

/// logout
///
/// [Admin Route] Clears the session cookie and returns to the site root.
#[utoipa::path(
    post,
    path = "/admin/logout",
    responses((status = 303, description = "Logged out"))
)]
pub async fn logout(AdminSession(session): AdminSession) -> impl IntoResponse {
    tracing::info!(user_id = %session.user_id, "admin logged out");
    (
        [(header::SET_COOKIE, delete_session().to_string())],
        Redirect::to("/"),
    )
}

// --- Admin Views ---

/// dashboard
///
/// [Admin Route] Article counters and the five most recently created articles.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Dashboard", body = DashboardStats))
)]
pub async fn dashboard(
    _session: AdminSession,
    State(repo): State<RepositoryState>,
) -> AppResult<Json<DashboardStats>> {
    Ok(Json(repo.get_stats().await?))
}

/// admin_articles
///
/// [Admin Route] Articles newest first, drafts included unless `filter`
/// narrows them by publication state.
#[utoipa::path(
    get,
    path = "/admin/articles",
    params(AdminArticleFilter),
    responses((status = 200, description = "Matching articles", body = [ArticleView]))
)]
pub async fn admin_articles(
    _session: AdminSession,
    State(repo): State<RepositoryState>,
    Query(params): Query<AdminArticleFilter>,
) -> AppResult<Json<Vec<ArticleView>>> {
    let published = match non_blank(params.filter).as_deref() {
        Some("published") => Some(true),
        Some("draft") => Some(false),
        _ => None,
    };

    let mut articles = repo
        .list_articles(ArticleQuery {
            published,
            order: ArticleOrder::CreatedDesc,
            ..Default::default()
        })
        .await?;

    if let Some(needle) = non_blank(params.search).map(|s| s.to_lowercase()) {
        articles.retain(|a| a.title.to_lowercase().contains(&needle));
    }
    Ok(Json(articles))
}

/// new_article_form
///
/// [Admin Route] Categories and tags available to a new article.
#[utoipa::path(
    get,
    path = "/admin/articles/new",
    responses((status = 200, description = "Empty editor", body = ArticleEditor))
)]
pub async fn new_article_form(
    _session: AdminSession,
    State(repo): State<RepositoryState>,
) -> AppResult<Json<ArticleEditor>> {
    Ok(Json(ArticleEditor {
        article: None,
        categories: repo.list_categories().await?,
        tags: repo.list_tags().await?,
    }))
}

/// edit_article_form
///
/// [Admin Route] An existing article with the selectable categories and tags.
#[utoipa::path(
    get,
    path = "/admin/articles/{id}/edit",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 200, description = "Populated editor", body = ArticleEditor),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn edit_article_form(
    _session: AdminSession,
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ArticleEditor>> {
    let article = repo
        .get_article(ArticleKey::Id(id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ArticleEditor {
        article: Some(article),
        categories: repo.list_categories().await?,
        tags: repo.list_tags().await?,
    }))
}

/// Fallback for paths no route claims, answered in the same JSON error shape.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
