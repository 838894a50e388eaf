use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Schemas (Mapped to Database) ---

/// Role
///
/// `ADMIN` is the only privileged role. Any other stored value is treated as a
/// regular user and never grants a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == "ADMIN" { Role::Admin } else { Role::User }
    }
}

/// User
///
/// Row of the `users` table. The password column holds an Argon2 PHC string and is
/// never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Article
///
/// Raw row of the `articles` table. `published_at` is set on first publish and
/// never cleared afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// ArticleView
///
/// Denormalized article with its categories and tags flattened in, as consumed by
/// every page and admin view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

impl ArticleView {
    pub fn from_parts(article: Article, categories: Vec<Category>, tags: Vec<Tag>) -> Self {
        Self {
            id: article.id,
            title: article.title,
            slug: article.slug,
            excerpt: article.excerpt,
            content: article.content,
            cover_image: article.cover_image,
            published: article.published,
            published_at: article.published_at,
            author_id: article.author_id,
            created_at: article.created_at,
            updated_at: article.updated_at,
            categories,
            tags,
        }
    }
}

// --- Query Inputs ---

/// Lookup key for a single article.
#[derive(Debug, Clone)]
pub enum ArticleKey {
    Id(Uuid),
    Slug(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleOrder {
    /// Newest publication first (public pages).
    #[default]
    PublishedDesc,
    /// Newest creation first (admin pages).
    CreatedDesc,
}

/// ArticleQuery
///
/// `published` and `order` are pushed down to SQL. `category`, `tag` and `search`
/// are applied in memory over the loaded set.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub published: Option<bool>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub order: ArticleOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// --- Mutation Payloads ---

/// NewArticle
///
/// Fully resolved insert payload. The slug is derived by the caller.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// ArticleChanges
///
/// Update payload. `None` id lists leave memberships untouched; `Some` lists
/// replace them exactly.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub category_ids: Option<Vec<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// NewUser
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// LoginForm
///
/// Form body of `POST /admin/login`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub from: Option<String>,
}

// --- Page Schemas (Output) ---

/// DashboardStats
///
/// Output of `GET /admin`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_articles: i64,
    pub published_articles: i64,
    pub draft_articles: i64,
    pub recent_articles: Vec<ArticleView>,
}

/// ArticleCard
///
/// Listing entry: the article plus its estimated reading time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleCard {
    #[serde(flatten)]
    #[ts(flatten)]
    pub article: ArticleView,
    pub reading_time: u32,
}

/// HomePage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HomePage {
    pub locale: String,
    pub direction: String,
    pub latest_articles: Vec<ArticleCard>,
}

/// BlogListing
///
/// Output of `GET /{locale}/blog`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogListing {
    pub locale: String,
    pub direction: String,
    pub articles: Vec<ArticleCard>,
    pub count: usize,
    pub categories: Vec<Category>,
    pub active_category: Option<String>,
    pub active_tag: Option<String>,
    pub search: Option<String>,
}

/// ArticlePage
///
/// Output of `GET /{locale}/blog/{slug}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticlePage {
    pub locale: String,
    pub direction: String,
    pub article: ArticleView,
    pub author_name: Option<String>,
    pub reading_time: u32,
}

/// AboutPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AboutPage {
    pub locale: String,
    pub direction: String,
    pub title: String,
    pub body: String,
}

/// ArticleEditor
///
/// Data backing the admin create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleEditor {
    pub article: Option<ArticleView>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// LoginPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginPage {
    pub action: String,
    pub from: Option<String>,
}
