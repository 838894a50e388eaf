use crate::{
    content::ArticleFilter,
    error::{AppError, AppResult},
    models::{
        Article, ArticleChanges, ArticleKey, ArticleOrder, ArticleQuery, ArticleView, Category,
        DashboardStats, NewArticle, NewUser, Tag, User,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see
/// `Arc<dyn Repository>`; reads never mutate rows and every multi-statement
/// write runs inside a single transaction.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Articles: reads ---
    async fn list_articles(&self, query: ArticleQuery) -> AppResult<Vec<ArticleView>>;
    // Returns the row regardless of publish state; callers decide visibility.
    async fn get_article(&self, key: ArticleKey) -> AppResult<Option<ArticleView>>;
    async fn get_stats(&self) -> AppResult<DashboardStats>;

    // --- Articles: writes ---
    async fn create_article(&self, article: NewArticle) -> AppResult<ArticleView>;
    // Replaces category/tag memberships exactly when the id lists are given.
    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> AppResult<Option<ArticleView>>;
    async fn delete_article(&self, id: Uuid) -> AppResult<bool>;
    // Flips `published`; `published_at` is only ever set once.
    async fn toggle_publish(&self, id: Uuid) -> AppResult<Option<ArticleView>>;

    // --- Taxonomy ---
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn list_tags(&self) -> AppResult<Vec<Tag>>;
    async fn create_category(&self, name: &str, slug: &str) -> AppResult<Category>;
    async fn create_tag(&self, name: &str, slug: &str) -> AppResult<Tag>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    /// Teardown hook for the process-wide connection pool.
    async fn close(&self);
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const ARTICLE_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image, published, \
     published_at, author_id, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

/// connect_pool
///
/// Opens the SQLite pool with foreign keys enforced. An in-memory database lives
/// inside a single connection, so that case is pinned to one connection that is
/// never recycled.
pub async fn connect_pool(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool_options = if db_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

// --- Relational Shaping ---

#[derive(FromRow)]
struct CategoryLink {
    article_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

#[derive(FromRow)]
struct TagLink {
    article_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

/// shape_articles
///
/// Folds join rows into denormalized views. Article order is preserved; articles
/// without memberships get empty lists.
pub fn shape_articles(
    rows: Vec<Article>,
    category_links: Vec<(Uuid, Category)>,
    tag_links: Vec<(Uuid, Tag)>,
) -> Vec<ArticleView> {
    let mut categories: HashMap<Uuid, Vec<Category>> = HashMap::new();
    for (article_id, category) in category_links {
        categories.entry(article_id).or_default().push(category);
    }

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (article_id, tag) in tag_links {
        tags.entry(article_id).or_default().push(tag);
    }

    rows.into_iter()
        .map(|article| {
            let cats = categories.remove(&article.id).unwrap_or_default();
            let tgs = tags.remove(&article.id).unwrap_or_default();
            ArticleView::from_parts(article, cats, tgs)
        })
        .collect()
}

/// Loads the category/tag memberships of `rows` and shapes them into views.
async fn load_views(conn: &mut SqliteConnection, rows: Vec<Article>) -> Result<Vec<ArticleView>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT ac.article_id, c.id, c.name, c.slug \
         FROM article_categories ac JOIN categories c ON c.id = ac.category_id \
         WHERE ac.article_id IN (",
    );
    let mut ids = builder.separated(", ");
    for row in &rows {
        ids.push_bind(row.id);
    }
    builder.push(") ORDER BY c.name");
    let category_links = builder
        .build_query_as::<CategoryLink>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| (l.article_id, Category { id: l.id, name: l.name, slug: l.slug }))
        .collect();

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT atg.article_id, t.id, t.name, t.slug \
         FROM article_tags atg JOIN tags t ON t.id = atg.tag_id \
         WHERE atg.article_id IN (",
    );
    let mut ids = builder.separated(", ");
    for row in &rows {
        ids.push_bind(row.id);
    }
    builder.push(") ORDER BY t.name");
    let tag_links = builder
        .build_query_as::<TagLink>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| (l.article_id, Tag { id: l.id, name: l.name, slug: l.slug }))
        .collect();

    Ok(shape_articles(rows, category_links, tag_links))
}

async fn fetch_article(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn fetch_view(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<ArticleView>, sqlx::Error> {
    match fetch_article(conn, id).await? {
        Some(row) => Ok(load_views(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Keeps the first occurrence of every id.
fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

fn map_membership_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::BadRequest("Unknown category or tag".to_string())
        }
        _ => AppError::from_write(err, "Membership"),
    }
}

/// Deletes every category membership of the article, then inserts one row per id.
async fn replace_categories(conn: &mut SqliteConnection, article_id: Uuid, ids: &[Uuid]) -> AppResult<()> {
    sqlx::query("DELETE FROM article_categories WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;
    for category_id in dedup_ids(ids) {
        sqlx::query("INSERT INTO article_categories (article_id, category_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await
            .map_err(map_membership_error)?;
    }
    Ok(())
}

async fn replace_tags(conn: &mut SqliteConnection, article_id: Uuid, ids: &[Uuid]) -> AppResult<()> {
    sqlx::query("DELETE FROM article_tags WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;
    for tag_id in dedup_ids(ids) {
        sqlx::query("INSERT INTO article_tags (article_id, tag_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(map_membership_error)?;
    }
    Ok(())
}

#[async_trait]
impl Repository for SqliteRepository {
    /// list_articles
    ///
    /// `published` and ordering go to SQL. Category/tag/search run in memory over
    /// the full matching set; paging is pushed down only when no such filter is set.
    async fn list_articles(&self, query: ArticleQuery) -> AppResult<Vec<ArticleView>> {
        let filter = ArticleFilter::from_query(&query);

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));
        if let Some(published) = query.published {
            builder.push(" WHERE published = ");
            builder.push_bind(published);
        }
        builder.push(match query.order {
            ArticleOrder::PublishedDesc => " ORDER BY published_at DESC, created_at DESC",
            ArticleOrder::CreatedDesc => " ORDER BY created_at DESC",
        });

        if filter.is_empty() && (query.limit.is_some() || query.offset.is_some()) {
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
            builder.push(" LIMIT ");
            builder.push_bind(query.limit.unwrap_or(-1));
            builder.push(" OFFSET ");
            builder.push_bind(query.offset.unwrap_or(0).max(0));
        }

        let mut conn = self.pool.acquire().await?;
        let rows = builder.build_query_as::<Article>().fetch_all(&mut *conn).await?;
        let views = load_views(&mut conn, rows).await?;

        if filter.is_empty() {
            Ok(views)
        } else {
            Ok(filter.apply(views, query.offset, query.limit))
        }
    }

    async fn get_article(&self, key: ArticleKey) -> AppResult<Option<ArticleView>> {
        let mut conn = self.pool.acquire().await?;
        let row = match key {
            ArticleKey::Id(id) => fetch_article(&mut conn, id).await?,
            ArticleKey::Slug(slug) => {
                sqlx::query_as::<_, Article>(&format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = ?"
                ))
                .bind(slug)
                .fetch_optional(&mut *conn)
                .await?
            }
        };

        match row {
            Some(row) => Ok(load_views(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// get_stats
    ///
    /// Dashboard counters plus the five most recently created articles.
    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let total_articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        let published_articles: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE published = TRUE")
                .fetch_one(&self.pool)
                .await?;

        let recent_articles = self
            .list_articles(ArticleQuery {
                order: ArticleOrder::CreatedDesc,
                limit: Some(5),
                ..Default::default()
            })
            .await?;

        Ok(DashboardStats {
            total_articles,
            published_articles,
            draft_articles: total_articles - published_articles,
            recent_articles,
        })
    }

    /// create_article
    ///
    /// Inserts the article and its memberships in one transaction. A duplicate
    /// slug rolls everything back and surfaces as `Conflict`.
    async fn create_article(&self, article: NewArticle) -> AppResult<ArticleView> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO articles (id, title, slug, excerpt, content, cover_image, published, \
             published_at, author_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.excerpt)
        .bind(&article.content)
        .bind(&article.cover_image)
        .bind(article.published)
        .bind(article.published_at)
        .bind(article.author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "An article with this slug"))?;

        replace_categories(&mut tx, id, &article.category_ids).await?;
        replace_tags(&mut tx, id, &article.tag_ids).await?;

        let view = fetch_view(&mut tx, id).await?.ok_or(AppError::NotFound)?;
        tx.commit().await?;

        tracing::info!(article_id = %id, slug = %view.slug, "article created");
        Ok(view)
    }

    /// update_article
    ///
    /// Rewrites the editable columns and, when id lists are given, replaces the
    /// join rows (delete-all then re-insert) inside the same transaction so an
    /// interrupted update never leaves an article without memberships.
    async fn update_article(&self, id: Uuid, changes: ArticleChanges) -> AppResult<Option<ArticleView>> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = fetch_article(&mut tx, id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let published_at = if changes.published {
            current.published_at.or(Some(now))
        } else {
            current.published_at
        };
        let cover_image = changes.cover_image.or(current.cover_image);

        sqlx::query(
            "UPDATE articles SET title = ?, excerpt = ?, content = ?, cover_image = ?, \
             published = ?, published_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.excerpt)
        .bind(&changes.content)
        .bind(&cover_image)
        .bind(changes.published)
        .bind(published_at)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_write(e, "An article with this slug"))?;

        if let Some(category_ids) = &changes.category_ids {
            replace_categories(&mut tx, id, category_ids).await?;
        }
        if let Some(tag_ids) = &changes.tag_ids {
            replace_tags(&mut tx, id, tag_ids).await?;
        }

        let view = fetch_view(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(article_id = %id, "article updated");
        Ok(view)
    }

    async fn delete_article(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_publish(&self, id: Uuid) -> AppResult<Option<ArticleView>> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = fetch_article(&mut tx, id).await? else {
            return Ok(None);
        };

        let published = !current.published;
        let published_at = if published {
            current.published_at.or(Some(Utc::now()))
        } else {
            current.published_at
        };

        sqlx::query("UPDATE articles SET published = ?, published_at = ?, updated_at = ? WHERE id = ?")
            .bind(published)
            .bind(published_at)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let view = fetch_view(&mut tx, id).await?;
        tx.commit().await?;
        Ok(view)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        Ok(sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_category(&self, name: &str, slug: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, slug) VALUES (?, ?, ?) RETURNING id, name, slug",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "A category with this slug"))
    }

    async fn create_tag(&self, name: &str, slug: &str) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>("INSERT INTO tags (id, name, slug) VALUES (?, ?, ?) RETURNING id, name, slug")
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "A tag with this slug"))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "A user with this email"))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
