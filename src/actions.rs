use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    content::generate_slug,
    error::{AppError, AppResult},
    models::{ArticleChanges, ArticleKey, NewArticle},
    revalidate::Revalidator,
    session::AdminSession,
    storage::image_key,
};

const ADMIN_ARTICLES_PATH: &str = "/admin/articles";
const BLOG_PATH: &str = "/blog";

/// UploadedImage
///
/// A non-empty file part of the article form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// ArticleForm
///
/// The multipart body shared by the create and update actions.
#[derive(Debug, Clone, Default)]
pub struct ArticleForm {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    /// Cover image URL typed into the form.
    pub cover_image: Option<String>,
    /// Uploaded cover image; wins over `cover_image`.
    pub cover_image_file: Option<UploadedImage>,
    pub published: bool,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

fn parse_id(raw: &str, what: &str) -> AppResult<Option<Uuid>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}

impl ArticleForm {
    /// Reads every part of the form. Unknown parts are ignored; `categoryIds` and
    /// `tagIds` may repeat.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ArticleForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "coverImageFile" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                if !bytes.is_empty() {
                    form.cover_image_file = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            match name.as_str() {
                "title" => form.title = value.trim().to_string(),
                "excerpt" => form.excerpt = value,
                "content" => form.content = value,
                "coverImage" => {
                    form.cover_image = Some(value.trim().to_string()).filter(|v| !v.is_empty())
                }
                "published" => form.published = value == "on",
                "categoryIds" => form.category_ids.extend(parse_id(&value, "category")?),
                "tagIds" => form.tag_ids.extend(parse_id(&value, "tag")?),
                _ => {}
            }
        }

        if form.title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        Ok(form)
    }
}

/// Stores the uploaded image, if any, and returns the cover URL to persist.
async fn resolve_cover(state: &AppState, form: &mut ArticleForm) -> AppResult<Option<String>> {
    match form.cover_image_file.take() {
        Some(upload) => {
            let key = image_key(&upload.file_name);
            let url = state
                .storage
                .store_image(&key, &upload.content_type, upload.bytes)
                .await
                .map_err(AppError::Storage)?;
            Ok(Some(url))
        }
        None => Ok(form.cover_image.take()),
    }
}

async fn revalidate_listings(revalidator: &dyn Revalidator) {
    revalidator.revalidate_path(ADMIN_ARTICLES_PATH).await;
    revalidator.revalidate_path(BLOG_PATH).await;
}

/// create_article
///
/// [Admin Action] Creates an article authored by the session's user and opens it
/// in the editor.
#[utoipa::path(
    post,
    path = "/admin/articles",
    request_body(content_type = "multipart/form-data", description = "Article form"),
    responses(
        (status = 303, description = "Created, redirected to the editor"),
        (status = 400, description = "Malformed form"),
        (status = 401, description = "No session"),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_article(
    AdminSession(session): AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = ArticleForm::from_multipart(multipart).await?;
    let cover_image = resolve_cover(&state, &mut form).await?;

    let article = state
        .repo
        .create_article(NewArticle {
            slug: generate_slug(&form.title),
            title: form.title,
            excerpt: form.excerpt,
            content: form.content,
            cover_image,
            published: form.published,
            published_at: form.published.then(Utc::now),
            author_id: session.user_id,
            category_ids: form.category_ids,
            tag_ids: form.tag_ids,
        })
        .await?;

    revalidate_listings(state.revalidator.as_ref()).await;
    Ok(Redirect::to(&format!("{ADMIN_ARTICLES_PATH}/{}/edit", article.id)))
}

/// update_article
///
/// [Admin Action] Rewrites an article from the form. The slug is kept, a missing
/// cover keeps the previous one and memberships are replaced exactly.
#[utoipa::path(
    post,
    path = "/admin/articles/{id}",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body(content_type = "multipart/form-data", description = "Article form"),
    responses(
        (status = 303, description = "Updated, redirected to the list"),
        (status = 401, description = "No session"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn update_article(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = ArticleForm::from_multipart(multipart).await?;

    // Fail before storing an upload for an article that does not exist.
    if state.repo.get_article(ArticleKey::Id(id)).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let cover_image = resolve_cover(&state, &mut form).await?;

    let article = state
        .repo
        .update_article(
            id,
            ArticleChanges {
                title: form.title,
                excerpt: form.excerpt,
                content: form.content,
                cover_image,
                published: form.published,
                category_ids: Some(form.category_ids),
                tag_ids: Some(form.tag_ids),
            },
        )
        .await?
        .ok_or(AppError::NotFound)?;

    revalidate_listings(state.revalidator.as_ref()).await;
    state
        .revalidator
        .revalidate_path(&format!("{BLOG_PATH}/{}", article.slug))
        .await;
    Ok(Redirect::to(ADMIN_ARTICLES_PATH))
}

/// delete_article
///
/// [Admin Action] Removes an article together with its memberships.
#[utoipa::path(
    post,
    path = "/admin/articles/{id}/delete",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 303, description = "Deleted, redirected to the list"),
        (status = 401, description = "No session"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn delete_article(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    if !state.repo.delete_article(id).await? {
        return Err(AppError::NotFound);
    }

    revalidate_listings(state.revalidator.as_ref()).await;
    Ok(Redirect::to(ADMIN_ARTICLES_PATH))
}

/// toggle_publish
///
/// [Admin Action] Flips the published flag. The first publication stamps
/// `publishedAt`; later toggles leave it alone.
#[utoipa::path(
    post,
    path = "/admin/articles/{id}/toggle-publish",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 303, description = "Toggled, redirected to the list"),
        (status = 401, description = "No session"),
        (status = 404, description = "Unknown article")
    )
)]
pub async fn toggle_publish(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    state
        .repo
        .toggle_publish(id)
        .await?
        .ok_or(AppError::NotFound)?;

    revalidate_listings(state.revalidator.as_ref()).await;
    Ok(Redirect::to(ADMIN_ARTICLES_PATH))
}
