mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
    routing::post,
};
use common::{
    ADMIN_EMAIL, ADMIN_PASSWORD, TestContext, multipart_body, session_cookie, test_context,
    test_context_with_storage,
};
use inkwell_blog::{
    actions, create_router,
    models::{ArticleKey, User},
    repository::Repository,
    seed::seed_demo,
    storage::MockStorageService,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

async fn seeded() -> (TestContext, User) {
    let ctx = test_context().await;
    seed_demo(ctx.repo.as_ref()).await.unwrap();
    let admin = ctx
        .repo
        .find_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    (ctx, admin)
}

async fn send(ctx: &TestContext, request: Request<Body>) -> Response<Body> {
    create_router(ctx.state.clone()).oneshot(request).await.unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str, admin: &User) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, session_cookie(admin))
        .body(Body::empty())
        .unwrap()
}

fn admin_form(uri: &str, admin: &User, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let (content_type, body) = multipart_body(fields, file);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, session_cookie(admin))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

fn admin_post(uri: &str, admin: &User) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, session_cookie(admin))
        .body(Body::empty())
        .unwrap()
}

// --- Route Guard ---

#[tokio::test]
async fn test_admin_requires_session() {
    let (ctx, _) = seeded().await;

    let response = send(&ctx, get("/admin/articles")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/admin/login?from=/admin/articles");

    // A cookie that does not resolve to an admin is treated as no cookie.
    let forged = Request::builder()
        .uri("/admin")
        .header(header::COOKIE, format!("admin_session={}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = send(&ctx, forged).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/admin/login?from=/admin");
}

#[tokio::test]
async fn test_admin_passes_with_valid_session() {
    let (ctx, admin) = seeded().await;

    let response = send(&ctx, admin_get("/admin", &admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["totalArticles"], 3);
    assert_eq!(stats["publishedArticles"], 2);
    assert_eq!(stats["draftArticles"], 1);

    let response = send(&ctx, admin_get("/admin/articles", &admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_login_page_is_public() {
    let ctx = test_context().await;
    let response = send(&ctx, get("/admin/login?from=/admin/articles")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response).await;
    assert_eq!(page["from"], "/admin/articles");
    assert_eq!(page["action"], "/admin/login");
}

#[tokio::test]
async fn test_public_paths_get_a_locale() {
    let ctx = test_context().await;

    let response = send(&ctx, get("/blog?search=next")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/en/blog?search=next");

    let response = send(&ctx, get("/")).await;
    assert_eq!(location(&response), "/en");

    let arabic = Request::builder()
        .uri("/about")
        .header(header::ACCEPT_LANGUAGE, "ar-SA,en;q=0.5")
        .body(Body::empty())
        .unwrap();
    assert_eq!(location(&send(&ctx, arabic).await), "/ar/about");

    let remembered = Request::builder()
        .uri("/blog")
        .header(header::ACCEPT_LANGUAGE, "ar")
        .header(header::COOKIE, "locale=en")
        .body(Body::empty())
        .unwrap();
    assert_eq!(location(&send(&ctx, remembered).await), "/en/blog");
}

#[tokio::test]
async fn test_exempt_paths_are_not_redirected() {
    let ctx = test_context().await;

    let response = send(&ctx, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&ctx, get("/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&ctx, get("/missing.png")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Public Pages ---

#[tokio::test]
async fn test_home_and_listing() {
    let (ctx, _) = seeded().await;

    let response = send(&ctx, get("/en")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let home = json_body(response).await;
    assert_eq!(home["direction"], "ltr");
    let latest = home["latestArticles"].as_array().unwrap();
    assert_eq!(latest.len(), 2, "drafts never reach the home page");
    assert!(latest[0]["readingTime"].as_u64().unwrap() >= 1);

    let response = send(&ctx, get("/ar/blog?search=NEXT")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = json_body(response).await;
    assert_eq!(listing["direction"], "rtl");
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["search"], "NEXT");
    assert_eq!(listing["articles"][0]["slug"], "getting-started-with-nextjs-15");
    assert_eq!(listing["categories"].as_array().unwrap().len(), 3);

    let response = send(&ctx, get("/en/blog?category=design&tag=")).await;
    let listing = json_body(response).await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["activeCategory"], "design");
    assert_eq!(listing["activeTag"], Value::Null);
}

#[tokio::test]
async fn test_article_detail_hides_drafts() {
    let (ctx, _) = seeded().await;

    let response = send(&ctx, get("/en/blog/future-of-web-design")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json_body(response).await;
    assert_eq!(page["authorName"], "Admin User");
    assert_eq!(page["article"]["tags"][0]["slug"], "ui-ux");
    assert_eq!(page["readingTime"], 1);

    let response = send(&ctx, get("/en/blog/building-scalable-react-applications")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&ctx, get("/en/blog/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_locale_is_not_found() {
    let ctx = test_context().await;

    // Redirected under the default locale, where the path matches nothing.
    let response = send(&ctx, get("/fr/blog")).await;
    assert_eq!(location(&response), "/en/fr/blog");
    let response = send(&ctx, get("/en/fr/blog")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&ctx, get("/ar/about")).await;
    assert_eq!(json_body(response).await["direction"], "rtl");
}

// --- Login ---

fn login_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_flow() {
    let (ctx, admin) = seeded().await;

    let response = send(&ctx, login_request("email=&password=")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Please provide both email and password"
    );

    let response = send(&ctx, login_request("email=admin%40blog.com&password=nope")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid credentials");

    let body = format!(
        "email=admin%40blog.com&password={ADMIN_PASSWORD}&from=%2Fadmin%2Farticles"
    );
    let response = send(&ctx, login_request(&body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/articles");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with(&format!("admin_session={}", admin.id)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    // `from` outside the admin area falls back to the dashboard.
    let body = format!("email=admin%40blog.com&password={ADMIN_PASSWORD}&from=https%3A%2F%2Fevil.test");
    let response = send(&ctx, login_request(&body)).await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn test_login_ignores_from_that_is_not_a_valid_header() {
    let (ctx, _) = seeded().await;

    let body = format!("email=admin%40blog.com&password={ADMIN_PASSWORD}&from=%2Fadmin%2F%0Aevil");
    let response = send(&ctx, login_request(&body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");
    assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (ctx, admin) = seeded().await;

    let response = send(&ctx, admin_post("/admin/logout", &admin)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}

// --- Mutation Actions ---

#[tokio::test]
async fn test_create_article_action() {
    let (ctx, admin) = seeded().await;
    let categories = ctx.repo.list_categories().await.unwrap();
    let tech = categories.iter().find(|c| c.slug == "technology").unwrap();
    let design = categories.iter().find(|c| c.slug == "design").unwrap();
    let tech_id = tech.id.to_string();
    let design_id = design.id.to_string();

    let request = admin_form(
        "/admin/articles",
        &admin,
        &[
            ("title", "Hello Rust World"),
            ("excerpt", "Short"),
            ("content", "Body"),
            ("published", "on"),
            ("categoryIds", tech_id.as_str()),
            ("categoryIds", design_id.as_str()),
        ],
        Some(("cover.PNG", "image/png", &b"\x89PNG fake"[..])),
    );
    let response = send(&ctx, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let created = ctx
        .repo
        .get_article(ArticleKey::Slug("hello-rust-world".into()))
        .await
        .unwrap()
        .expect("article created");
    assert_eq!(location(&response), format!("/admin/articles/{}/edit", created.id));
    assert!(created.published);
    assert!(created.published_at.is_some());
    assert_eq!(created.author_id, admin.id);
    assert_eq!(created.categories.len(), 2);
    let cover = created.cover_image.unwrap();
    assert!(cover.starts_with("/uploads/") && cover.ends_with(".png"));

    assert_eq!(ctx.revalidator.paths(), vec!["/admin/articles", "/blog"]);

    // Same title again: slug collision.
    let request = admin_form("/admin/articles", &admin, &[("title", "Hello, Rust world!")], None);
    assert_eq!(send(&ctx, request).await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_rejects_bad_forms() {
    let (ctx, admin) = seeded().await;

    let request = admin_form("/admin/articles", &admin, &[("title", "  ")], None);
    assert_eq!(send(&ctx, request).await.status(), StatusCode::BAD_REQUEST);

    let request = admin_form(
        "/admin/articles",
        &admin,
        &[("title", "Bad ids"), ("tagIds", "not-a-uuid")],
        None,
    );
    assert_eq!(send(&ctx, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_failure_is_a_server_error() {
    let ctx = test_context_with_storage(Arc::new(MockStorageService::new_failing())).await;
    seed_demo(ctx.repo.as_ref()).await.unwrap();
    let admin = ctx.repo.find_user_by_email(ADMIN_EMAIL).await.unwrap().unwrap();

    let request = admin_form(
        "/admin/articles",
        &admin,
        &[("title", "Upload fails")],
        Some(("a.jpg", "image/jpeg", &b"jpeg"[..])),
    );
    let response = send(&ctx, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "Something went wrong. Please try again later."
    );
    assert!(
        ctx.repo
            .get_article(ArticleKey::Slug("upload-fails".into()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_update_article_action() {
    let (ctx, admin) = seeded().await;
    let article = ctx
        .repo
        .get_article(ArticleKey::Slug("future-of-web-design".into()))
        .await
        .unwrap()
        .unwrap();
    let react = ctx
        .repo
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.slug == "react")
        .unwrap();
    let react_id = react.id.to_string();

    let request = admin_form(
        &format!("/admin/articles/{}", article.id),
        &admin,
        &[
            ("title", "The Future of Web Design, revised"),
            ("excerpt", "New excerpt"),
            ("content", "New body"),
            ("tagIds", react_id.as_str()),
        ],
        None,
    );
    let response = send(&ctx, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/articles");

    let updated = ctx
        .repo
        .get_article(ArticleKey::Id(article.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.slug, "future-of-web-design");
    assert_eq!(updated.cover_image, article.cover_image, "cover kept");
    assert!(!updated.published, "unchecked box unpublishes");
    assert_eq!(updated.published_at, article.published_at);
    assert!(updated.categories.is_empty());
    assert_eq!(updated.tags.iter().map(|t| t.slug.as_str()).collect::<Vec<_>>(), vec!["react"]);

    assert_eq!(
        ctx.revalidator.paths(),
        vec!["/admin/articles", "/blog", "/blog/future-of-web-design"]
    );

    let request = admin_form(
        &format!("/admin/articles/{}", Uuid::new_v4()),
        &admin,
        &[("title", "Ghost")],
        None,
    );
    assert_eq!(send(&ctx, request).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggle_and_delete_actions() {
    let (ctx, admin) = seeded().await;
    let draft = ctx
        .repo
        .get_article(ArticleKey::Slug("building-scalable-react-applications".into()))
        .await
        .unwrap()
        .unwrap();

    let response = send(
        &ctx,
        admin_post(&format!("/admin/articles/{}/toggle-publish", draft.id), &admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/articles");
    let response = send(&ctx, get("/en/blog/building-scalable-react-applications")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &ctx,
        admin_post(&format!("/admin/articles/{}/delete", draft.id), &admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(ctx.repo.get_article(ArticleKey::Id(draft.id)).await.unwrap().is_none());

    let response = send(
        &ctx,
        admin_post(&format!("/admin/articles/{}/delete", draft.id), &admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(
        &ctx,
        admin_post(&format!("/admin/articles/{}/toggle-publish", Uuid::new_v4()), &admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        ctx.revalidator.paths(),
        vec!["/admin/articles", "/blog", "/admin/articles", "/blog"]
    );
}

#[tokio::test]
async fn test_admin_list_filters_by_state_and_title() {
    let (ctx, admin) = seeded().await;

    let titles = |list: &Value| -> Vec<String> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap().to_string())
            .collect()
    };

    let all = json_body(send(&ctx, admin_get("/admin/articles", &admin)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let drafts = json_body(send(&ctx, admin_get("/admin/articles?filter=draft", &admin)).await).await;
    assert_eq!(titles(&drafts), vec!["Building Scalable React Applications"]);

    let published =
        json_body(send(&ctx, admin_get("/admin/articles?filter=published", &admin)).await).await;
    assert_eq!(published.as_array().unwrap().len(), 2);
    assert!(published.as_array().unwrap().iter().all(|a| a["published"] == true));

    // Title only: the Next.js excerpt mentions the web too.
    let searched = json_body(send(&ctx, admin_get("/admin/articles?search=WEB", &admin)).await).await;
    assert_eq!(titles(&searched), vec!["The Future of Web Design"]);

    // Search composes with the state filter.
    let none = json_body(
        send(&ctx, admin_get("/admin/articles?filter=draft&search=web", &admin)).await,
    )
    .await;
    assert!(none.as_array().unwrap().is_empty());

    let unknown = json_body(send(&ctx, admin_get("/admin/articles?filter=bogus", &admin)).await).await;
    assert_eq!(unknown.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_editor_views() {
    let (ctx, admin) = seeded().await;

    let response = send(&ctx, admin_get("/admin/articles/new", &admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let editor = json_body(response).await;
    assert_eq!(editor["article"], Value::Null);
    assert_eq!(editor["tags"].as_array().unwrap().len(), 4);

    let article = ctx
        .repo
        .get_article(ArticleKey::Slug("future-of-web-design".into()))
        .await
        .unwrap()
        .unwrap();
    let response = send(&ctx, admin_get(&format!("/admin/articles/{}/edit", article.id), &admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["article"]["slug"], "future-of-web-design");

    let response = send(&ctx, admin_get(&format!("/admin/articles/{}", Uuid::new_v4()), &admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_actions_reject_without_session_even_unguarded() {
    let ctx = test_context().await;
    let app = Router::new()
        .route("/articles/{id}/delete", post(actions::delete_article))
        .with_state(ctx.state.clone());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/articles/{}/delete", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
