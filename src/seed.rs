use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    auth::hash_password,
    error::{AppError, AppResult},
    models::{ArticleKey, NewArticle, NewUser, Role},
    repository::Repository,
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@blog.com";
pub const DEMO_ADMIN_PASSWORD: &str = "password123";

const CATEGORIES: [(&str, &str); 3] = [
    ("Technology", "technology"),
    ("Design", "design"),
    ("Development", "development"),
];

const TAGS: [(&str, &str); 4] = [
    ("React", "react"),
    ("Next.js", "nextjs"),
    ("TypeScript", "typescript"),
    ("UI/UX", "ui-ux"),
];

struct DemoArticle {
    title: &'static str,
    slug: &'static str,
    excerpt: &'static str,
    content: &'static str,
    cover_image: Option<&'static str>,
    published_on: Option<(i32, u32, u32)>,
    categories: &'static [&'static str],
    tags: &'static [&'static str],
}

const ARTICLES: [DemoArticle; 3] = [
    DemoArticle {
        title: "Getting Started with Next.js 15",
        slug: "getting-started-with-nextjs-15",
        excerpt: "Learn how to build modern web applications with the latest version of Next.js.",
        content: "# Getting Started with Next.js 15\n\nNext.js 15 brings exciting new features and improvements to the React framework.\n\n## What's New\n\n- Improved performance\n- Better developer experience\n- Enhanced routing capabilities\n\n## Getting Started\n\n```bash\nnpx create-next-app@latest\n```\n\nStart building your next project with Next.js today!",
        cover_image: Some("/modern-web-development.png"),
        published_on: Some((2024, 12, 1)),
        categories: &["technology", "development"],
        tags: &["nextjs", "typescript"],
    },
    DemoArticle {
        title: "The Future of Web Design",
        slug: "future-of-web-design",
        excerpt: "Exploring upcoming trends and innovations in web design for 2025.",
        content: "# The Future of Web Design\n\nWeb design is evolving rapidly with new technologies and user expectations.\n\n## Key Trends\n\n1. **AI-Powered Design Tools**\n2. **Immersive 3D Experiences**\n3. **Sustainable Design Practices**\n\nDesign is not just about aesthetics, it's about creating meaningful experiences.",
        cover_image: Some("/futuristic-web-design.jpg"),
        published_on: Some((2024, 11, 25)),
        categories: &["design"],
        tags: &["ui-ux"],
    },
    DemoArticle {
        title: "Building Scalable React Applications",
        slug: "building-scalable-react-applications",
        excerpt: "Best practices for architecting large-scale React applications.",
        content: "# Building Scalable React Applications\n\nLearn how to structure your React applications for growth.\n\n## Architecture Patterns\n\n- Component composition\n- State management strategies\n- Performance optimization\n\nThis is a draft article that needs more content.",
        cover_image: None,
        published_on: None,
        categories: &["development"],
        tags: &["react", "typescript"],
    },
];

fn date(ymd: (i32, u32, u32)) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 0, 0, 0).single()
}

fn ids_for(slugs: &[&str], known: &[(Uuid, String)]) -> Vec<Uuid> {
    slugs
        .iter()
        .filter_map(|slug| known.iter().find(|(_, s)| s == slug).map(|(id, _)| *id))
        .collect()
}

/// seed_demo
///
/// Inserts the demo admin, categories, tags and articles. Existing rows (matched
/// by email or slug) are left untouched, so running it twice is harmless.
pub async fn seed_demo(repo: &dyn Repository) -> AppResult<()> {
    let admin = match repo.find_user_by_email(DEMO_ADMIN_EMAIL).await? {
        Some(user) => user,
        None => {
            let password_hash = hash_password(DEMO_ADMIN_PASSWORD)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            let user = repo
                .create_user(NewUser {
                    name: "Admin User".to_string(),
                    email: DEMO_ADMIN_EMAIL.to_string(),
                    password_hash,
                    role: Role::Admin,
                })
                .await?;
            tracing::info!(email = %user.email, "seeded admin user");
            user
        }
    };

    let existing = repo.list_categories().await?;
    for (name, slug) in CATEGORIES {
        if !existing.iter().any(|c| c.slug == slug) {
            repo.create_category(name, slug).await?;
        }
    }
    let categories: Vec<(Uuid, String)> = repo
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c.slug))
        .collect();

    let existing = repo.list_tags().await?;
    for (name, slug) in TAGS {
        if !existing.iter().any(|t| t.slug == slug) {
            repo.create_tag(name, slug).await?;
        }
    }
    let tags: Vec<(Uuid, String)> = repo
        .list_tags()
        .await?
        .into_iter()
        .map(|t| (t.id, t.slug))
        .collect();

    for demo in &ARTICLES {
        if repo
            .get_article(ArticleKey::Slug(demo.slug.to_string()))
            .await?
            .is_some()
        {
            continue;
        }

        repo.create_article(NewArticle {
            title: demo.title.to_string(),
            slug: demo.slug.to_string(),
            excerpt: demo.excerpt.to_string(),
            content: demo.content.to_string(),
            cover_image: demo.cover_image.map(str::to_string),
            published: demo.published_on.is_some(),
            published_at: demo.published_on.and_then(date),
            author_id: admin.id,
            category_ids: ids_for(demo.categories, &categories),
            tag_ids: ids_for(demo.tags, &tags),
        })
        .await?;
    }

    tracing::info!("demo content ready");
    Ok(())
}
