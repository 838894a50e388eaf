#![allow(dead_code)]

use inkwell_blog::{
    AppConfig, AppState,
    auth::hash_password,
    models::{NewUser, Role, User},
    repository::{Repository, RepositoryState, SqliteRepository, connect_pool},
    revalidate::RecordingRevalidator,
    storage::{MockStorageService, StorageState},
};
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@blog.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// Fresh migrated in-memory database.
pub async fn test_repo() -> Arc<SqliteRepository> {
    let pool = connect_pool("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    let repo = SqliteRepository::new(pool);
    repo.migrate().await.expect("Failed to migrate");
    Arc::new(repo)
}

pub async fn create_user(repo: &dyn Repository, email: &str, role: Role) -> User {
    repo.create_user(NewUser {
        name: "Admin User".to_string(),
        email: email.to_string(),
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        role,
    })
    .await
    .unwrap()
}

pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<SqliteRepository>,
    pub revalidator: RecordingRevalidator,
}

pub async fn test_context_with_storage(storage: StorageState) -> TestContext {
    let repo = test_repo().await;
    let revalidator = RecordingRevalidator::new();
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage,
        revalidator: Arc::new(revalidator.clone()),
        config: AppConfig::default(),
    };
    TestContext { state, repo, revalidator }
}

pub async fn test_context() -> TestContext {
    test_context_with_storage(Arc::new(MockStorageService::new())).await
}

pub fn session_cookie(user: &User) -> String {
    format!("admin_session={}", user.id)
}

pub const BOUNDARY: &str = "inkwell-test-boundary";

/// Minimal multipart/form-data body. Returns the content type and the bytes.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"coverImageFile\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
