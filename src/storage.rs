use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Public URL prefix under which the local upload directory is served.
pub const UPLOADS_ROUTE: &str = "/uploads";

// 1. StorageService Contract
/// StorageService
///
/// Where uploaded cover images go. Actions hand over the raw bytes and get back the
/// URL to store on the article; they never know which backend is active.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the backing location (directory or bucket). Safe to call on every
    /// startup.
    async fn prepare(&self) -> Result<(), String>;

    /// Persists `bytes` under `key` and returns the public URL of the stored image.
    async fn store_image(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, String>;
}

/// image_key
///
/// Collision-free object name for an upload: a random UUID plus the extension of
/// the client's file name. Anything that is not a short alphanumeric extension is
/// dropped.
pub fn image_key(file_name: &str) -> String {
    let id = Uuid::new_v4();
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// key so it can never escape the upload root.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 2. Local disk (Env::Local)
/// LocalDiskStorage
///
/// Writes uploads into a directory that the router serves under `/uploads`.
#[derive(Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn prepare(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("cannot create {}: {e}", self.root.display()))
    }

    async fn store_image(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> Result<String, String> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err("empty upload key".to_string());
        }

        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| e.to_string())?;

        tracing::debug!(path = %path.display(), "stored upload on disk");
        Ok(format!("{UPLOADS_ROUTE}/{key}"))
    }
}

// 3. S3-compatible bucket (Env::Production)
/// S3StorageClient
///
/// Uploads through the AWS SDK to any S3-compatible endpoint. Path-style
/// addressing is forced so MinIO and Supabase gateways resolve the bucket.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_url: String,
}

impl S3StorageClient {
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of an object in the bucket.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent from our side: an "already owned" answer is fine.
    async fn prepare(&self) -> Result<(), String> {
        if let Err(e) = self.client.create_bucket().bucket(&self.bucket_name).send().await {
            tracing::debug!("create_bucket skipped: {e}");
        }
        Ok(())
    }

    async fn store_image(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, String> {
        let key = sanitize_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        Ok(self.object_url(&key))
    }
}

// 4. Mock (tests)
/// MockStorageService
///
/// In-memory stand-in returning deterministic URLs, or failing on demand.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn prepare(&self) -> Result<(), String> {
        Ok(())
    }

    async fn store_image(&self, key: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!("{UPLOADS_ROUTE}/{}", sanitize_key(key)))
    }
}

/// StorageState
///
/// Shared handle to whichever backend `main` selected.
pub type StorageState = Arc<dyn StorageService>;
