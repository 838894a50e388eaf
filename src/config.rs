use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared read-only with every handler through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string.
    pub db_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls cookie hardening and the upload backend.
    pub env: Env,
    // Local directory receiving uploaded cover images (Env::Local only).
    pub upload_dir: String,
    // When true, demo content and the admin account are seeded at startup.
    pub seed_demo: bool,
    // S3-compatible storage settings (Env::Production only).
    pub s3: Option<S3Settings>,
}

/// S3Settings
///
/// Credentials and addressing for the production image bucket.
#[derive(Clone, Debug)]
pub struct S3Settings {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    // Base URL under which stored objects are publicly reachable.
    pub public_url: String,
}

/// Env
///
/// Defines the runtime context, switching between local development utilities
/// (disk uploads, insecure cookies over plain HTTP) and production infrastructure.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test setup.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            upload_dir: "public/uploads".to_string(),
            seed_demo: false,
            s3: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// # Panics
    /// Panics if a variable required in production is missing, so the service never
    /// starts with an incomplete configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string());
        let seed_demo = env::var("SEED_DEMO")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://blog.db?mode=rwc".to_string()),
                bind_addr,
                upload_dir,
                seed_demo,
                s3: None,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                bind_addr,
                upload_dir,
                seed_demo,
                s3: Some(S3Settings {
                    endpoint: env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod"),
                    region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                    access_key: env::var("S3_ACCESS_KEY")
                        .expect("FATAL: S3_ACCESS_KEY required in prod"),
                    secret_key: env::var("S3_SECRET_KEY")
                        .expect("FATAL: S3_SECRET_KEY required in prod"),
                    bucket: env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "blog-uploads".to_string()),
                    public_url: env::var("S3_PUBLIC_URL")
                        .expect("FATAL: S3_PUBLIC_URL required in prod"),
                }),
            },
        }
    }

    /// Session cookies only carry the `Secure` flag in production.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}
