use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Revalidator
///
/// Invalidates cached renderings of a public or admin path after a mutation, so the
/// next read observes the change.
#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate_path(&self, path: &str);
}

/// Revalidator used by the server: pages are rendered per request, so a
/// revalidation only needs to be recorded in the logs.
#[derive(Clone, Default)]
pub struct LogRevalidator;

#[async_trait]
impl Revalidator for LogRevalidator {
    async fn revalidate_path(&self, path: &str) {
        tracing::info!(path, "revalidated");
    }
}

/// RecordingRevalidator
///
/// Keeps every revalidated path in order. Used by tests to assert which views an
/// action invalidated.
#[derive(Clone, Default)]
pub struct RecordingRevalidator {
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Revalidator for RecordingRevalidator {
    async fn revalidate_path(&self, path: &str) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_string());
        }
    }
}

pub type RevalidatorState = Arc<dyn Revalidator>;
