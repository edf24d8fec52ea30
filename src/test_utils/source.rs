//! In-memory content source.

use std::time::Duration;

use dashmap::DashMap;

use crate::core::GrowError;
use crate::source::{ContentSource, FetchFuture};

/// Content source backed by a map, recording how often each path is fetched.
///
/// Every call to [`ContentSource::fetch`] counts, including fetches of
/// missing paths. An optional delay makes each fetch yield to the runtime,
/// which lets tests overlap concurrent resolutions.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: DashMap<String, String>,
    fetches: DashMap<String, usize>,
    delay: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    /// Sleep for `delay` inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add or replace a file.
    pub fn insert(&self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    pub fn remove(&self, path: &str) {
        self.files.remove(path);
    }

    /// Number of fetches issued for `path`.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches.get(path).map(|count| *count).unwrap_or(0)
    }

    /// Number of fetches issued for all paths.
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

impl ContentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            *self.fetches.entry(path.to_string()).or_insert(0) += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.files.get(path).map(|content| content.clone()).ok_or_else(|| GrowError::Fetch {
                path: path.to_string(),
                reason: "no such file".to_string(),
            })
        })
    }
}
