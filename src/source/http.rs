//! HTTP content source.

use super::{ContentSource, FetchFuture};
use crate::core::GrowError;

/// Fetches pod-absolute paths with `GET <base_url><path>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for a pod served at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a source that reuses an existing client.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Full URL for a pod path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl ContentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(path);
            tracing::debug!(target: "source", "GET {}", url);

            let response = self.client.get(&url).send().await.map_err(|e| GrowError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

            if !response.status().is_success() {
                return Err(GrowError::Fetch {
                    path: path.to_string(),
                    reason: format!("HTTP {} from {}", response.status(), url),
                });
            }

            response.text().await.map_err(|e| GrowError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })
    }
}
