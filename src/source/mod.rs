//! Content sources: where raw document and view bytes come from.
//!
//! The document layer never assumes a transport. It asks a [`ContentSource`]
//! for the text behind a path and gets either the content or a
//! [`GrowError::Fetch`]. Two backends are provided:
//!
//! - [`FsSource`] - reads files below a pod root directory (CLI / server use)
//! - [`HttpSource`] - issues `GET` requests against a base URL (a served pod)
//!
//! Paths are always pod-absolute (`/content/blog/hello.yaml`); each backend
//! decides how to map them onto its own namespace.

mod fs;
mod http;

pub use fs::FsSource;
pub use http::HttpSource;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::core::GrowError;

/// Future returned by [`ContentSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, GrowError>> + Send + 'a>>;

/// Narrow interface to the transport that yields raw content for a path.
///
/// Implementations must be cheap to share between tasks; the resolution
/// context holds one behind an `Arc`.
pub trait ContentSource: Send + Sync + fmt::Debug {
    /// Short backend name for logs ("fs", "http", ...).
    fn name(&self) -> &str;

    /// Fetch the raw text stored at `path`.
    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a>;
}
