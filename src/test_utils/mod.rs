//! Test utilities for Grow
//!
//! This module provides helpers shared by unit and integration tests:
//! - [`MemorySource`], an in-memory content source that counts fetches
//! - [`PodFixture`], a pod laid out in a temporary directory
//! - [`init_test_logging`], one-time tracing setup for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use grow_cli::document::ResolutionContext;
//! use grow_cli::test_utils::MemorySource;
//!
//! # async fn example() {
//! let source = Arc::new(MemorySource::new().with_file("/a.yaml", "title: A\n"));
//! let ctx = ResolutionContext::new(source.clone());
//! ctx.resolve("/a.yaml").await.unwrap();
//! assert_eq!(source.fetch_count("/a.yaml"), 1);
//! # }
//! ```

pub mod fixtures;
pub mod source;

pub use fixtures::PodFixture;
pub use source::MemorySource;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honored, and without it logging stays off.
///
/// ```bash
/// RUST_LOG=grow_cli=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
