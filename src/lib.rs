//! Grow - render YAML-described documents into pages through routed templates
//!
//! A pod is a directory (or HTTP location) of YAML documents, view templates
//! and static assets. Documents reference each other with tagged scalars:
//!
//! ```yaml
//! $view: /views/post.html
//! $title: Hello
//! author: !g.doc /content/authors/ada.yaml
//! image: !g.static /static/img/hello.png
//! ```
//!
//! Rendering a request path runs one pipeline:
//!
//! 1. [`routes`] resolves the routes manifest and matches the path to a document
//! 2. [`document`] resolves that document and every document reachable from it,
//!    fetching each source at most once per [`ResolutionContext`](document::ResolutionContext)
//! 3. [`templating`] renders the resolved document through its view
//!
//! # Core Modules
//!
//! - [`document`] - Documents, references, the value tree and deep resolution
//! - [`routes`] - Routes manifest and the pattern trie
//! - [`templating`] - Tera views, filters and template errors
//! - [`pod`] - The render pipeline tying the above together
//!
//! # Supporting Modules
//!
//! - [`source`] - Content sources (filesystem and HTTP)
//! - [`cache`] - Keyed concurrent caches backing the resolution context
//! - [`config`] - `grow.toml` pod configuration
//! - [`core`] - Error taxonomy and user-facing diagnostics
//! - [`cli`] - The `grow` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use grow_cli::config::PodConfig;
//! use grow_cli::pod::Pod;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PodConfig::load("site/grow.toml".as_ref()).await?;
//! let pod = Pod::new(config);
//! let page = pod.render("/blog/hello").await?;
//! println!("{}", page.html);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod document;
pub mod pod;
pub mod routes;
pub mod source;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
